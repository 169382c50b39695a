use clap::Parser;
use env_logger::Env;
use failure::Error;
use log::{error, info, warn};
use plate_reader::config::{parse_base_url, parse_timeout};
use plate_reader::{photo, Config, UploadClient, UploadError, UploadResponse};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Reads the license plate in a photo using a recognition service.
#[derive(Parser, Debug)]
#[command(name = "plate-reader", version)]
struct Args {
    /// Photo of a vehicle license plate
    image: PathBuf,

    /// Directory to write the returned images into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Base URL of the recognition service [env: PLATE_SERVICE_URL]
    #[arg(long)]
    url: Option<String>,

    /// Seconds to wait for the service [env: UPLOAD_TIMEOUT_SECS]
    #[arg(long)]
    timeout: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            1
        }
    };
    process::exit(code);
}

async fn run(args: Args) -> Result<i32, Error> {
    let mut config = Config::from_env()?;
    if let Some(url) = &args.url {
        config.base_url = parse_base_url(url)?;
    }
    if let Some(timeout) = &args.timeout {
        config.timeout = parse_timeout(timeout)?;
    }
    let client = UploadClient::new(&config)?;

    let image = match photo::load_for_upload(&args.image) {
        Ok(image) => image,
        Err(e) => return Ok(report(&e)),
    };

    let mut pending = client.spawn(image);
    let finished = tokio::select! {
        result = &mut pending => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            pending.cancel();
            pending.await
        }
    };

    match result {
        Ok(response) => {
            render(&response, &args.out)?;
            Ok(0)
        }
        Err(e) => Ok(report(&e)),
    }
}

fn render(response: &UploadResponse, out: &Path) -> Result<(), Error> {
    fs::create_dir_all(out).map_err(|e| io_context(out, e))?;
    let images = [
        ("prediction", response.prediction_image_bytes()),
        ("license_plate", response.license_plate_image_bytes()),
    ];
    for (name, decoded) in images {
        match decoded {
            Ok(Some(data)) => {
                if let Some(path) = photo::save_result(&data, out, name)? {
                    println!("Saved {}", path.display());
                }
            }
            Ok(None) => {}
            // Result images are optional; a bad one should not hide the text.
            Err(e) => warn!("Ignoring {} image, not valid base64: {}", name, e),
        }
    }

    let texts = response.joined_texts();
    if texts.is_empty() {
        println!("No license plate recognized");
    } else {
        println!("{}", texts);
    }
    Ok(())
}

fn report(e: &UploadError) -> i32 {
    match e.user_message() {
        Some(message) => {
            error!("Upload failed: {}", e);
            eprintln!("{}", message);
            1
        }
        None => {
            info!("Upload cancelled");
            130
        }
    }
}

fn io_context(path: &Path, e: std::io::Error) -> Error {
    failure::err_msg(format!("Creating {}: {}", path.display(), e))
}
