use failure::Error;
use std::env::{self, VarError};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5500";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const UPLOAD_PATH: &str = "api/upload";

/// Where the recognition service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: Url,
    pub timeout: Duration,
}

impl Config {
    pub fn new(base_url: Url) -> Self {
        Config {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `PLATE_SERVICE_URL` and `UPLOAD_TIMEOUT_SECS`. Unset variables
    /// fall back to the defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = match env_value("PLATE_SERVICE_URL", env::var("PLATE_SERVICE_URL"))? {
            Some(url) => parse_base_url(&url)?,
            None => parse_base_url(DEFAULT_BASE_URL)?,
        };
        let timeout = match env_value("UPLOAD_TIMEOUT_SECS", env::var("UPLOAD_TIMEOUT_SECS"))? {
            Some(secs) => parse_timeout(&secs)?,
            None => DEFAULT_TIMEOUT,
        };
        Ok(Config { base_url, timeout })
    }

    /// `{base_url}/api/upload`, keeping any path prefix on the base URL.
    pub fn upload_url(&self) -> Result<Url, Error> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(UPLOAD_PATH)?)
    }
}

/// Unset is `None`; set but not valid Unicode is an error.
fn env_value(name: &str, value: Result<String, VarError>) -> Result<Option<String>, Error> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(format_err!(
            "{} is not valid Unicode: {:?}",
            name,
            raw
        )),
    }
}

pub fn parse_base_url(s: &str) -> Result<Url, Error> {
    let url = Url::parse(s).map_err(|e| format_err!("Invalid service URL {:?}: {}", s, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format_err!(
            "Unsupported scheme {:?} in service URL {:?}",
            scheme,
            s
        )),
    }
}

pub fn parse_timeout(s: &str) -> Result<Duration, Error> {
    let secs: u64 = s
        .trim()
        .parse()
        .map_err(|e| format_err!("Invalid timeout {:?}: {}", s, e))?;
    if secs == 0 {
        return Err(format_err!("Timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}
