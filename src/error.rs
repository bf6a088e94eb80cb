use std::fmt;

#[derive(Debug)]
pub enum Error {
    Spawn(std::io::Error),
    CommandFailed { code: Option<i32>, stderr: String },
    Timeout,
    Json(serde_json::Error),
    MissingField(String),
    InvalidField { path: String, expected: &'static str },
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spawn(e) => write!(f, "failed to start smartthings CLI: {e}"),
            Error::CommandFailed { code: Some(code), stderr } => {
                write!(f, "smartthings CLI exited with status {code}: {stderr}")
            }
            Error::CommandFailed { code: None, stderr } => {
                write!(f, "smartthings CLI terminated by signal: {stderr}")
            }
            Error::Timeout => write!(f, "smartthings CLI timed out"),
            Error::Json(e) => write!(f, "invalid JSON from CLI: {e}"),
            Error::MissingField(path) => write!(f, "missing field: {path}"),
            Error::InvalidField { path, expected } => {
                write!(f, "invalid field {path}: expected {expected}")
            }
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Spawn(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
