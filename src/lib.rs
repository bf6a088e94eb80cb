mod client;
mod config;
mod diff;
mod error;
mod logger;
mod protocol;
mod runner;
mod types;

pub use client::{SamsungAcClient, SamsungAcClientBuilder};
pub use config::Config;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use protocol::{DEFAULT_NAME, DEFAULT_SMARTTHINGS_PATH, parse_status};
pub use runner::{CliOutput, CliRunner, CommandRunner};
pub use types::*;
