pub mod cli;
pub mod commands;
pub mod config;
pub mod downloader;
pub mod logging;

pub use cli::{Cli, Commands};
pub use config::{BackendMode, ExtractorConfig};
pub use downloader::DownloadError;
