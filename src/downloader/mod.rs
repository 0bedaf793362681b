// Downloader module - backends, process control and output handling

pub mod backends;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod process;
pub mod progress;
pub mod stream_selector;
pub mod tools;
pub mod traits;
pub mod transcode;
pub mod utils;

pub use errors::DownloadError;
pub use models::{
    AudioStream, DownloadProgress, DownloadReport, DownloadRequest, DownloadTarget,
    ExtractionOutcome, VideoInfo, VideoMetadata,
};
pub use orchestrator::Downloader;
pub use output::OutputPlan;
pub use process::{RunLimits, ToolCommand};
pub use stream_selector::{StreamSelection, StreamSelector, StreamTier};
pub use tools::{ToolManager, ToolSet};
pub use traits::{MediaBackend, NoProgress, ProgressSink, StdoutProgress};
pub use transcode::Transcoder;
