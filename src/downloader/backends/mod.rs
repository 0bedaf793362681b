// yt-dlp backends

mod invocation;
pub mod cli;
pub mod python;

pub use cli::CliBackend;
pub use invocation::YtDlpInvocation;
pub use python::PythonBackend;
