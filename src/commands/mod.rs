//! Subcommand handlers.
//!
//! Each handler prints the product's stdout lines and returns a `Result`;
//! [`run`] turns that into the final banner and the process success flag.

pub mod extract;
pub mod info;
pub mod stream;
pub mod tools;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands};
use crate::config::ExtractorConfig;
use crate::downloader::{Downloader, RunLimits, ToolSet};

/// Everything a handler needs for one invocation
pub struct CommandContext {
    pub config: ExtractorConfig,
    pub tools: ToolSet,
    pub downloader: Downloader,
    /// One deadline for the whole command
    pub limits: RunLimits,
    /// Cancels `limits` on Ctrl+C
    ctrl_c: JoinHandle<()>,
}

impl CommandContext {
    pub fn new(config: ExtractorConfig) -> Self {
        let tools = ToolSet::resolve(&config);
        Self::with_tools(config, tools)
    }

    /// Must be called inside the runtime: it starts the Ctrl+C listener.
    pub fn with_tools(config: ExtractorConfig, tools: ToolSet) -> Self {
        let downloader = Downloader::from_config(&config, &tools);
        let limits = RunLimits::new(config.timeout, CancellationToken::new());
        let ctrl_c = limits.cancel_on_ctrl_c();
        Self {
            config,
            tools,
            downloader,
            limits,
            ctrl_c,
        }
    }
}

impl Drop for CommandContext {
    fn drop(&mut self) {
        self.ctrl_c.abort();
    }
}

/// Dispatch the parsed command line; `true` means success.
pub async fn run(cli: &Cli) -> bool {
    let ctx = CommandContext::new(cli.to_config());
    tracing::debug!(
        backends = ?ctx.downloader.backend_names(),
        timeout = ?ctx.config.timeout,
        "starting command"
    );

    match &cli.command {
        Commands::Extract {
            video_url,
            output_path,
            ..
        } => extract::execute(&ctx, video_url, output_path).await,
        Commands::Stream {
            video_url,
            output_path,
            transcode,
            ..
        } => stream::execute(&ctx, video_url, output_path, *transcode).await,
        Commands::Info { video_url, .. } => info::execute(&ctx, video_url).await,
        Commands::Tools { json } => tools::execute(&ctx, *json).await,
    }
}
