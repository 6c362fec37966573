use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytcap",
    about = "YouTube caption extractor and native messaging host",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Read the watch page from a saved HTML file instead of fetching it
    #[arg(short, long)]
    pub page: Option<PathBuf>,

    /// Ask the backend for a generated post instead of printing captions
    #[arg(long)]
    pub post: bool,

    /// Backend base URL (overrides config)
    #[arg(long)]
    pub backend: Option<String>,

    /// Serve browser native messaging requests on stdin/stdout
    #[arg(long)]
    pub native_host: bool,

    /// Passed by the browser on Windows when launching a native host
    #[arg(long, hide = true)]
    pub parent_window: Option<String>,

    /// Show track and section details
    #[arg(short, long)]
    pub verbose: bool,
}
