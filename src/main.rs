use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, bail};
use log::{debug, info};

use ytcap::page::{HtmlPage, PageContext};

mod cli;

use cli::{Cli, OutputFormat};

/// First argument a browser passes when it launches a native messaging host
const EXTENSION_ORIGIN_PREFIX: &str = "chrome-extension://";

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytcap.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytcap")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nConfig is read from: {}\nLogs are written to: {}",
        ytcap::config::config_path().display(),
        log_dir().join("ytcap.log").display()
    )
}

/// Retry an async operation with exponential backoff
async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| eyre::eyre!("no attempts made")))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = ytcap::config::Config::load().unwrap_or_default();
    let settings = config.settings();

    let client = ytcap::youtube::build_client()?;

    let launched_by_browser = cli
        .url
        .as_deref()
        .is_some_and(|u| u.starts_with(EXTENSION_ORIGIN_PREFIX));
    if cli.native_host || launched_by_browser {
        if let Some(ref origin) = cli.url {
            info!("Launched by {origin}");
        }
        return ytcap::messaging::serve(tokio::io::stdin(), tokio::io::stdout(), &client, &settings).await;
    }

    // CLI flags take priority over config
    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| <OutputFormat as clap::ValueEnum>::from_str(f, true).ok())
        })
        .unwrap_or(OutputFormat::Text);
    let backend_url = cli
        .backend
        .clone()
        .or_else(|| config.backend_url.clone())
        .unwrap_or_else(|| ytcap::backend::DEFAULT_BACKEND_URL.to_string());

    if cli.verbose {
        let config_path = ytcap::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        debug!("Settings: {settings:?}");
    }

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: ytcap <URL>\n       echo <URL> | ytcap");
    }

    for url_input in &urls {
        let url_input = url_input.trim().to_string();
        if url_input.is_empty() {
            continue;
        }

        let video_id = ytcap::extract_video_id(&url_input)
            .ok_or_else(|| eyre::eyre!("could not extract video ID from: {url_input}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID\n  https://www.youtube.com/live/ID\n  <11-character video ID>"))?;

        if cli.post {
            let post = ytcap::backend::fetch_post(&client, &backend_url, &video_id).await?;
            println!("{post}");
            continue;
        }

        let page = match cli.page {
            Some(ref path) => {
                let html = std::fs::read_to_string(path)?;
                HtmlPage::new(ytcap::youtube::watch_url(&video_id), html)
            }
            None => {
                retry(3, || {
                    let client = &client;
                    let url_input = &url_input;
                    async move { Ok(ytcap::youtube::load_page(client, url_input).await?) }
                })
                .await?
            }
        };

        let result = ytcap::transcript::get_best_transcript(&page, &client, &settings).await?;

        if cli.verbose {
            eprintln!("Video: {} ({})", result.video_id, page.url());
            for track in &result.tracks {
                let status = if result.combined.contains(&format!("--- Track: {} ", track.lang)) {
                    "ok"
                } else {
                    "failed"
                };
                eprintln!("  track {} [{}] {} {status}", track.lang, track.kind, track.name);
            }
        }

        let rendered = match format {
            OutputFormat::Text => ytcap::output::render_text(&result),
            OutputFormat::Json => ytcap::output::render_json(&result)?,
        };

        if let Some(ref path) = cli.output {
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }
    }

    Ok(())
}
