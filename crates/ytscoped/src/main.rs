use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ys_api::{build_router, AppState};
use ys_collect::{CollectOptions, Collector};
use ys_config::{CollectorConfig, ConfigPaths};
use ys_youtube::YouTubeClient;
use ytscoped::{format_summary, preflight, write_report};

#[derive(Parser)]
#[command(
    name = "ytscoped",
    version = ytscoped::VERSION,
    about = "Classical music YouTube collector and analytics server"
)]
struct Cli {
    /// Base directory for config, checkpoint and exports (default ~/.ytscope)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and dashboard in the foreground
    Serve {
        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind to
        #[arg(long)]
        host: Option<IpAddr>,
    },
    /// Collect videos and channels in the foreground, then export CSVs
    Extract {
        /// Search phrase to run instead of the configured list (repeatable)
        #[arg(long = "query")]
        queries: Vec<String>,
        /// Maximum videos per search phrase
        #[arg(long)]
        videos_per_query: Option<u32>,
        /// Daily quota budget for this run
        #[arg(long)]
        daily_quota: Option<u32>,
    },
    /// Write a JSON analysis report for the newest exports
    Report,
    /// Verify config, API key and data directory
    Check,
    /// Query a running server's health endpoint
    Status,
    /// Print version
    Version,
}

fn load_config(base_dir: Option<PathBuf>) -> anyhow::Result<CollectorConfig> {
    let paths = match base_dir {
        Some(base) => ConfigPaths::with_base(base),
        None => ConfigPaths::new()?,
    };
    paths.ensure_config_dir()?;
    CollectorConfig::load_from(&paths)
}

/// Resolves on ctrl-c or, on unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ytscoped=info,ys_api=info,ys_collect=info,ys_youtube=info,tower_http=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            let mut config = load_config(cli.base_dir)?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            config.validate()?;

            let state = AppState::new(config.clone())?;
            let shutdown_state = state.clone();
            let app = build_router(state);

            let addr: SocketAddr = config.bind_addr().parse()?;
            println!("ytscope server running...");
            println!();
            println!("  Dashboard: http://{}", addr);
            println!("  Data:      {}", config.data_dir()?.display());
            println!();
            tracing::info!("Listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;

            let shutdown = async move {
                shutdown_signal().await;
                tracing::info!("Shutting down...");
                if shutdown_state.collector.status().is_running().await {
                    shutdown_state.collector.request_stop();
                }
            };

            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await?;

            Ok(())
        }

        Commands::Extract {
            queries,
            videos_per_query,
            daily_quota,
        } => {
            let mut config = load_config(cli.base_dir)?;
            let client = YouTubeClient::new(config.api_key.clone())?
                .with_base_url(config.api_base_url.clone())
                .with_min_interval(Duration::from_millis(config.min_request_interval_ms));

            let queries: Vec<String> = queries
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect();
            if !queries.is_empty() {
                config.search_phrases = queries;
            }
            if let Some(videos) = videos_per_query {
                config.videos_per_query = videos;
            }
            if let Some(quota) = daily_quota {
                config.daily_quota = quota;
            }
            config.validate()?;

            let collector = Arc::new(Collector::from_config(&config, Arc::new(client))?);
            let options = CollectOptions::from_config(&config);

            let stopper = collector.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                println!("Stopping after the current request...");
                stopper.request_stop();
            });

            let summary = collector.run(options).await?;
            print!("{}", format_summary(&summary));
            Ok(())
        }

        Commands::Report => {
            let config = load_config(cli.base_dir)?;
            let path = write_report(&config.data_dir()?)?;
            println!("Wrote: {}", path.display());
            Ok(())
        }

        Commands::Check => {
            let config = load_config(cli.base_dir)?;
            let checks = preflight(&config);
            for check in &checks {
                let mark = if check.ok { "ok" } else { "FAIL" };
                println!("  [{:>4}] {}: {}", mark, check.name, check.detail);
            }
            if checks.iter().any(|c| !c.ok) {
                anyhow::bail!("pre-flight checks failed");
            }
            Ok(())
        }

        Commands::Status => {
            let config = load_config(cli.base_dir)?;
            let host = if config.host.is_unspecified() {
                "127.0.0.1".to_string()
            } else {
                config.host.to_string()
            };
            match reqwest::get(format!("http://{}:{}/health", host, config.port)).await {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("Server is running");
                    println!("Version: {}", body["version"].as_str().unwrap_or("unknown"));
                    if let Ok(resp) =
                        reqwest::get(format!("http://{}:{}/api/status", host, config.port)).await
                    {
                        let status: serde_json::Value = resp.json().await?;
                        println!(
                            "Extraction: {}",
                            if status["is_running"].as_bool().unwrap_or(false) {
                                "running"
                            } else {
                                "idle"
                            }
                        );
                        println!(
                            "Quota: {}/{}",
                            status["quota_used"].as_u64().unwrap_or(0),
                            status["quota_limit"].as_u64().unwrap_or(0)
                        );
                    }
                }
                Err(_) => {
                    println!("Server is not running (could not reach health endpoint)");
                }
            }
            Ok(())
        }

        Commands::Version => {
            println!("ytscoped {}", ytscoped::VERSION);
            Ok(())
        }
    }
}
