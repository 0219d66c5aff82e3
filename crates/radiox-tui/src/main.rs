mod action;
mod app;
mod app_state;
mod component;
mod components;
mod player;
mod theme;
mod transport;
mod widgets;

use radiox_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load()?;
    let data_dir = config.paths.data_dir.clone();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("radiox.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("radiox log: {}", log_path.display());

    tracing::info!(
        "radiox starting… config={} data_dir={}",
        Config::config_path().display(),
        data_dir.display()
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(config)?;
    let result = app.run().await;
    if let Err(ref e) = result {
        tracing::error!("radiox exited with error: {:#}", e);
    }
    tracing::info!("radiox exiting");
    result
}
