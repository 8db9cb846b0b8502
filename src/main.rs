use anyhow::Result;
use chess_rules::config::EngineConfig;
use chess_rules::console::ConsoleHandler;

fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with console responses.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_rules=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(
        square_size = config.square_size,
        "chess-rules v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let mut console = ConsoleHandler::new(config)?;
    console.run()
}
