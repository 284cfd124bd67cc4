use tracing_subscriber::EnvFilter;

fn init_logging() {
    // RUST_LOG wins; otherwise debug builds are chatty
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Also installs the bridge for `log` records emitted by the library
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file if present (for development convenience)
    // Silently ignore if not found - production uses system env vars
    let _ = dotenvy::dotenv();
    init_logging();

    app_lib::run().await;
}
