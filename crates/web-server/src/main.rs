use std::path::Path;

// This main function is the entry point when running `cargo run -p web-server`.
// It loads `dashboard.toml`, sets up logging, and hands off to `run_server`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = configuration::load_config(Path::new("dashboard.toml"))?;
    let _guard = configuration::init_tracing(&config.logging)?;
    web_server::run_server(config).await
}
