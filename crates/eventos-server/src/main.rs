use eventos_server::config::AppConfig;

#[tokio::main]
async fn main() {
    // Optional .env for local development, loaded before anything reads the
    // environment.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    let config_path = std::env::var("EVENTOS_CONFIG").unwrap_or_else(|_| "eventos.toml".into());

    let config = match AppConfig::load(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        std::process::exit(2);
    }

    eventos_server::observability::init_tracing(&config.logging.level);
    tracing::info!(path = %config_path, "configuration loaded");

    if let Err(e) = eventos_server::server::run(config).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
