use std::process::ExitCode;
use std::sync::Arc;

use sprop_server::configs::Settings;
use sprop_server::run;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::new() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            eprintln!("Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level},tower_http={level}").into()
        }))
        .init();

    match run(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server stopped: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
