use scanform_web::config::{self, AppConfig};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    config::load_dotenv();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("scanform-web: {err}");
            return ExitCode::FAILURE;
        }
    };

    let app = match scanform_web::build_app(&config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("scanform-web: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        environment = %config.environment,
        port = config.port,
        "Starting scanform-web"
    );
    if let Err(err) = app.run(&config.bind_addr()).await {
        error!(%err, "Server exited with an error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
