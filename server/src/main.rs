mod error;
mod routes;
mod services;
mod state;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let port: u16 = match std::env::var("PORT").unwrap_or_else(|_| "3000".into()).parse() {
        Ok(port) => port,
        Err(e) => {
            tracing::error!(error = %e, "invalid PORT");
            return ExitCode::FAILURE;
        }
    };
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into());

    let app = routes::app(state::AppState::new());
    let listener = match tokio::net::TcpListener::bind(format!("{bind_addr}:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %bind_addr, %port, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%bind_addr, %port, "pixelboard relay listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
