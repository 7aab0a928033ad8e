use book_api::store::BookStore;
use book_api::{build_app, BoxError};
use openroute::AppConfig;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    openroute::init_tracing();

    // Runs without application.yaml too; env vars still overlay.
    let config = AppConfig::load("dev").unwrap_or_else(|_| AppConfig::empty());
    let addr: String = config.get_or("server.addr", "127.0.0.1:5000".to_string());

    let router = build_app(&config, BookStore::new())?.build()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Book API listening; documentation at /openapi/");
    openroute::http::serve(listener, router).await?;
    Ok(())
}
