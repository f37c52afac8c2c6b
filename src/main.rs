use log::info;
use smart_librarian::{app, config, error::Result, telemetry};

#[actix_web::main]
async fn main() -> Result<()> {
    // Default to info level if RUST_LOG is not set
    telemetry::init_tracing("smart_librarian=info,actix_web=info");

    info!("Loading configuration...");
    let config = config::Config::load()?;

    // Create and run application
    let application = app::Application::new(&config);
    application.run().await
}
