use diagnostic_service::{config::Settings, database::MongoDB, startup};
use dotenv::dotenv;
use std::net::TcpListener;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    log::info!("🚀 Starting Diagnostic Service...");
    log::info!("📊 Database: {}", settings.database_name);

    let db = MongoDB::new(&settings.database_url, &settings.database_name)
        .await
        .map_err(|e| {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
    log::info!("✅ MongoDB connected successfully");

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address)?;

    log::info!("🌐 Server starting on {}", address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", address);

    startup::run(listener, db, settings)?.await
}
