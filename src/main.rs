use kidstory::{
    logger::{self, LoggerConfig},
    server, Config, StoryService,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return Err(e.into());
        }
    };

    logger::init_with_config(LoggerConfig::from_config(&config))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.host,
        config.port,
    );
    logger::log_config_info(&config);

    let service = match StoryService::from_config(config.clone()) {
        Ok(service) => service,
        Err(e) => {
            log::error!("❌ Failed to initialize API client: {}", e);
            return Err(e.into());
        }
    };

    server::run(service, &config).await?;
    Ok(())
}
