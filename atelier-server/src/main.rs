use std::env;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use atelier_core::{Data, Sessions};
use atelier_database::{MIGRATOR, Storage};
use atelier_llm::GeminiClient;
use atelier_server::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !metadata.target().starts_with("hyper")
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let db = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;
            info!("PostgreSQL connection established.");

            if env_bool("AUTO_RUN_MIGRATIONS", true) {
                MIGRATOR.run(&pool).await?;
                info!("Database migrations applied.");
            } else {
                info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
            }

            Storage::postgres(pool)
        }
        Err(_) => {
            warn!("DATABASE_URL is not set; using the in-memory store. History is lost on restart.");
            Storage::memory()
        }
    };

    let llm = GeminiClient::from_env()?;
    info!(model = llm.model(), "Gemini client configured.");

    let data = Data {
        db,
        llm: Arc::new(llm),
        sessions: Sessions::new(),
    };

    let app = routes::router().with_state(data);

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Atelier is listening.");

    axum::serve(listener, app).await?;
    Ok(())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
