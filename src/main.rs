use log::info;
use noraliva::api::{app_router, ApiState};
use noraliva::config::Config;
use noraliva::db::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let db = Db::connect(&config.database_url).await?;
    if config.seed_demo_data {
        db.seed_demo_data_if_empty().await?;
    }

    let app = app_router(ApiState { db });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
