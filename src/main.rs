use candidate_dashboard::{DashboardConfig, app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Every setting has a default, so an empty environment still starts.
    let config = DashboardConfig::from_env();
    log::debug!("loaded configuration: {config:?}");

    app::run(config).await?;

    Ok(())
}
