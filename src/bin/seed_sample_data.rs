// Seed the configured database with sample engagement data

use tracing_subscriber::EnvFilter;

use engg_engagement::{app_state::AppState, config::Config, data_seeder::seed_sample_data};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    println!("Seeding sample data into {}", config.database.url);

    let state = AppState::new(config).await?;
    let summary = seed_sample_data(&state).await?;

    println!(
        "Created {} users, {} organizations, {} posts, {} reviews",
        summary.users, summary.organizations, summary.posts, summary.reviews
    );
    Ok(())
}
