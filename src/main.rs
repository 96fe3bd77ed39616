// engg.pk Engagement Server

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engg_engagement::{app_state::AppState, config::Config, routes::create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let address = config.server_address();

    let app_state = AppState::new(config).await?;

    let app = create_router(app_state).layer(CorsLayer::permissive());

    info!("Engagement server starting on http://{}", address);
    info!("  GET    /api/v1/feed?search=&type=&page=");
    info!("  POST   /api/v1/posts/{{id}}/like");
    info!("  POST   /api/v1/follows/{{target_type}}/{{target_id}}");
    info!("  POST   /api/v1/companies/{{id}}/reviews");
    info!("  GET    /api/v1/forum/posts?search=&category=&page=");
    info!("  POST   /api/v1/review-subjects/{{id}}/reviews");

    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
