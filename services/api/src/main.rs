use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use api::{
    AppState,
    jwt::{JwtConfig, JwtService},
    repositories::{PostRepository, UserRepository},
    routes,
    session::SessionStore,
    upload::{ImageHost, ImageHostConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting snapfeed api service");

    // Initialize database connection pool
    let db_config = common::database::DatabaseConfig::from_env()?;
    let pool = common::database::init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize the token service; the signing secret is injected here
    // and nowhere else
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    let image_host = ImageHost::new(ImageHostConfig::from_env()?);

    let user_repository = UserRepository::new(pool.clone());
    let post_repository = PostRepository::new(pool.clone());
    let session_store = SessionStore::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        user_repository,
        post_repository,
        session_store,
        image_host,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("snapfeed api service listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
