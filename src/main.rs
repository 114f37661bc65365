mod db;
mod hub;
mod location;
mod message;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::services::profile::PgProfileStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let profiles = Arc::new(PgProfileStore::new(pool.clone()));
    let state = state::AppState::new(pool, profiles);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "haksamate listening");
    axum::serve(listener, app).await.expect("server failed");
}
