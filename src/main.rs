use std::net::SocketAddr;

use attendance_feed::{server, FeedError, RecordStore};

#[tokio::main]
async fn main() -> Result<(), FeedError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("attendance_feed=debug,tower_http=debug")
            }),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(2334);
    let store_path =
        std::env::var("ATTENDANCE_FILE").unwrap_or_else(|_| "data/attendance.json".to_string());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, RecordStore::new(store_path)).await
}
