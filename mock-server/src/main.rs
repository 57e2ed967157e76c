use env_logger::{Builder, Env};
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    Builder::from_env(Env::default().default_filter_or("mock_server=info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let token = std::env::var("PINBOARD_TOKEN").unwrap_or_else(|_| "user:secret".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    mock_server::run(listener, &token).await
}
