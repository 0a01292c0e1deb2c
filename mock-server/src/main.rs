use tokio::net::TcpListener;

/// Serves the echo routes on `127.0.0.1:$PORT` (default 3000) for manual
/// testing of the `hc` binary.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let addr = listener.local_addr()?;
    println!("mock server on http://{addr} (/echo, /status/{{code}}, /bytes/{{len}}, /json)");
    mock_server::run(listener).await
}
