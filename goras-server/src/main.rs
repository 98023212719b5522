use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goras_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let http = goras_server::build()?;

    let host = http.app.get("http.host").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = http.app.get("http.port").unwrap_or_else(|| "3030".to_string());
    let addr = format!("{host}:{port}");

    tracing::info!(%addr, "goras listening");
    http.listen(addr).await
}
