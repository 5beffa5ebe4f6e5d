use audit_query_processor::{config::AppConfig, http_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    http_server::run_server(config).await
}
