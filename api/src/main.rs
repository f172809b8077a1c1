use guarantor::kvstore::Mode;
use guarantor_api::serve;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    guarantor::logging::init();

    let mut config = guarantor::Config::default();
    config.apply_env_overrides();

    let dal = Arc::new(guarantor::open_dal(&config, Mode::ReadWrite)?);
    let addr: std::net::SocketAddr = std::env::var("GUARANTOR_API_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:7878".to_owned())
        .parse()?;

    tracing::info!(%addr, store_dir = %config.store_dir.display(), "starting guarantor-api");
    serve(dal, addr).await;
    Ok(())
}
