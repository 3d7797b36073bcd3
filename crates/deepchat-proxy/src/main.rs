//! deepchat-proxy - forwards chat requests to the model backend

use clap::Parser;
use deepchat_proxy::{ProxyConfig, ProxyState, build_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "deepchat-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind (overrides config and DEEPCHAT_PROXY_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config and DEEPCHAT_PROXY_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend origin (overrides config and BACKEND_URL)
    #[arg(short, long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,deepchat_proxy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ProxyConfig::load()?.with_overrides(args.host, args.port, args.backend_url);

    let app = build_router(ProxyState::new(&config.backend_url));

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        backend = %config.backend_url,
        "deepchat-proxy listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
