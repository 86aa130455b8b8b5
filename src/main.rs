use std::{net::SocketAddr, sync::Arc};

use admin_log::{
    admin_log::{AdminLogger, TracingSink},
    config::AppConfig,
    create_app, AppState,
};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Counters bind to the recorder on first use, so install it first
    init_metrics(&config)?;

    let admin_log = AdminLogger::new(config.admin_log.clone(), Arc::new(TracingSink));
    info!(
        enabled = config.admin_log.enabled,
        argument_errors = ?config.admin_log.argument_errors,
        "Admin request logging configured"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_app(AppState::new(config, admin_log));

    let listener = TcpListener::bind(&addr).await?;
    info!("Admin log service listening on {}", addr);

    // Client addresses reach the logger through ConnectInfo
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

// JSON lines unless LOG_FORMAT=pretty; RUST_LOG wins over the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,admin_log=info"));
    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "pretty");

    let registry = tracing_subscriber::registry().with(filter);
    if pretty {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry
            .with(fmt::layer().json().with_current_span(false).with_target(true))
            .init();
    }
}

fn init_metrics(config: &AppConfig) -> Result<()> {
    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.metrics.port))
            .install()?;

        info!("Metrics exporter initialized on port {}", config.metrics.port);
    }

    Ok(())
}
