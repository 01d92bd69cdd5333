use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ips_core::{
    ConversionService, CoreConfig,
    constants::{DATE_POLICY_ENV, PRETTY_JSON_ENV},
    date_policy_from_env_value, pretty_from_env_value,
};

/// Main entry point for the IPS converter service
///
/// Resolves configuration once from the environment (after loading `.env`) and serves the REST
/// API built by [`api_rest::router`].
///
/// # Environment Variables
/// - `IPS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `IPS_DATE_POLICY`: HL7 date handling, `uniform` or `legacy` (default: "uniform")
/// - `IPS_PRETTY_JSON`: pretty-print JSON responses (default: true)
/// - `RUST_LOG`: tracing filter, combined with [`LOG_DIRECTIVES`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - an environment value is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
/// Default per-crate log levels for the server process.
const LOG_DIRECTIVES: &[&str] = &[
    "ips_run=info",
    "ips_core=info",
    "api_rest=info",
    "hl7=info",
    "fhir=info",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::new(
        date_policy_from_env_value(std::env::var(DATE_POLICY_ENV).ok())?,
        pretty_from_env_value(std::env::var(PRETTY_JSON_ENV).ok())?,
    ));
    let rest_addr = std::env::var("IPS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!(
        date_policy = %cfg.date_policy(),
        pretty = cfg.pretty(),
        "++ Starting IPS REST on {}",
        rest_addr
    );

    let app = api_rest::router(ConversionService::new(cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- IPS REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

fn log_filter() -> anyhow::Result<EnvFilter> {
    LOG_DIRECTIVES
        .iter()
        .try_fold(EnvFilter::from_default_env(), |filter, directive| -> anyhow::Result<_> {
            Ok(filter.add_directive(directive.parse()?))
        })
}
