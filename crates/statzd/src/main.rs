//! statzd — the statz bridge daemon.
//!
//! Single binary that assembles the bridge:
//! - HTTP debug page (`GET /statz`), always 200, errors in-band
//! - Descriptor registry (create-once, rebuilt from "already exists"
//!   after a restart; nothing is persisted locally)
//! - Scheduled export cycles to the metrics backend
//!
//! # Usage
//!
//! ```text
//! statzd --source-address 127.0.0.1:8080 --backend-address 127.0.0.1:9090 --http-port 8000
//! statzd --print    # fetch once, print the snapshot JSON, export once, exit
//! ```
//!
//! The only fatal runtime error is failing to bind the debug listener;
//! everything else degrades and self-heals on the next cycle or request.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{info, warn};

use statz_client::{HttpMetricsBackend, HttpSnapshotSource, MetricsBackend, SnapshotSource};
use statz_core::{BridgeError, DistributionReduction};
use statz_debug::DebugState;
use statz_export::{CycleOutcome, ExportConfig, ExportScheduler, SeriesExporter};
use statz_registry::DescriptorRegistry;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReductionArg {
    /// Export a distribution's sample count (INT64).
    Count,
    /// Export a distribution's value sum (DOUBLE).
    Sum,
}

impl From<ReductionArg> for DistributionReduction {
    fn from(arg: ReductionArg) -> Self {
        match arg {
            ReductionArg::Count => DistributionReduction::Count,
            ReductionArg::Sum => DistributionReduction::Sum,
        }
    }
}

#[derive(Parser)]
#[command(name = "statzd", about = "statz bridge daemon")]
struct Cli {
    /// host:port of the telemetry snapshot source.
    #[arg(long, default_value = "127.0.0.1:8080")]
    source_address: String,

    /// host:port of the metrics backend.
    #[arg(long, default_value = "127.0.0.1:9090")]
    backend_address: String,

    /// Port for the debug HTTP server.
    #[arg(long, default_value = "8000")]
    http_port: u16,

    /// Export cycle period in seconds.
    #[arg(long, default_value = "60")]
    period_secs: u64,

    /// Deadline for each outbound collaborator call, in milliseconds.
    #[arg(long, default_value = "5000")]
    call_timeout_ms: u64,

    /// How distribution aggregations are reduced to a scalar point.
    #[arg(long, value_enum, default_value_t = ReductionArg::Count)]
    reduction: ReductionArg,

    /// Identity prefix for registered descriptors.
    #[arg(long, default_value = "custom.statz.io/")]
    descriptor_prefix: String,

    /// Fetch one snapshot, print it as JSON, run one export cycle, exit.
    #[arg(long)]
    print: bool,
}

/// Everything the debug handler and the scheduler share, built once at
/// startup. No global mutable state.
struct BridgeContext {
    source: Arc<dyn SnapshotSource>,
    backend: Arc<dyn MetricsBackend>,
    registry: Arc<DescriptorRegistry>,
}

impl BridgeContext {
    fn from_cli(cli: &Cli) -> Self {
        let timeout = Duration::from_millis(cli.call_timeout_ms);
        let source: Arc<dyn SnapshotSource> =
            Arc::new(HttpSnapshotSource::new(cli.source_address.clone(), timeout));
        let backend: Arc<dyn MetricsBackend> =
            Arc::new(HttpMetricsBackend::new(cli.backend_address.clone(), timeout));
        let registry = Arc::new(DescriptorRegistry::new(
            backend.clone(),
            cli.reduction.into(),
            cli.descriptor_prefix.clone(),
        ));
        Self {
            source,
            backend,
            registry,
        }
    }

    fn scheduler(&self, period: Duration) -> ExportScheduler {
        let exporter = SeriesExporter::new(self.backend.clone(), ExportConfig::default());
        ExportScheduler::new(self.source.clone(), self.registry.clone(), exporter, period)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,statzd=debug,statz=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let ctx = BridgeContext::from_cli(&cli);

    if cli.print {
        return run_once(&cli, ctx).await;
    }
    run_serve(&cli, ctx).await
}

/// One-shot mode: print the snapshot, export once, exit.
async fn run_once(cli: &Cli, ctx: BridgeContext) -> anyhow::Result<()> {
    info!(source = %cli.source_address, "one-shot mode");

    match ctx.source.get_snapshot().await {
        Ok(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        Err(e) => warn!(error = %e, "snapshot fetch failed"),
    }

    let mut scheduler = ctx.scheduler(Duration::from_secs(cli.period_secs));
    if scheduler.run_cycle().await == CycleOutcome::SourceUnavailable {
        warn!("export skipped: source unavailable");
    }
    Ok(())
}

/// Serving mode: debug page + periodic export until ctrl-c.
async fn run_serve(cli: &Cli, ctx: BridgeContext) -> anyhow::Result<()> {
    info!(
        source = %cli.source_address,
        backend = %cli.backend_address,
        period_secs = cli.period_secs,
        "statz bridge starting"
    );

    // Bind first: this is the only fatal error.
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| BridgeError::ListenBind {
            addr: addr.to_string(),
            source: e,
        })?;
    info!(%addr, "debug page listening on /statz");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = ctx.scheduler(Duration::from_secs(cli.period_secs));
    let export_handle = tokio::spawn(scheduler.run(shutdown_rx));

    let router = statz_debug::debug_router(DebugState { source: ctx.source });
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;
    let _ = export_handle.await;

    info!("statz bridge stopped");
    Ok(())
}
