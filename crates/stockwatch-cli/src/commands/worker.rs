//! Worker command implementation

use crate::cli::WorkerArgs;
use crate::output::OutputWriter;
use crate::output_types::SweepOutput;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use stockwatch_core::config::LayeredConfig;
use stockwatch_pipeline::{detector_from_config, HttpForwarder, IngestionWorker, WorkerConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;

pub async fn execute(args: WorkerArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let detector = detector_from_config(config)?;
    let detector_name = detector.name().to_string();

    let mut worker = IngestionWorker::new(WorkerConfig::from_config(config), detector);
    if let Some((url, token)) = config.remote_target() {
        let timeout = Duration::from_secs(config.upload_timeout_secs.value);
        let forwarder = HttpForwarder::new(&url, token, timeout)?;
        tracing::info!(endpoint = %forwarder.endpoint(), "Forwarding defects to remote dashboard");
        worker = worker.with_forwarder(Arc::new(forwarder));
    }

    if args.once {
        worker.prepare().context("Failed to prepare pipeline directories")?;
        let report = worker.sweep().await;

        if output.is_json() {
            return output.result(SweepOutput {
                detector: detector_name,
                defects: report.defects(),
                archived: report.archived(),
                failed: report.failed(),
                forwarded: report.forwarded,
                expired: report.expired,
                items: report.outcomes,
            });
        }

        output.success(format!(
            "Processed {} image(s): {} defect, {} archived, {} failed",
            report.outcomes.len(),
            report.defects(),
            report.archived(),
            report.failed()
        ));
        if report.forwarded > 0 {
            output.info(format!("Forwarded {} defect image(s)", report.forwarded));
        }
        if report.expired > 0 {
            output.info(format!("Removed {} expired archive file(s)", report.expired));
        }
        return Ok(());
    }

    let token = CancellationToken::new();
    tokio::spawn(shutdown_signal(token.clone()));

    if !output.is_json() {
        output.info(format!("Worker running with detector {} (Ctrl+C to stop)", detector_name));
    }
    worker.run(token).await?;
    Ok(())
}

/// Cancels `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, stopping worker"),
        _ = terminate => tracing::info!("Received terminate signal, stopping worker"),
    }

    token.cancel();
}
