use clap::Parser;
use swarm_sd::utils::error::ErrorCategory;
use swarm_sd::utils::logger;
use swarm_sd::{AtomicFileStore, CliArgs, DockerClient, RefreshLoop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 驗證配置
    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(e) => {
            logger::init_logger(args.log_format.unwrap_or_default(), args.debug);
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(settings.log_format, settings.debug);

    tracing::info!("Starting swarm-sd");
    tracing::debug!("Settings: {:?}", settings);

    let client = DockerClient::new(
        &settings.docker_host,
        settings.api_version.as_deref(),
        settings.request_timeout,
    )?;
    let store = AtomicFileStore::new(settings.output_path.clone());
    let mut refresh = RefreshLoop::new(client, store, settings.rules.clone())
        .with_interval(settings.interval)
        .with_require_orchestrator(settings.require_orchestrator);

    if args.once {
        match refresh.run_once().await {
            Ok(report) => {
                tracing::info!(
                    "✅ Wrote {} targets to {} ({:?})",
                    report.targets,
                    settings.output_path.display(),
                    report.outcome
                );
            }
            Err(e) => {
                tracing::error!("❌ Refresh failed: {} (Category: {:?})", e, e.category());
                // 根據錯誤類別決定退出碼
                let exit_code = match e.category() {
                    ErrorCategory::Orchestrator => 2,
                    ErrorCategory::Filesystem => 3,
                    ErrorCategory::Configuration => 1,
                };
                std::process::exit(exit_code);
            }
        }
        return Ok(());
    }

    if let Err(e) = refresh.run(shutdown_signal()).await {
        tracing::error!("❌ {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, stopping after the current refresh"),
        _ = terminate => tracing::info!("Received SIGTERM, stopping after the current refresh"),
    }
}
