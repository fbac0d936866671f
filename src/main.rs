//! simple-fansd entry point: CLI, logging, startup checks, control loop.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use simple_fansd::app::cli::Args;
use simple_fansd::app::logging::{init_tracing, resolve_filter};
use simple_fansd::config::persistence::load_config;
use simple_fansd::control::clock::TokioSleeper;
use simple_fansd::control::hysteresis::FanController;
use simple_fansd::error::StartupError;
use simple_fansd::hardware::{IpmiFanDriver, ThermalZoneSensor};
use simple_fansd::system::executor::{CommandRunner, IpmitoolRunner};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let env_level = std::env::var("LOG_LEVEL").ok();
    init_tracing(resolve_filter(args.log_level.as_deref(), env_level.as_deref()));

    if let Err(e) = run(args).await {
        let code = match e.downcast_ref::<StartupError>() {
            Some(startup) => startup.exit_code(),
            None => 1,
        };
        error!("{:#}", e);
        std::process::exit(code);
    }
}

fn ensure_root() -> Result<(), StartupError> {
    #[cfg(target_os = "linux")]
    if unsafe { libc::geteuid() } != 0 {
        return Err(StartupError::InsufficientPrivilege);
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref()).await?;

    if args.show_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    if args.dry_run {
        info!("Dry run: ipmitool commands will be logged, not executed");
    } else {
        ensure_root()?;
    }

    info!("simple-fansd v{} starting ({})", env!("CARGO_PKG_VERSION"), std::env::consts::OS);

    let runner: Arc<dyn CommandRunner> = Arc::new(
        IpmitoolRunner::new(config.ipmi.clone(), config.cmd_timeout()).with_dry_run(args.dry_run),
    );
    let driver = Arc::new(IpmiFanDriver::new(&config, runner));
    let sensor = Arc::new(ThermalZoneSensor::new(config.sensor_path.clone()));
    let mut controller = FanController::new(&config, sensor, driver, Arc::new(TokioSleeper));

    if args.once {
        let outcome = controller.tick().await?;
        info!("Single tick: {:?}", outcome);
        return Ok(());
    }

    tokio::select! {
        result = controller.run() => result?,
        _ = shutdown_signal() => info!("Shutdown signal received, exiting"),
    }

    Ok(())
}
