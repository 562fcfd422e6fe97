//! # Motion Recorder CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 模拟流录制管道编排
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use contracts::ObservabilitySettings;
use observability::ObservabilityConfig;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // `run` initializes logging itself once the config file is loaded
    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(&cli, args).await,
        Commands::Validate(args) => {
            init_logging(&cli, None, None)?;
            run_validate(args)
        }
        Commands::Info(args) => {
            init_logging(&cli, None, None)?;
            run_info(args)
        }
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging from the file settings, then apply CLI options
pub(crate) fn init_logging(
    cli: &Cli,
    settings: Option<&ObservabilitySettings>,
    metrics_port: Option<u16>,
) -> Result<()> {
    let mut config = match settings {
        Some(settings) => ObservabilityConfig::from_settings(settings)?,
        None => ObservabilityConfig::default(),
    };

    if let Some(format) = cli.log_format {
        config.log_format = format.into();
    }
    if cli.quiet {
        config.default_log_level = "warn".to_string();
    } else if cli.verbose > 0 {
        let level = if cli.verbose == 1 { "debug" } else { "trace" };
        config.default_log_level = level.to_string();
    }
    if metrics_port.is_some() {
        config.metrics_port = metrics_port;
    }

    observability::init_with_config(config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Motion Recorder CLI starting"
    );
    Ok(())
}
