mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use fwforge::config::{resolve_config, validate_config, ConfigOrigin};
use fwforge::system::preflight::check_required_tools;
use fwforge::{BuildConfig, LogCollector, Pipeline, SystemRunner, WorkspacePaths};

/// Exit status after Ctrl+C, as a shell reports SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration errors are reported before logging exists
    let (config, origin, paths) = match load_run_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let collector = match LogCollector::new(&paths.log_dir, cli.log_level(), true) {
        Ok(collector) => collector,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = collector.clone().install() {
        eprintln!("[Main] WARNING: {}", e);
    }
    log::info!("fwforge {} logging to {}", fwforge::VERSION, collector.log_path().display());
    log::info!("[Config] Configuration from {}", origin);

    if let Err(e) = install_interrupt_handler(collector.clone()) {
        log::warn!("[Main] {:#}", e);
    }

    let code = match run(&cli, &config, paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Build failed: {:#}", e);
            ExitCode::FAILURE
        }
    };

    let _ = collector.flush_blocking();
    code
}

/// Resolve, override and validate the configuration, then derive paths.
fn load_run_config(cli: &Cli) -> Result<(BuildConfig, ConfigOrigin, WorkspacePaths)> {
    let (mut config, origin) =
        resolve_config(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_overrides(&mut config);
    validate_config(&config).context("validating configuration")?;

    let root = match &cli.workdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("reading current directory")?,
    };
    let root = absolute(root)?;

    let paths = WorkspacePaths::resolve(&root, &config);
    paths
        .ensure_safe_layout()
        .context("checking workspace layout")?;
    Ok((config, origin, paths))
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()
            .context("reading current directory")?
            .join(path))
    }
}

fn install_interrupt_handler(collector: LogCollector) -> Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\n[fwforge] Interrupted by user, aborting build");
        log::error!("Interrupted by user, aborting build");
        let _ = collector.flush_blocking();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .context("installing Ctrl+C handler")
}

fn run(cli: &Cli, config: &BuildConfig, paths: WorkspacePaths) -> Result<()> {
    if cli.skip_preflight {
        log::warn!("[Preflight] Skipped by request");
    } else {
        check_required_tools(config)?;
    }

    let runner = SystemRunner;
    let mut pipeline = Pipeline::new(config, paths, &runner);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    let report = pipeline.run(&mut input, &mut output)?;

    log::info!("Release info: {}", report.release_info_path.display());
    Ok(())
}
