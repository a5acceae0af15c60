#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod run;

use clap::Parser;
use eyre::WrapErr;
use raster_config::Logging;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    let code = match real_main(cli) {
        Ok(code) => code,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> eyre::Result<i32> {
    // Config errors surface before logging is configured; they still reach stderr via humanize.
    let cfg = run::load_config(&cli.config, cli.settings.as_deref())
        .wrap_err_with(|| format!("loading {}", cli.config.display()))?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), plate = ?cfg.plate.kind, "config loaded");

    let result = dispatch(&cli, &cfg);
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    // Drain the non-blocking file writer before the process exits.
    if let Some(handle) = FILE_GUARD.get()
        && let Ok(mut guard) = handle.lock()
    {
        guard.take();
    }
    result
}

fn dispatch(cli: &Cli, cfg: &raster_config::Config) -> eyre::Result<i32> {
    let patterns = cli.patterns.as_deref();
    match &cli.cmd {
        Commands::Run {
            name,
            selection,
            pattern,
            print_runtime,
        } => run::run_cmd(
            cfg,
            name,
            selection,
            pattern.as_deref(),
            patterns,
            *print_runtime,
            cli.json,
        ),
        Commands::Preview { selection, pattern } => {
            run::preview_cmd(cfg, selection, pattern.as_deref(), patterns, cli.json).map(|()| 0)
        }
        Commands::Wells => run::wells_cmd(cfg, cli.json).map(|()| 0),
        Commands::SetOffset { target, x, y } => {
            run::set_offset_cmd(cfg, cli.settings.as_deref(), (*target).into(), *x, *y).map(|()| 0)
        }
        Commands::SelfCheck => run::self_check_cmd().map(|()| 0),
    }
}

/// Console layer (pretty or JSON) on stderr, plus an optional non-blocking file sink.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &Logging) -> eyre::Result<()> {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let (pretty, json_layer) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(fmt::layer().with_target(false).with_writer(std::io::stderr)),
            None,
        )
    };

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = std::path::Path::new(file);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let rotation = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::Rotation::DAILY,
                Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
                _ => tracing_appender::rolling::Rotation::NEVER,
            };
            let appender = tracing_appender::rolling::RollingFileAppender::builder()
                .rotation(rotation)
                .filename_prefix(name.to_string_lossy().into_owned())
                .build(dir)
                .wrap_err_with(|| format!("opening log file {file}"))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(std::sync::Mutex::new(Some(guard)));
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}
