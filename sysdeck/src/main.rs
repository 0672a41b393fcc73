//! Entry point for the sysdeck TUI. Parses args, loads config and runs the App.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sysdeck::app::App;
use sysdeck::config::{config_dir, Config};
use sysdeck::providers::{BackendSettings, SystemBackend};
use sysdeck::report;
use sysdeck::views;

#[derive(Debug, Default)]
struct ParsedArgs {
    config: Option<PathBuf>,
    interval_ms: Option<u64>,
    log_file: Option<PathBuf>,
    background: bool,
    export_json: Option<PathBuf>,
    export_md: Option<PathBuf>,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--config FILE|-c FILE] [--interval MS|-i MS] [--log-file FILE|-l FILE] \
         [--background] [--export-json FILE] [--export-md FILE] [--dry-run]"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "sysdeck".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        // --flag=value is accepted for every flag that takes one
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline
                .clone()
                .or_else(|| it.next())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("{name} needs a value. {}", usage(&prog)))
        };
        match flag.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--config" | "-c" => out.config = Some(value("--config")?.into()),
            "--interval" | "-i" => {
                let v = value("--interval")?;
                let ms = v
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --interval '{v}'. {}", usage(&prog)))?;
                out.interval_ms = Some(ms);
            }
            "--log-file" | "-l" => out.log_file = Some(value("--log-file")?.into()),
            "--export-json" => out.export_json = Some(value("--export-json")?.into()),
            "--export-md" => out.export_md = Some(value("--export-md")?.into()),
            "--background" => out.background = true,
            "--dry-run" => out.dry_run = true,
            _ => return Err(format!("Unexpected argument '{arg}'. {}", usage(&prog))),
        }
    }
    Ok(out)
}

fn init_tracing() -> Result<()> {
    let dir = config_dir();
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join("sysdeck.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SYSDECK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            if msg.starts_with("Usage:") {
                println!("{msg}");
                return Ok(());
            }
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let mut cfg = Config::load(parsed.config.as_deref())?;
    if let Some(ms) = parsed.interval_ms {
        cfg.tick_ms = ms;
    }
    if let Some(path) = parsed.log_file {
        cfg.log_file = path;
    }
    cfg.background_sampling |= parsed.background;

    if parsed.dry_run {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        for view in views::all(&cfg) {
            for spec in view.fetches() {
                println!("{:?} -> {}", view.id(), spec.domain());
            }
        }
        return Ok(());
    }

    // The TUI owns the terminal, so logs go to a file. Failure to open it is
    // not fatal.
    if let Err(e) = init_tracing() {
        eprintln!("logging disabled: {e:#}");
    }

    let backend = Arc::new(SystemBackend::new(BackendSettings::from(&cfg)));

    if parsed.export_json.is_some() || parsed.export_md.is_some() {
        let r = report::collect(backend.as_ref(), cfg.fetch_timeout()).await;
        if let Some(path) = &parsed.export_json {
            report::write_json(path, &r)?;
            println!("wrote {}", path.display());
        }
        if let Some(path) = &parsed.export_md {
            report::write_markdown(path, &r)?;
            println!("wrote {}", path.display());
        }
        return Ok(());
    }

    info!(tick_ms = cfg.tick_ms, "starting sysdeck");
    let mut app = App::new(&cfg, backend);
    app.run().await
}

