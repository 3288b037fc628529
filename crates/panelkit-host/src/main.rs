mod host;

use anyhow::{Context, Result};
use clap::Parser;
use host::{Host, HostLine};
use panelkit_core::catalog::StaticCatalog;
use panelkit_core::config::{config_path, load_config};
use panelkit_core::wire::{DecodeReport, LineDecoder, DEFAULT_MAX_FRAME_BYTES};
use std::io::{self, Read};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const READ_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Parser, Debug)]
#[command(name = "panelkit-host")]
struct Args {
    /// Config file; defaults to PANELKIT_CONFIG_PATH or the XDG config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Technology catalog (TOML); overrides `catalog_path` from the config.
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// Evaluate the research access check as denied.
    #[arg(long, default_value_t = false)]
    deny_access: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    max_frame_bytes: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let path = args.config.clone().unwrap_or_else(config_path);
    let config =
        load_config(&path).with_context(|| format!("loading config {}", path.display()))?;

    let catalog = match args.catalog.clone().or_else(|| config.catalog_path.clone()) {
        Some(path) => StaticCatalog::load(&path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => StaticCatalog::default(),
    };
    info!(
        event = "host_start",
        config = %path.display(),
        technologies = catalog.len(),
        max_name_length = config.news.max_name_length,
        max_body_length = config.news.max_body_length
    );

    let lines = spawn_stdin_reader(args.max_frame_bytes);
    let mut host = Host::new(
        config,
        Rc::new(catalog),
        !args.deny_access,
        args.max_frame_bytes,
        io::stdout(),
    );
    for line in lines {
        host.dispatch(line);
    }

    info!(event = "host_stop", open_sessions = host.session_count());
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("PANELKIT_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };

    let filter = if debug {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Decodes stdin on a background thread. The receiver closes at EOF.
fn spawn_stdin_reader(max_frame_bytes: usize) -> Receiver<HostLine> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut decoder = LineDecoder::<HostLine>::new(max_frame_bytes);
        let mut stdin = io::stdin().lock();
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        loop {
            let read = match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(event = "stdin_read_error", error = %err);
                    break;
                }
            };
            if !forward(decoder.push_chunk(&buf[..read]), &tx) {
                return;
            }
        }
        forward(decoder.finish(), &tx);
    });
    rx
}

fn forward(report: DecodeReport<HostLine>, tx: &Sender<HostLine>) -> bool {
    for err in report.errors {
        warn!(event = "frame_rejected", error = %err);
    }
    report.frames.into_iter().all(|line| tx.send(line).is_ok())
}
