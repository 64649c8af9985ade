use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use logcascade_filter::{FilterSession, StylesheetCompiler, StylesheetHandle};
use logcascade_logs::{BatchOptions, LogRecord, RecordBuffer, RecordStream};

mod config;
mod report;

const STDIN_SOURCE: &str = "<stdin>";

use config::{Config, DirectiveConfig};

/// logcascade - compile hierarchical logger filters into a static stylesheet
#[derive(Parser, Debug)]
#[command(name = "logcascade")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log files to read (stdin when none are given)
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// TOML config with stylesheet options and directives
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the stylesheet to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Rewrite the output after every batch that adds loggers
    ///
    /// Input is still read to EOF; this does not tail growing files.
    #[arg(long)]
    incremental: bool,

    /// Print a logger × level visibility report to stderr
    #[arg(long)]
    report: bool,

    /// Buffer size for records kept for the report
    #[arg(long, default_value = "10000")]
    buffer_size: usize,

    /// Records handed over per batch
    #[arg(long, default_value = "1000")]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let (mut session, mut pending) = prepare_session(config);
    let buffer = RecordBuffer::new(args.buffer_size);

    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<LogRecord>>();
    let mut stream = RecordStream::new();
    let options = BatchOptions {
        max_records: args.batch_size,
        ..BatchOptions::default()
    };

    let mut sources = Vec::new();
    if args.inputs.is_empty() {
        sources.push(STDIN_SOURCE.to_string());
        stream.spawn_reader(STDIN_SOURCE, tokio::io::stdin(), batch_tx.clone(), options);
    } else {
        for path in &args.inputs {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            let source = path.display().to_string();
            stream.spawn_reader(source.clone(), file, batch_tx.clone(), options);
            sources.push(source);
        }
    }
    // Readers hold the remaining senders; the channel closes when all finish
    drop(batch_tx);

    let mut interrupted = false;
    loop {
        tokio::select! {
            batch = batch_rx.recv() => {
                let Some(batch) = batch else { break };
                let grew = session.observe_batch(&batch);
                buffer.extend(batch);

                if grew {
                    config::apply_ready(&mut pending, &mut session);
                    if args.incremental {
                        write_stylesheet(&session, args.output.as_deref())?;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, writing stylesheet for records read so far");
                interrupted = true;
                break;
            }
        }
    }

    if interrupted {
        stream.stop();
    } else {
        stream.join().await;
    }
    let lines_read: Vec<(String, u64)> = sources
        .into_iter()
        .map(|source| {
            let lines = stream.lines_read(&source).unwrap_or(0);
            (source, lines)
        })
        .collect();

    for entry in &pending {
        tracing::warn!(
            logger = entry.logger.as_deref().unwrap_or("*"),
            level = %entry.level,
            "directive names a logger that never appeared"
        );
    }

    session.flush();
    if !args.incremental || session.stylesheet().generation() == 0 {
        write_stylesheet(&session, args.output.as_deref())?;
    }

    if args.report {
        eprint!(
            "{}",
            report::render(&session, &buffer.counts_by_logger(), &lines_read)
        );
    }

    tracing::debug!(
        loggers = session.tree().len(),
        records = buffer.len(),
        "done"
    );

    Ok(())
}

/// Build the session and apply every config directive whose slot exists
///
/// Global directives take effect before any input is read; the rest stay
/// pending until their logger is observed.
fn prepare_session(config: Config) -> (FilterSession, Vec<DirectiveConfig>) {
    let compiler = StylesheetCompiler::new(config.stylesheet.compile_options());
    let mut session = FilterSession::new(compiler, StylesheetHandle::new());
    let mut pending = config.directives;
    config::apply_ready(&mut pending, &mut session);
    (session, pending)
}

/// Install the current stylesheet at `output`, or print it
///
/// Files are replaced through a sibling temp file so readers never see a
/// partial stylesheet.
fn write_stylesheet(session: &FilterSession, output: Option<&Path>) -> Result<()> {
    let css = session.stylesheet().current();

    match output {
        Some(path) => {
            let tmp = path.with_extension("css.tmp");
            fs::write(&tmp, css.as_bytes())
                .with_context(|| format!("failed to write {}", tmp.display()))?;
            fs::rename(&tmp, path)
                .with_context(|| format!("failed to replace {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(css.as_bytes())
                .and_then(|_| stdout.flush())
                .context("failed to write stylesheet to stdout")?;
        }
    }

    Ok(())
}
