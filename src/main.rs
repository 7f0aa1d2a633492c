//! JSON-lines front end for the engine worker
//!
//! One request per stdin line, one response per stdout line. Logs go to
//! stderr so stdout carries nothing but protocol.

use anyhow::Result;
use chess_worker::engine::{EngineFacade, EngineOptions, FacadeConfig, MAX_DEPTH, ReferenceEngine};
use chess_worker::worker::{Request, Response, Worker};
use clap::Parser;
use crossbeam_channel::{Receiver, select, unbounded};
use std::io::{self, BufRead, Write};
use std::thread;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Principal variations per analysis update (1-5)
    #[arg(long, default_value_t = 1)]
    multi_pv: u32,

    /// Deepest analysis iteration
    #[arg(long, default_value_t = MAX_DEPTH)]
    max_depth: u32,

    /// Milliseconds between analysis updates
    #[arg(long, default_value_t = chess_worker::engine::DEFAULT_ANALYSIS_PERIOD_MS)]
    analysis_period_ms: u32,

    /// Drive the compiled engine library instead of the reference engine
    #[cfg(feature = "native")]
    #[arg(long)]
    native: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
    .write_style(env_logger::WriteStyle::Never)
    .target(env_logger::Target::Stderr)
    .init();

    if let Err(e) = run(args) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = FacadeConfig {
        analysis_period_ms: args.analysis_period_ms,
    };

    #[cfg(feature = "native")]
    if args.native {
        use chess_worker::engine::NativeEngine;
        let worker = Worker::spawn(move || Ok(EngineFacade::with_config(NativeEngine::new(), config)))?;
        return pump(worker);
    }

    let options = EngineOptions::new(args.multi_pv, args.max_depth);
    log::debug!("reference engine options: {options:?}");
    let worker =
        Worker::spawn(move || Ok(EngineFacade::with_config(ReferenceEngine::new(options), config)))?;
    pump(worker)
}

/// Forward stdin lines to the worker and worker responses to stdout until
/// stdin closes and the worker has drained.
fn pump(mut worker: Worker) -> Result<()> {
    let lines = spawn_stdin_reader();
    let responses = worker.responses().clone();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    loop {
        select! {
            recv(lines) -> line => match line {
                Ok(line) => forward(&worker, &mut out, line.trim())?,
                Err(_) => break,
            },
            recv(responses) -> response => match response {
                Ok(response) => emit(&mut out, &response)?,
                Err(_) => {
                    log::error!("engine worker exited");
                    return Ok(());
                }
            },
        }
    }

    log::debug!("stdin closed, waiting for the worker to finish");
    worker.close();
    for response in responses.iter() {
        emit(&mut out, &response)?;
    }
    worker.join();
    Ok(())
}

fn forward(worker: &Worker, out: &mut impl Write, line: &str) -> Result<()> {
    if line.is_empty() {
        return Ok(());
    }
    match Request::from_json(line) {
        Ok(request) => worker.send(request)?,
        Err(e) => {
            log::warn!("malformed message {line:?}: {e}");
            emit(out, &Response::Error(format!("malformed message: {e}")))?;
        }
    }
    Ok(())
}

fn emit(out: &mut impl Write, response: &Response) -> io::Result<()> {
    writeln!(out, "{}", response.to_json())?;
    out.flush()
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
