//! ook-scan: run one de Bruijn address scan against a simulated transmitter.

mod config;
mod sim;

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use ook_scan_core::{ScanSession, TemplateEncoder, TransmissionSink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use sim::{ProgressLogger, SimulatedTransmitter};

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for the summary.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let result = Config::from_args().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), String> {
    if config.print_config {
        config.print();
    }

    let protocol = config
        .definition()
        .compile()
        .map_err(|e| format!("invalid protocol: {e}"))?;

    if let Some(word) = config.single_word(&protocol)? {
        let frame = TemplateEncoder::new(&protocol)
            .encode_word(&word)
            .map_err(|e| e.to_string())?;
        let mut tx = SimulatedTransmitter::new(config.time_scale);
        tx.transmit(&frame, protocol.tx_params());
        println!("{frame}");
        return Ok(());
    }

    let live = config.live_fields(&protocol)?;
    let session = ScanSession::with_protocol(protocol, live, config.scan_options())
        .map_err(|e| e.to_string())?;

    let handle = session
        .spawn(SimulatedTransmitter::new(config.time_scale), ProgressLogger::default())
        .map_err(|e| e.to_string())?;

    if let Some(ms) = config.abort_after_ms {
        let token = handle.cancel_token();
        thread::Builder::new()
            .name("abort-timer".into())
            .spawn(move || {
                thread::sleep(Duration::from_millis(ms));
                info!(after_ms = ms, "abort requested");
                token.request();
            })
            .map_err(|e| e.to_string())?;
    }

    let (report, tx) = handle.join().map_err(|e| e.to_string())?;
    println!("Scan {report} ({} frames)", tx.frames());

    if !config.no_metrics {
        report.metrics.print_summary();
    }

    Ok(())
}
