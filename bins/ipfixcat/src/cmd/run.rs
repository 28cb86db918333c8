use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use flow_codec::{Interpreter, StreamDecoder};
use pipeline::RunSummary;

use crate::config::Effective;
use crate::error::CatError;

pub async fn run(eff: &Effective) -> Result<RunSummary, CatError> {
    tracing::info!(
        output = eff.output,
        mstats = eff.mstats,
        acc = eff.acc,
        statsintv_s = eff.stats_interval.as_secs(),
        "ipfixcat starting"
    );

    // --- Dictionary ---
    let mut interpreter = Interpreter::default();
    if let Some(path) = &eff.dict {
        let n = interpreter.load_dictionary(path)?;
        tracing::info!(path = %path.display(), entries = n, "loaded dictionary");
    }

    // --- Input ---
    let reader = open_input(eff.input.as_deref())?;
    let source = StreamDecoder::new(reader);

    // --- Ctrl+C → cancel ---
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, shutting down");
                signal_token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    let out = BufWriter::new(io::stdout().lock());
    let summary = pipeline::run(source, Arc::new(interpreter), &eff.options(), out, token).await?;

    tracing::info!(
        records = summary.records,
        emitted = summary.emitted,
        interrupted = summary.interrupted,
        "ipfixcat finished"
    );
    Ok(summary)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read + Send>, CatError> {
    match path {
        None => Ok(Box::new(io::stdin())),
        Some(path) => {
            let file = File::open(path).map_err(|source| CatError::Input { path: path.display().to_string(), source })?;
            tracing::info!(path = %path.display(), "reading from file");
            Ok(Box::new(BufReader::new(file)))
        }
    }
}
