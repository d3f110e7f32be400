//! # Editor Host
//!
//! Serves the line-delimited JSON protocol for one [`Session`].
//!
//! The session is owned by the serving task and never shared. Analyzer runs
//! go to a blocking task and report back over a channel, so requests keep
//! being served while the analyzer works:
//!
//! ```text
//!  stdin lines ──▶ ┌──────────────┐ ──▶ stdout events
//!                  │  serve loop  │
//!   completions ──▶│  (select!)   │ ──▶ spawn_blocking(Analyzer::run)
//!        ▲         └──────────────┘                │
//!        └────────────── mpsc ─────────────────────┘
//! ```
//!
//! The loop ends on `shutdown` or end of input, after any analysis in flight
//! has been applied.

use crate::{
    analyzer::Analyzer,
    error::CostlensError,
    protocol::{Event, Request},
    session::{Outcome, PendingAnalysis, Session},
    Result,
};

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type Completion = (PendingAnalysis, Result<Vec<u8>>);

/// Serves the protocol on stdin and stdout.
///
/// # Errors
///
/// Returns an error if stdin or stdout fail.
pub async fn serve_stdio(session: Session) -> Result<()> {
    serve(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serves the protocol on `reader` and `writer`.
///
/// Malformed requests and command errors become notices; only I/O errors on
/// the streams end the loop early.
///
/// # Errors
///
/// Returns an error if reading requests or writing events fails.
pub async fn serve<R, W>(mut session: Session, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel::<Completion>(1);
    let mut line = Vec::new();
    let mut reading = true;

    info!("Serving costlens protocol");

    loop {
        if !reading && !session.is_busy() {
            break;
        }

        tokio::select! {
            // Partial reads stay in `line` if the other branch wins.
            read = reader.read_until(b'\n', &mut line), if reading => {
                if read? == 0 {
                    debug!("End of input");
                    reading = false;
                    continue;
                }
                let bytes = std::mem::take(&mut line);

                match decode_request(&bytes) {
                    Ok(None) => {}
                    Ok(Some(Request::Shutdown)) => {
                        info!("Shutdown requested");
                        reading = false;
                    }
                    Ok(Some(request)) => {
                        let outcome = session.handle(request);
                        dispatch(&session, outcome, &tx, &mut writer).await?;
                    }
                    Err(reason) => {
                        warn!("Rejected request: {}", reason);
                        emit(&mut writer, &[Event::warning(format!("Invalid request: {}", reason))]).await?;
                    }
                }
            }
            Some((pending, result)) = rx.recv() => {
                let outcome = session.complete_analysis(pending, result);
                emit(&mut writer, &outcome.events).await?;
            }
        }
    }

    session.shutdown()?;
    Ok(())
}

/// Decodes one input line. Blank lines yield `None`.
fn decode_request(bytes: &[u8]) -> std::result::Result<Option<Request>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("not UTF-8 ({})", e))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some).map_err(|e| e.to_string())
}

async fn dispatch<W>(
    session: &Session,
    outcome: Result<Outcome>,
    tx: &mpsc::Sender<Completion>,
    writer: &mut W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match outcome {
        Ok(outcome) => {
            emit(writer, &outcome.events).await?;
            if let Some(pending) = outcome.analysis {
                spawn_analysis(session.analyzer(), pending, tx.clone());
            }
        }
        Err(e) => {
            debug!("Request rejected: {}", e);
            emit(writer, &[Event::from(&e)]).await?;
        }
    }
    Ok(())
}

fn spawn_analysis(
    analyzer: Arc<dyn Analyzer>,
    pending: PendingAnalysis,
    tx: mpsc::Sender<Completion>,
) {
    tokio::spawn(async move {
        let job = pending.job().clone();
        let result = match tokio::task::spawn_blocking(move || analyzer.run(&job)).await {
            Ok(result) => result,
            Err(e) => Err(CostlensError::AnalysisFailed(format!("analyzer task failed: {}", e))),
        };
        if tx.send((pending, result)).await.is_err() {
            warn!("Session ended before the analysis finished");
        }
    });
}

async fn emit<W>(writer: &mut W, events: &[Event]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for event in events {
        let mut line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}
