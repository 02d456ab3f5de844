// src/core/handoff.rs — The human handoff gate
//
// The only suspension point of the generation loop. The gate tells the human
// what to do for each batch member, then blocks until they confirm that the
// generation document has been updated. All data exchange happens through the
// document; the confirmation itself carries no payload.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};

use super::candidate::Candidate;
use crate::infra::errors::HandoffError;

/// Receiving side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Sending side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_handle, token) = cancel_pair();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle is dropped uncancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Suspension point between ACT and OBSERVE.
#[async_trait]
pub trait HandoffGate: Send + Sync {
    /// Describe the human action required for one batch member.
    fn announce(&self, candidate: &Candidate, generation: u32);

    /// Block until the human confirms the document is updated.
    /// Returns the wall-clock time spent waiting.
    async fn wait(
        &self,
        batch_ids: &[String],
        cancel: &CancelToken,
    ) -> Result<Duration, HandoffError>;
}

/// Human-facing validation instructions for a candidate.
pub fn render_instructions(candidate: &Candidate, generation: u32, document: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== HANDOFF (generation {generation}) ===");
    let _ = writeln!(
        out,
        "What needs to be done: deploy a demand test for candidate {}",
        candidate.id
    );
    let _ = writeln!(
        out,
        "Why: testing demand in niche '{}' with format '{}' at ${:.2}.",
        candidate.niche, candidate.format, candidate.price
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "How:");
    let _ = writeln!(out, "  1. Create or duplicate a landing page.");
    let _ = writeln!(out, "  2. Use this copy:");
    let _ = writeln!(out, "       Problem:  {}", candidate.problem);
    let _ = writeln!(out, "       Solution: {}", candidate.solution_outline);
    let _ = writeln!(out, "  3. Connect a waitlist form (email + one survey question).");
    let _ = writeln!(out, "  4. Share the link through your usual channels.");
    let _ = writeln!(out);
    let _ = writeln!(out, "Record under this candidate's \"signals\" in {}:", document.display());
    let _ = writeln!(out, "  visitors, signups, demand_score (0-1), competition_score (0-1), notes");
    out
}

/// Confirmation lines read so far, fed by a dedicated reader thread.
type LineReceiver = mpsc::Receiver<std::io::Result<String>>;

/// Read lines on a plain OS thread and forward them until EOF or until the
/// receiver is gone. The source is opened on that thread, so locked handles
/// such as `StdinLock` never cross threads. A blocked read never holds up
/// runtime shutdown.
fn spawn_line_reader<F, R>(open: F) -> LineReceiver
where
    F: FnOnce() -> R + Send + 'static,
    R: BufRead,
{
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("handoff-stdin".into())
        .spawn(move || {
            let mut reader = open();
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.blocking_send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.blocking_send(Err(e));
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        // the sender went down with the closure, so waits see a closed channel
        tracing::error!("Could not start the confirmation reader: {}", e);
    }
    rx
}

/// Gate that prints instructions to stdout and waits for ENTER on stdin.
/// Ctrl-C or the cancel token abort the wait.
///
/// One reader thread serves every generation, so lines typed ahead are
/// consumed in order by later waits.
pub struct ConsoleGate {
    document: PathBuf,
    lines: Mutex<LineReceiver>,
}

impl ConsoleGate {
    pub fn new(document: impl Into<PathBuf>) -> Self {
        Self::with_reader(document, || std::io::stdin().lock())
    }

    /// Gate confirmed by lines from `open()` instead of stdin.
    pub fn with_reader<F, R>(document: impl Into<PathBuf>, open: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: BufRead,
    {
        Self {
            document: document.into(),
            lines: Mutex::new(spawn_line_reader(open)),
        }
    }
}

#[async_trait]
impl HandoffGate for ConsoleGate {
    fn announce(&self, candidate: &Candidate, generation: u32) {
        println!("{}", render_instructions(candidate, generation, &self.document));
    }

    async fn wait(
        &self,
        batch_ids: &[String],
        cancel: &CancelToken,
    ) -> Result<Duration, HandoffError> {
        if cancel.is_cancelled() {
            return Err(HandoffError::Cancelled);
        }
        println!(
            "Awaiting metrics for {} candidate(s). Update {} and press ENTER to continue.",
            batch_ids.len(),
            self.document.display()
        );

        let start = Instant::now();
        let mut lines = self.lines.lock().await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HandoffError::Cancelled),
            _ = tokio::signal::ctrl_c() => return Err(HandoffError::Cancelled),
            line = lines.recv() => match line {
                Some(line) => {
                    line?;
                }
                None => return Err(HandoffError::ChannelClosed),
            },
        }

        let elapsed = start.elapsed();
        tracing::info!(secs = elapsed.as_secs_f64(), "Handoff confirmed");
        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidate::tests::blueprint;

    #[test]
    fn test_instructions_mention_candidate_and_document() {
        let c = Candidate::with_id("cand-9", blueprint("gardening"));
        let text = render_instructions(&c, 4, Path::new("/tmp/state.json"));
        assert!(text.contains("generation 4"));
        assert!(text.contains("cand-9"));
        assert!(text.contains("gardening"));
        assert!(text.contains("/tmp/state.json"));
        assert!(text.contains("gardening solution"));
    }

    #[tokio::test]
    async fn test_cancel_token_resolves_after_cancel() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("cancelled() should resolve");
    }

    fn gate_with_input(input: &'static str) -> ConsoleGate {
        ConsoleGate::with_reader("/tmp/state.json", move || std::io::Cursor::new(input))
    }

    #[tokio::test]
    async fn test_console_gate_confirms_every_generation() {
        let gate = gate_with_input("\n\n\n");
        let batch = vec!["a".to_string()];
        let cancel = CancelToken::never();
        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(5), gate.wait(&batch, &cancel))
                .await
                .expect("each wait should take the next line")
                .expect("line confirms");
        }
        let fourth = tokio::time::timeout(Duration::from_secs(5), gate.wait(&batch, &cancel))
            .await
            .expect("input exhausted");
        assert!(matches!(fourth, Err(HandoffError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_console_gate_closed_input() {
        let gate = gate_with_input("");
        let res = gate.wait(&["a".to_string()], &CancelToken::never()).await;
        assert!(matches!(res, Err(HandoffError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_console_gate_cancel_wins_over_pending_line() {
        let gate = gate_with_input("\n");
        let (handle, token) = cancel_pair();
        handle.cancel();
        let res = gate.wait(&["a".to_string()], &token).await;
        assert!(matches!(res, Err(HandoffError::Cancelled)));
    }

    #[tokio::test]
    async fn test_never_token_pends() {
        let token = CancelToken::never();
        let res = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(res.is_err());
        assert!(!token.is_cancelled());
    }
}
