// src/cli/run.rs — Default command: run the generation loop

use crate::cli::progress::terminal_progress;
use crate::core::engine::GenerationEngine;
use crate::core::handoff::{cancel_pair, ConsoleGate};
use crate::core::state::PopulationStore;
use crate::core::types::GenerationOutcome;
use crate::infra::config::Config;

/// Run generations until an exit condition holds, then print the report.
pub async fn run_loop(config: &Config) -> anyhow::Result<()> {
    let store = PopulationStore::from_config(&config.storage);
    tracing::info!(
        state = %store.state_path().display(),
        seed = %store.seed_path().display(),
        "Starting generation loop"
    );

    let gate = ConsoleGate::new(store.state_path());
    // The handle is held for the whole run; Ctrl-C is handled inside the gate.
    let (_cancel_handle, cancel) = cancel_pair();

    let mut engine = GenerationEngine::new(store, Box::new(gate), config)
        .with_cancel(cancel)
        .with_progress(terminal_progress());

    let outcome = engine.run().await?;
    print!("{}", render_report(&outcome, config.evolution.target_monthly_revenue));
    Ok(())
}

pub fn render_report(outcome: &GenerationOutcome, target_monthly_revenue: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Stopped after generation {}: {}\n",
        outcome.generation, outcome.reason
    ));
    match &outcome.best {
        Some(best) => {
            out.push_str("\nBest candidate:\n");
            out.push_str(&best.to_string());
            out.push('\n');
            match best.sales_needed(target_monthly_revenue) {
                Some(n) => out.push_str(&format!(
                    "Sales needed for ${:.0}/month: {}\n",
                    target_monthly_revenue, n
                )),
                None => out.push_str("Sales needed: n/a (no positive price)\n"),
            }
        }
        None => out.push_str("No best candidate found\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidate::tests::blueprint;
    use crate::core::candidate::Candidate;
    use crate::core::types::ExitReason;

    #[test]
    fn test_report_without_best() {
        let outcome = GenerationOutcome {
            reason: ExitReason::EmptyPopulation,
            generation: 0,
            best: None,
        };
        let text = render_report(&outcome, 600.0);
        assert!(text.contains("population is empty"));
        assert!(text.contains("No best candidate found"));
    }

    #[test]
    fn test_report_with_best_includes_sales_needed() {
        let mut best = Candidate::with_id("b1", blueprint("knitters"));
        best.price = 25.0;
        let outcome = GenerationOutcome {
            reason: ExitReason::Plateau,
            generation: 4,
            best: Some(best),
        };
        let text = render_report(&outcome, 600.0);
        assert!(text.starts_with("Stopped after generation 4: fitness plateaued"));
        assert!(text.contains("b1"));
        assert!(text.contains("Sales needed for $600/month: 24"));
    }
}
