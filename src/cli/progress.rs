// src/cli/progress.rs — Terminal progress renderer for the generation loop

use crate::core::types::{CandidateSummary, ProgressEvent};
use crate::util::one_line;

const NICHE_WIDTH: usize = 32;

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout stays reserved for the
/// handoff instructions and the final report.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

pub(crate) fn format_summary(c: &CandidateSummary) -> String {
    let mut line = format!(
        "  {:<36} fit={:.3} {:<32} {} ${:.2} {:.0}h",
        c.id,
        c.fitness,
        one_line(&c.niche, NICHE_WIDTH),
        c.format,
        c.price,
        c.effort_hours,
    );
    if let Some(v) = c.visitors {
        line.push_str(&format!(" visitors={v:.0}"));
    }
    if let Some(s) = c.signups {
        line.push_str(&format!(" signups={s:.0}"));
    }
    if c.handoff_count > 0 {
        line.push_str(&format!(
            " handoffs={} ({:.0}s)",
            c.handoff_count, c.handoff_time_sec
        ));
    }
    line
}

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Seeded { count, reason } => {
            format!("[seed] {} candidate(s) loaded ({})", count, reason)
        }
        ProgressEvent::Resumed {
            generation,
            batch_size,
        } => format!(
            "[gen {}] resuming pending handoff for {} candidate(s)",
            generation, batch_size
        ),
        ProgressEvent::PlanReady { generation, batch } => {
            let mut out = format!("[gen {}] plan: {} candidate(s) to validate", generation, batch.len());
            for c in batch {
                out.push('\n');
                out.push_str(&format_summary(c));
            }
            out
        }
        ProgressEvent::AwaitingHandoff {
            generation,
            batch_size,
        } => format!(
            "[gen {}] waiting on handoff ({} candidate(s))",
            generation, batch_size
        ),
        ProgressEvent::HandoffReturned { elapsed, credited } => format!(
            "[handoff] {:.1}s credited across {} candidate(s)",
            elapsed.as_secs_f64(),
            credited
        ),
        ProgressEvent::Observed { best } => {
            format!("[observe] leader:\n{}", format_summary(best))
        }
        ProgressEvent::Critiqued {
            generation,
            improved,
            best_fitness,
            no_improvement_generations,
        } => format!(
            "[gen {}] best={:.3} {}",
            generation,
            best_fitness,
            if *improved {
                "improved".to_string()
            } else {
                format!("no improvement ({} in a row)", no_improvement_generations)
            }
        ),
        ProgressEvent::BuildThresholdReached { id, fitness } => {
            format!("[build] {} reached fitness {:.3}", id, fitness)
        }
        ProgressEvent::Finished { reason, generation } => {
            format!("[done] generation={} reason: {}", generation, reason)
        }
    }
}
