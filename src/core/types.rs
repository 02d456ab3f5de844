// src/core/types.rs — Loop phases, progress events and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::candidate::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Plan,
    Act,
    Handoff,
    Reload,
    Observe,
    Critique,
    Exit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Plan => "plan",
            Phase::Act => "act",
            Phase::Handoff => "handoff",
            Phase::Reload => "reload",
            Phase::Observe => "observe",
            Phase::Critique => "critique",
            Phase::Exit => "exit",
        };
        f.write_str(s)
    }
}

/// Why the generation loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    GenerationCap,
    Plateau,
    EmptyPopulation,
    /// Planning produced no batch, so there was nothing to hand off.
    NoValidationBatch,
    /// The handoff wait was aborted; the document holds the pre-handoff state.
    Cancelled,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::GenerationCap => write!(f, "generation cap reached"),
            ExitReason::Plateau => write!(f, "fitness plateaued"),
            ExitReason::EmptyPopulation => write!(f, "population is empty"),
            ExitReason::NoValidationBatch => write!(f, "no validation batch generated"),
            ExitReason::Cancelled => write!(f, "handoff cancelled"),
        }
    }
}

/// Final result of a run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub reason: ExitReason,
    pub generation: u32,
    pub best: Option<Candidate>,
}

/// Compact view of a ranked candidate for progress output.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub id: String,
    pub niche: String,
    pub format: String,
    pub fitness: f64,
    pub price: f64,
    pub effort_hours: f64,
    pub visitors: Option<f64>,
    pub signups: Option<f64>,
    pub handoff_count: u32,
    pub handoff_time_sec: f64,
}

impl From<&Candidate> for CandidateSummary {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id.clone(),
            niche: c.niche.clone(),
            format: c.format.clone(),
            fitness: c.fitness_score,
            price: c.price,
            effort_hours: c.effort_hours_est,
            visitors: c.signals.visitor_count(),
            signups: c.signals.signup_count(),
            handoff_count: c.handoff_count,
            handoff_time_sec: c.handoff_time_sec,
        }
    }
}

/// Real-time events emitted at each phase transition.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The state came from the seed file instead of a document.
    Seeded { count: usize, reason: String },
    /// A pending handoff was found on load; ACT is skipped.
    Resumed { generation: u32, batch_size: usize },
    PlanReady {
        generation: u32,
        batch: Vec<CandidateSummary>,
    },
    AwaitingHandoff { generation: u32, batch_size: usize },
    HandoffReturned {
        elapsed: Duration,
        credited: usize,
    },
    Observed { best: CandidateSummary },
    Critiqued {
        generation: u32,
        improved: bool,
        best_fitness: f64,
        no_improvement_generations: u32,
    },
    /// Best-ever fitness meets the build threshold. No effect on the loop.
    BuildThresholdReached { id: String, fitness: f64 },
    Finished { reason: ExitReason, generation: u32 },
}
