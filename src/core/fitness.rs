// src/core/fitness.rs — Viability heuristic
//
// Placeholder formula: weighted demand and (1 - competition), divided by an
// effort penalty and a human-handoff penalty. Only the contract matters to the
// rest of the engine: candidate in, score in [0,1] out, deterministic.

use super::candidate::Candidate;
use crate::infra::config::FitnessConfig;

const DEFAULT_SIGNAL: f64 = 0.5;

/// Read a 0..1 signal, treating negatives as their magnitude and anything
/// missing or non-finite as the neutral default.
fn unit_signal(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.abs().min(1.0),
        _ => DEFAULT_SIGNAL,
    }
}

/// Penalty for large builds: `effort / reference`, saturating at the cap.
pub fn effort_penalty(effort_hours: f64, cfg: &FitnessConfig) -> f64 {
    let effort = if effort_hours.is_finite() {
        effort_hours.abs()
    } else {
        f64::MAX
    };
    (effort / cfg.effort_reference_hours).clamp(cfg.effort_penalty_floor, cfg.effort_penalty_cap)
}

/// Penalty growing linearly with handoff cycles and accumulated handoff hours.
pub fn handoff_penalty(candidate: &Candidate, cfg: &FitnessConfig) -> f64 {
    let hours = if candidate.handoff_time_sec.is_finite() {
        candidate.handoff_hours().max(0.0)
    } else {
        0.0
    };
    1.0 + cfg.handoff_cycle_penalty * f64::from(candidate.handoff_count)
        + cfg.handoff_hour_penalty * hours
}

pub fn compute_fitness(candidate: &Candidate, cfg: &FitnessConfig) -> f64 {
    let demand = unit_signal(candidate.signals.demand());
    let competition = unit_signal(candidate.signals.competition());

    let base = cfg.demand_weight * demand + cfg.competition_weight * (1.0 - competition);
    let score = base / effort_penalty(candidate.effort_hours_est, cfg)
        / handoff_penalty(candidate, cfg);

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Recompute every candidate's score and sort best-first.
///
/// The sort is stable, so ties keep their previous relative order.
pub fn score_and_rank(population: &mut [Candidate], cfg: &FitnessConfig) {
    for c in population.iter_mut() {
        c.fitness_score = compute_fitness(c, cfg);
    }
    population.sort_by(|a, b| b.fitness_score.total_cmp(&a.fitness_score));
}
