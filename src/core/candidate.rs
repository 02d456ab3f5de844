// src/core/candidate.rs — Candidate model (the unit of selection)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Observed measurements for a candidate, written by the human between generations.
///
/// The documented keys hold whatever JSON the human wrote, so a list of notes
/// or a `"~120"` visitor estimate loads and saves back unchanged. The numeric
/// accessors read a number or a numeric string and report anything else as
/// absent. Undocumented keys land in `extra` and round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// Demand estimate in [0,1]. Scored as 0.5 when absent or not numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_score: Option<Value>,
    /// Competition estimate in [0,1], lower is better. Scored as 0.5 when absent or not numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signups: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `12`, `0.4` and `"12"` read as numbers; `null`, `"~120"` and lists do not.
fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

impl Signals {
    pub fn is_empty(&self) -> bool {
        self.demand_score.is_none()
            && self.competition_score.is_none()
            && self.visitors.is_none()
            && self.signups.is_none()
            && self.notes.is_none()
            && self.extra.is_empty()
    }

    pub fn demand(&self) -> Option<f64> {
        numeric(self.demand_score.as_ref())
    }

    pub fn competition(&self) -> Option<f64> {
        numeric(self.competition_score.as_ref())
    }

    pub fn visitor_count(&self) -> Option<f64> {
        numeric(self.visitors.as_ref())
    }

    pub fn signup_count(&self) -> Option<f64> {
        numeric(self.signups.as_ref())
    }

    /// Signups per visitor, when both read as numbers and visitors is positive.
    pub fn conversion_rate(&self) -> Option<f64> {
        match (self.visitor_count(), self.signup_count()) {
            (Some(v), Some(s)) if v > 0.0 => Some(s / v),
            _ => None,
        }
    }
}

/// The descriptive part of a candidate: what the product idea is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub niche: String,
    pub format: String,
    pub problem: String,
    pub solution_outline: String,
    pub price: f64,
    pub effort_hours_est: f64,
    pub maintenance_hours_est: f64,
}

/// One product idea under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub niche: String,
    pub format: String,
    pub problem: String,
    pub solution_outline: String,
    pub price: f64,
    pub effort_hours_est: f64,
    pub maintenance_hours_est: f64,
    #[serde(default)]
    pub signals: Signals,
    /// Derived. Recomputed on every plan and observe phase.
    #[serde(default)]
    pub fitness_score: f64,
    #[serde(default)]
    pub handoff_count: u32,
    #[serde(default)]
    pub handoff_time_sec: f64,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Candidate {
    /// A brand-new candidate: fresh identifier, no signals, zeroed human cost.
    pub fn from_blueprint(blueprint: Blueprint) -> Self {
        Self::with_id(new_id(), blueprint)
    }

    pub fn with_id(id: impl Into<String>, b: Blueprint) -> Self {
        Self {
            id: id.into(),
            niche: b.niche,
            format: b.format,
            problem: b.problem,
            solution_outline: b.solution_outline,
            price: b.price,
            effort_hours_est: b.effort_hours_est,
            maintenance_hours_est: b.maintenance_hours_est,
            signals: Signals::default(),
            fitness_score: 0.0,
            handoff_count: 0,
            handoff_time_sec: 0.0,
        }
    }

    pub fn blueprint(&self) -> Blueprint {
        Blueprint {
            niche: self.niche.clone(),
            format: self.format.clone(),
            problem: self.problem.clone(),
            solution_outline: self.solution_outline.clone(),
            price: self.price,
            effort_hours_est: self.effort_hours_est,
            maintenance_hours_est: self.maintenance_hours_est,
        }
    }

    /// Sales per month the current price needs to reach `target_monthly_revenue`.
    pub fn sales_needed(&self, target_monthly_revenue: f64) -> Option<u64> {
        if !(self.price.is_finite() && self.price > 0.0) || target_monthly_revenue <= 0.0 {
            return None;
        }
        Some((target_monthly_revenue / self.price).ceil() as u64)
    }

    pub fn handoff_hours(&self) -> f64 {
        self.handoff_time_sec / 3600.0
    }

    /// Clamp cost counters and the cached score back into their valid ranges.
    /// Returns true if anything had to be corrected.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if !self.handoff_time_sec.is_finite() || self.handoff_time_sec < 0.0 {
            self.handoff_time_sec = 0.0;
            changed = true;
        }
        if !self.fitness_score.is_finite() || !(0.0..=1.0).contains(&self.fitness_score) {
            self.fitness_score = if self.fitness_score.is_finite() {
                self.fitness_score.clamp(0.0, 1.0)
            } else {
                0.0
            };
            changed = true;
        }
        changed
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.id)?;
        writeln!(f, "Niche: {}", self.niche)?;
        writeln!(f, "Format: {}", self.format)?;
        writeln!(f, "Problem: {}", self.problem)?;
        writeln!(f, "Solution: {}", self.solution_outline)?;
        writeln!(f, "Price: ${:.2}", self.price)?;
        writeln!(
            f,
            "Effort: {}h, Maintenance: {}h/mo",
            self.effort_hours_est, self.maintenance_hours_est
        )?;
        let signals = serde_json::to_string(&self.signals).unwrap_or_else(|_| "{}".into());
        writeln!(f, "Signals: {}", signals)?;
        if let Some(rate) = self.signals.conversion_rate() {
            writeln!(f, "Conversion: {:.1}%", rate * 100.0)?;
        }
        writeln!(f, "Fitness: {:.3}", self.fitness_score)?;
        write!(
            f,
            "Handoff: {}x, {:.0}s",
            self.handoff_count, self.handoff_time_sec
        )
    }
}
