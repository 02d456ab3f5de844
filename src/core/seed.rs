// src/core/seed.rs — Initial population from a JSONL seed file
//
// One candidate per non-blank line. Records without an `id` get a fresh one.
// Missing, empty, or malformed seed files are fatal: there is nothing to evolve.

use serde::Deserialize;
use std::path::Path;

use super::candidate::{new_id, Candidate, Signals};
use crate::infra::errors::ForgeError;

/// A seed line. Only the descriptive fields are required.
#[derive(Debug, Deserialize)]
struct SeedRecord {
    #[serde(default)]
    id: Option<String>,
    niche: String,
    format: String,
    problem: String,
    solution_outline: String,
    price: f64,
    effort_hours_est: f64,
    maintenance_hours_est: f64,
    #[serde(default)]
    signals: Signals,
    #[serde(default)]
    fitness_score: f64,
    #[serde(default)]
    handoff_count: u32,
    #[serde(default)]
    handoff_time_sec: f64,
}

impl From<SeedRecord> for Candidate {
    fn from(r: SeedRecord) -> Self {
        let id = r
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_id);
        let mut c = Candidate {
            id,
            niche: r.niche,
            format: r.format,
            problem: r.problem,
            solution_outline: r.solution_outline,
            price: r.price,
            effort_hours_est: r.effort_hours_est,
            maintenance_hours_est: r.maintenance_hours_est,
            signals: r.signals,
            fitness_score: r.fitness_score,
            handoff_count: r.handoff_count,
            handoff_time_sec: r.handoff_time_sec,
        };
        c.sanitize();
        c
    }
}

/// Parse seed text. `path` is only used for diagnostics.
pub fn parse_seed(text: &str, path: &Path, limit: usize) -> Result<Vec<Candidate>, ForgeError> {
    let mut population = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: SeedRecord =
            serde_json::from_str(line).map_err(|e| ForgeError::SeedMalformed {
                path: path.to_path_buf(),
                line: idx + 1,
                message: e.to_string(),
            })?;
        population.push(Candidate::from(record));
        if population.len() >= limit {
            break;
        }
    }

    if population.is_empty() {
        return Err(ForgeError::SeedEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(population)
}

/// Read up to `limit` candidates from the seed file at `path`.
pub fn load_seed(path: &Path, limit: usize) -> Result<Vec<Candidate>, ForgeError> {
    if !path.exists() {
        return Err(ForgeError::SeedMissing {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    let population = parse_seed(&text, path, limit)?;
    tracing::info!(
        count = population.len(),
        "Seeded initial population from {}",
        path.display()
    );
    Ok(population)
}

/// Render a candidate as one seed line (used when appending drafted ideas).
pub fn to_seed_line(candidate: &Candidate) -> Result<String, ForgeError> {
    Ok(serde_json::to_string(candidate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const LINE_A: &str = r#"{"id":"a","niche":"pets","format":"ebook","problem":"p","solution_outline":"s","price":19,"effort_hours_est":8,"maintenance_hours_est":1}"#;
    const LINE_NO_ID: &str = r#"{"niche":"tax","format":"template","problem":"p","solution_outline":"s","price":9,"effort_hours_est":4,"maintenance_hours_est":0.5,"signals":{"visitors":10}}"#;

    fn p() -> PathBuf {
        PathBuf::from("seeds.jsonl")
    }

    #[test]
    fn test_parse_assigns_missing_ids() {
        let text = format!("{LINE_A}\n\n{LINE_NO_ID}\n");
        let pop = parse_seed(&text, &p(), 25).unwrap();
        assert_eq!(pop.len(), 2);
        assert_eq!(pop[0].id, "a");
        assert!(!pop[1].id.is_empty());
        assert_eq!(pop[1].signals.visitor_count(), Some(10.0));
    }

    #[test]
    fn test_parse_blank_id_replaced() {
        let line = LINE_A.replace(r#""id":"a""#, r#""id":"  ""#);
        let pop = parse_seed(&line, &p(), 25).unwrap();
        assert!(!pop[0].id.trim().is_empty());
    }

    #[test]
    fn test_parse_respects_limit() {
        let text = std::iter::repeat(LINE_NO_ID)
            .take(30)
            .collect::<Vec<_>>()
            .join("\n");
        let pop = parse_seed(&text, &p(), 25).unwrap();
        assert_eq!(pop.len(), 25);
    }

    #[test]
    fn test_parse_malformed_reports_line() {
        let text = format!("{LINE_A}\n{{not json\n");
        match parse_seed(&text, &p(), 25) {
            Err(ForgeError::SeedMalformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected SeedMalformed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(
            parse_seed("\n  \n", &p(), 25),
            Err(ForgeError::SeedEmpty { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.jsonl");
        match load_seed(&path, 25) {
            Err(ForgeError::SeedMissing { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected SeedMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_seed_line_roundtrip() {
        let pop = parse_seed(LINE_A, &p(), 1).unwrap();
        let line = to_seed_line(&pop[0]).unwrap();
        let again = parse_seed(&line, &p(), 1).unwrap();
        assert_eq!(again[0], pop[0]);
    }
}
