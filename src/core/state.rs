// src/core/state.rs — The persisted generation document
//
// One JSON document holds everything the loop needs to resume: generation
// counter, ranked population, best-ever record, plateau counter and the
// current validation batch. The human edits it while the loop is suspended,
// so nothing in memory survives a handoff; the loop always reloads.
// Writes are atomic (temp file + rename) so a crash never leaves a torn file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::candidate::Candidate;
use super::seed;
use crate::infra::config::StorageConfig;
use crate::infra::errors::ForgeError;

pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Informational; set on every save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generation: u32,
    /// Ordered by the last computed ranking, best first.
    #[serde(default)]
    pub population: Vec<Candidate>,
    #[serde(default)]
    pub best_candidate: Option<Candidate>,
    #[serde(default)]
    pub no_improvement_generations: u32,
    /// Non-empty only between plan-phase selection and critique.
    #[serde(default)]
    pub validation_batch_ids: Vec<String>,
}

impl GenerationState {
    /// Generation zero for a freshly seeded population.
    pub fn initial(population: Vec<Candidate>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            saved_at: None,
            generation: 0,
            population,
            best_candidate: None,
            no_improvement_generations: 0,
            validation_batch_ids: Vec::new(),
        }
    }

    /// True when a handoff was announced but the generation was never critiqued.
    pub fn handoff_pending(&self) -> bool {
        !self.validation_batch_ids.is_empty()
    }

    pub fn is_in_batch(&self, id: &str) -> bool {
        self.validation_batch_ids.iter().any(|b| b == id)
    }

    pub fn batch_members(&self) -> impl Iterator<Item = &Candidate> {
        self.population.iter().filter(|c| self.is_in_batch(&c.id))
    }

    /// Split `elapsed` evenly over the batch identifiers and credit each batch
    /// member still in the population. Returns how many candidates were credited.
    pub fn attribute_handoff_time(&mut self, elapsed: Duration) -> usize {
        let ids: HashSet<&str> = self
            .validation_batch_ids
            .iter()
            .map(String::as_str)
            .collect();
        if ids.is_empty() || elapsed.is_zero() {
            return 0;
        }
        let share = elapsed.as_secs_f64() / ids.len() as f64;

        let mut credited = 0;
        for c in self.population.iter_mut() {
            if ids.contains(c.id.as_str()) {
                c.handoff_time_sec += share;
                credited += 1;
            }
        }
        credited
    }

    /// Check structural invariants after loading an externally edited document.
    ///
    /// Duplicate identifiers or an unknown schema make the document unusable.
    /// Out-of-range counters are clamped with a warning.
    pub fn validate(&mut self) -> Result<(), ForgeError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(ForgeError::InvalidDocument(format!(
                "schema_version {} is newer than supported version {}",
                self.schema_version, SCHEMA_VERSION
            )));
        }

        let mut seen = HashSet::new();
        for c in &self.population {
            if c.id.trim().is_empty() {
                return Err(ForgeError::InvalidDocument(
                    "candidate with empty id".into(),
                ));
            }
            if !seen.insert(c.id.as_str()) {
                return Err(ForgeError::InvalidDocument(format!(
                    "duplicate candidate id '{}'",
                    c.id
                )));
            }
        }

        for c in self.population.iter_mut().chain(self.best_candidate.iter_mut()) {
            if c.sanitize() {
                tracing::warn!(id = %c.id, "Clamped out-of-range counters in edited document");
            }
        }
        Ok(())
    }
}

/// Where a loaded state came from.
#[derive(Debug, Clone, PartialEq)]
pub enum StateOrigin {
    Document,
    /// No usable document; the population came from the seed file.
    Seeded { reason: String },
}

/// Outcome of reading the document without falling back to the seed.
#[derive(Debug)]
pub enum DocumentRead {
    Missing,
    Blank,
    Invalid(String),
    Loaded(GenerationState),
}

/// Load/save access to the generation document, plus the seed fallback.
#[derive(Debug, Clone)]
pub struct PopulationStore {
    state_path: PathBuf,
    seed_path: PathBuf,
    seed_limit: usize,
}

impl PopulationStore {
    pub fn new(state_path: impl Into<PathBuf>, seed_path: impl Into<PathBuf>, seed_limit: usize) -> Self {
        Self {
            state_path: state_path.into(),
            seed_path: seed_path.into(),
            seed_limit,
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.state_path(), storage.seed_path(), storage.seed_limit)
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn seed_path(&self) -> &Path {
        &self.seed_path
    }

    /// Read and validate the document. Never falls back, never fails.
    pub fn read_document(&self) -> DocumentRead {
        let raw = match std::fs::read_to_string(&self.state_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return DocumentRead::Missing,
            Err(e) => return DocumentRead::Invalid(e.to_string()),
        };
        if raw.trim().is_empty() {
            return DocumentRead::Blank;
        }
        let mut state: GenerationState = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => return DocumentRead::Invalid(e.to_string()),
        };
        match state.validate() {
            Ok(()) => DocumentRead::Loaded(state),
            Err(e) => DocumentRead::Invalid(e.to_string()),
        }
    }

    /// Load the document, or build generation zero from the seed file when
    /// there is no usable document. Only seed failures are errors.
    pub fn load_or_seed(&self) -> Result<(GenerationState, StateOrigin), ForgeError> {
        let reason = match self.read_document() {
            DocumentRead::Loaded(state) => {
                tracing::debug!(
                    generation = state.generation,
                    population = state.population.len(),
                    "Loaded generation document"
                );
                return Ok((state, StateOrigin::Document));
            }
            DocumentRead::Missing => "no generation document yet".to_string(),
            DocumentRead::Blank => "generation document is empty".to_string(),
            DocumentRead::Invalid(e) => {
                tracing::warn!(
                    "Generation document at {} is unusable ({}); reseeding",
                    self.state_path.display(),
                    e
                );
                format!("generation document unusable: {e}")
            }
        };

        let population = seed::load_seed(&self.seed_path, self.seed_limit)?;
        Ok((
            GenerationState::initial(population),
            StateOrigin::Seeded { reason },
        ))
    }

    /// Atomically write the document (temp file + fsync + rename).
    pub fn save(&self, state: &GenerationState) -> Result<(), ForgeError> {
        let dir = self
            .state_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        let mut doc = state.clone();
        doc.schema_version = SCHEMA_VERSION;
        doc.saved_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&doc)?;

        let file_name = self
            .state_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state.json".into());
        let tmp = dir.join(format!(".{file_name}.tmp"));

        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&tmp, &self.state_path)?;

        tracing::debug!(
            generation = state.generation,
            "Saved generation document to {}",
            self.state_path.display()
        );
        Ok(())
    }
}
