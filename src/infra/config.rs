// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::ForgeError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub fitness: FitnessConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

/// Parameters of one generational run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub target_monthly_revenue: f64,
    pub population_size: usize,
    pub max_generations: u32,
    pub plateau_generations: u32,
    /// Evaluated every generation but has no effect on the loop yet.
    pub min_fitness_to_build: f64,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub validation_batch_size: usize,
    /// Fixed RNG seed for reproducible operator draws.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            target_monthly_revenue: 600.0,
            population_size: 12,
            max_generations: 20,
            plateau_generations: 3,
            min_fitness_to_build: 0.75,
            crossover_rate: 0.7,
            mutation_rate: 0.2,
            validation_batch_size: 3,
            rng_seed: None,
        }
    }
}

/// Weights of the placeholder viability heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub demand_weight: f64,
    pub competition_weight: f64,
    pub effort_reference_hours: f64,
    pub effort_penalty_cap: f64,
    pub effort_penalty_floor: f64,
    pub handoff_cycle_penalty: f64,
    pub handoff_hour_penalty: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            demand_weight: 0.6,
            competition_weight: 0.3,
            effort_reference_hours: 20.0,
            effort_penalty_cap: 1.5,
            effort_penalty_floor: 0.05,
            handoff_cycle_penalty: 0.15,
            handoff_hour_penalty: 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,
    pub seed_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            seed_file: None,
            seed_limit: 25,
        }
    }
}

impl StorageConfig {
    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::state_file_path)
    }

    pub fn seed_path(&self) -> PathBuf {
        self.seed_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::seed_file_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            base_url: None,
            temperature: Some(0.8),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter sets the generation loop cannot run with.
    pub fn validate(&self) -> Result<(), ForgeError> {
        let e = &self.evolution;
        if e.population_size < 2 {
            return Err(ForgeError::Config(format!(
                "evolution.population_size must be at least 2 (got {})",
                e.population_size
            )));
        }
        for (name, rate) in [
            ("crossover_rate", e.crossover_rate),
            ("mutation_rate", e.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ForgeError::Config(format!(
                    "evolution.{name} must be within [0, 1] (got {rate})"
                )));
            }
        }
        if e.validation_batch_size == 0 {
            return Err(ForgeError::Config(
                "evolution.validation_batch_size must be at least 1".into(),
            ));
        }

        let f = &self.fitness;
        if f.effort_reference_hours <= 0.0 || f.effort_penalty_cap <= 0.0 {
            return Err(ForgeError::Config(
                "fitness.effort_reference_hours and fitness.effort_penalty_cap must be positive"
                    .into(),
            ));
        }
        if f.effort_penalty_floor <= 0.0 || f.effort_penalty_floor > f.effort_penalty_cap {
            return Err(ForgeError::Config(
                "fitness.effort_penalty_floor must be positive and not above the cap".into(),
            ));
        }
        if self.storage.seed_limit == 0 {
            return Err(ForgeError::Config(
                "storage.seed_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Render the config as TOML, for `ideaforge init`.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
