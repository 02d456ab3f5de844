// src/core/engine.rs — Generation loop state machine
//
// PLAN -> ACT -> HANDOFF (suspend) -> RELOAD -> OBSERVE -> CRITIQUE -> PLAN | EXIT
//
// The document is saved after ACT (before suspending) and after CRITIQUE.
// After the handoff the in-memory state is discarded and reloaded, since the
// human edits the document while the loop waits.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use super::fitness::score_and_rank;
use super::handoff::{CancelToken, HandoffGate};
use super::operators::{repopulate, select_survivors};
use super::state::{GenerationState, PopulationStore, StateOrigin};
use super::types::*;
use crate::infra::config::{Config, EvolutionConfig, FitnessConfig};
use crate::infra::errors::HandoffError;

pub struct GenerationEngine {
    store: PopulationStore,
    gate: Box<dyn HandoffGate>,
    evolution: EvolutionConfig,
    fitness: FitnessConfig,
    rng: StdRng,
    cancel: CancelToken,
    /// Optional callback for real-time progress events.
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl GenerationEngine {
    pub fn new(store: PopulationStore, gate: Box<dyn HandoffGate>, config: &Config) -> Self {
        let rng = match config.evolution.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            gate,
            evolution: config.evolution.clone(),
            fitness: config.fitness.clone(),
            rng,
            cancel: CancelToken::never(),
            on_progress: None,
        }
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Token the handoff wait listens to. Defaults to one that never fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn store(&self) -> &PopulationStore {
        &self.store
    }

    fn enter(&self, phase: Phase, generation: u32) {
        tracing::debug!(%phase, generation, "Entering phase");
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Generation cap or plateau. Checked before every PLAN.
    pub fn exit_condition(&self, state: &GenerationState) -> Option<ExitReason> {
        self.check_build_threshold(state);

        if state.generation >= self.evolution.max_generations {
            return Some(ExitReason::GenerationCap);
        }
        if state.no_improvement_generations >= self.evolution.plateau_generations {
            return Some(ExitReason::Plateau);
        }
        None
    }

    /// Placeholder for a future "ready to build" branch: reports only.
    fn check_build_threshold(&self, state: &GenerationState) {
        let Some(best) = state.best_candidate.as_ref() else {
            return;
        };
        if best.fitness_score.is_finite() && best.fitness_score >= self.evolution.min_fitness_to_build
        {
            tracing::debug!(id = %best.id, fitness = best.fitness_score, "Build threshold reached");
            self.emit(ProgressEvent::BuildThresholdReached {
                id: best.id.clone(),
                fitness: best.fitness_score,
            });
        }
    }

    /// Score, rank, and pick the validation batch (top K).
    pub fn plan(&self, state: &mut GenerationState) {
        self.enter(Phase::Plan, state.generation);
        score_and_rank(&mut state.population, &self.fitness);

        let k = self.evolution.validation_batch_size.min(state.population.len());
        state.validation_batch_ids = state.population[..k].iter().map(|c| c.id.clone()).collect();

        self.emit(ProgressEvent::PlanReady {
            generation: state.generation,
            batch: state.population[..k].iter().map(CandidateSummary::from).collect(),
        });
    }

    /// Charge one handoff cycle to each batch member, announce the work, persist.
    pub fn act(&self, state: &mut GenerationState) -> anyhow::Result<()> {
        self.enter(Phase::Act, state.generation);
        let generation = state.generation;
        let batch = state.validation_batch_ids.clone();
        for c in state.population.iter_mut() {
            if batch.contains(&c.id) {
                c.handoff_count = c.handoff_count.saturating_add(1);
                self.gate.announce(c, generation);
            }
        }
        self.store.save(state)?;
        Ok(())
    }

    /// Rescore the (possibly edited) population and re-rank it.
    pub fn observe(&self, state: &mut GenerationState) {
        self.enter(Phase::Observe, state.generation);
        score_and_rank(&mut state.population, &self.fitness);
        if let Some(best) = state.population.first() {
            self.emit(ProgressEvent::Observed {
                best: CandidateSummary::from(best),
            });
        }
    }

    /// Update best-ever and plateau bookkeeping, breed the next generation, persist.
    pub fn critique(&mut self, state: &mut GenerationState) -> anyhow::Result<()> {
        self.enter(Phase::Critique, state.generation);
        let Some(top) = state.population.first() else {
            return Ok(());
        };

        let improved = state
            .best_candidate
            .as_ref()
            .map_or(true, |best| top.fitness_score > best.fitness_score);
        if improved {
            state.best_candidate = Some(top.clone());
            state.no_improvement_generations = 0;
        } else {
            state.no_improvement_generations += 1;
        }

        let survivors = select_survivors(&state.population);
        state.population = repopulate(
            survivors,
            self.evolution.population_size,
            &self.evolution,
            &mut self.rng,
        );
        state.generation += 1;
        state.validation_batch_ids.clear();

        self.emit(ProgressEvent::Critiqued {
            generation: state.generation,
            improved,
            best_fitness: state
                .best_candidate
                .as_ref()
                .map(|b| b.fitness_score)
                .unwrap_or(0.0),
            no_improvement_generations: state.no_improvement_generations,
        });

        self.store.save(state)?;
        Ok(())
    }

    fn load(&self) -> anyhow::Result<GenerationState> {
        let (state, origin) = self.store.load_or_seed()?;
        if let StateOrigin::Seeded { reason } = origin {
            self.emit(ProgressEvent::Seeded {
                count: state.population.len(),
                reason,
            });
        }
        Ok(state)
    }

    fn finish(&self, state: &GenerationState, reason: ExitReason) -> GenerationOutcome {
        self.enter(Phase::Exit, state.generation);
        tracing::info!(generation = state.generation, %reason, "Generation loop finished");
        self.emit(ProgressEvent::Finished {
            reason: reason.clone(),
            generation: state.generation,
        });
        GenerationOutcome {
            reason,
            generation: state.generation,
            best: state.best_candidate.clone(),
        }
    }

    /// Run generations until an exit condition holds.
    pub async fn run(&mut self) -> anyhow::Result<GenerationOutcome> {
        let mut state = self.load()?;

        // A batch on disk means ACT already ran for this generation.
        let mut resume = state.handoff_pending();

        loop {
            if resume {
                resume = false;
                tracing::info!(
                    generation = state.generation,
                    "Resuming pending handoff without re-running ACT"
                );
                self.emit(ProgressEvent::Resumed {
                    generation: state.generation,
                    batch_size: state.validation_batch_ids.len(),
                });
            } else {
                if let Some(reason) = self.exit_condition(&state) {
                    return Ok(self.finish(&state, reason));
                }
                if state.population.is_empty() {
                    return Ok(self.finish(&state, ExitReason::EmptyPopulation));
                }

                self.plan(&mut state);
                if state.validation_batch_ids.is_empty() {
                    return Ok(self.finish(&state, ExitReason::NoValidationBatch));
                }
                self.act(&mut state)?;
            }

            let elapsed = match self.suspend(&state).await {
                Ok(elapsed) => elapsed,
                Err(HandoffError::Cancelled) => {
                    return Ok(self.finish(&state, ExitReason::Cancelled));
                }
                Err(e) => return Err(e.into()),
            };

            // The in-memory state is stale once the human has had the document.
            self.enter(Phase::Reload, state.generation);
            state = self.load()?;
            let credited = state.attribute_handoff_time(elapsed);
            self.emit(ProgressEvent::HandoffReturned { elapsed, credited });

            if state.population.is_empty() {
                return Ok(self.finish(&state, ExitReason::EmptyPopulation));
            }

            self.observe(&mut state);
            self.critique(&mut state)?;
        }
    }

    async fn suspend(&self, state: &GenerationState) -> Result<Duration, HandoffError> {
        self.enter(Phase::Handoff, state.generation);
        self.emit(ProgressEvent::AwaitingHandoff {
            generation: state.generation,
            batch_size: state.validation_batch_ids.len(),
        });
        self.gate
            .wait(&state.validation_batch_ids, &self.cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidate::tests::blueprint;
    use crate::core::candidate::Candidate;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct NoopGate;

    #[async_trait]
    impl HandoffGate for NoopGate {
        fn announce(&self, _candidate: &Candidate, _generation: u32) {}

        async fn wait(
            &self,
            _batch_ids: &[String],
            _cancel: &CancelToken,
        ) -> Result<Duration, HandoffError> {
            Ok(Duration::ZERO)
        }
    }

    fn engine(dir: &TempDir, evolution: EvolutionConfig) -> GenerationEngine {
        let store = PopulationStore::new(
            dir.path().join("state.json"),
            dir.path().join("seed.jsonl"),
            25,
        );
        let config = Config {
            evolution,
            ..Default::default()
        };
        GenerationEngine::new(store, Box::new(NoopGate), &config).with_rng_seed(1)
    }

    fn state(n: usize) -> GenerationState {
        GenerationState::initial(
            (0..n)
                .map(|i| {
                    let mut c = Candidate::with_id(format!("c{i}"), blueprint(&format!("n{i}")));
                    c.effort_hours_est = 10.0 + i as f64;
                    c
                })
                .collect(),
        )
    }

    #[test]
    fn test_exit_condition() {
        let dir = TempDir::new().unwrap();
        let e = engine(&dir, EvolutionConfig::default());
        let mut s = state(3);
        assert_eq!(e.exit_condition(&s), None);
        s.generation = 20;
        assert_eq!(e.exit_condition(&s), Some(ExitReason::GenerationCap));
        s.generation = 2;
        s.no_improvement_generations = 3;
        assert_eq!(e.exit_condition(&s), Some(ExitReason::Plateau));
    }

    #[test]
    fn test_build_threshold_has_no_effect() {
        let dir = TempDir::new().unwrap();
        let e = engine(&dir, EvolutionConfig::default());
        let mut s = state(3);
        let mut best = s.population[0].clone();
        best.fitness_score = 0.99;
        s.best_candidate = Some(best);
        assert_eq!(e.exit_condition(&s), None);
    }

    #[test]
    fn test_plan_selects_top_k() {
        let dir = TempDir::new().unwrap();
        let e = engine(&dir, EvolutionConfig::default());
        let mut s = state(5);
        e.plan(&mut s);
        assert_eq!(s.validation_batch_ids.len(), 3);
        // lowest effort ranks first
        assert_eq!(s.validation_batch_ids, vec!["c0", "c1", "c2"]);

        let mut small = state(2);
        e.plan(&mut small);
        assert_eq!(small.validation_batch_ids.len(), 2);
    }

    #[test]
    fn test_act_increments_only_batch_and_persists() {
        let dir = TempDir::new().unwrap();
        let e = engine(&dir, EvolutionConfig::default());
        let mut s = state(5);
        e.plan(&mut s);
        e.act(&mut s).unwrap();

        for c in &s.population {
            let expected = u32::from(s.is_in_batch(&c.id));
            assert_eq!(c.handoff_count, expected, "candidate {}", c.id);
        }
        let (saved, origin) = e.store().load_or_seed().unwrap();
        assert_eq!(origin, StateOrigin::Document);
        assert_eq!(saved.validation_batch_ids, s.validation_batch_ids);
    }

    #[test]
    fn test_critique_tracks_improvement_and_resizes() {
        let dir = TempDir::new().unwrap();
        let e_cfg = EvolutionConfig {
            population_size: 5,
            ..Default::default()
        };
        let mut e = engine(&dir, e_cfg);
        let mut s = state(5);
        e.plan(&mut s);
        e.observe(&mut s);
        e.critique(&mut s).unwrap();

        assert_eq!(s.generation, 1);
        assert_eq!(s.population.len(), 5);
        assert!(s.validation_batch_ids.is_empty());
        assert_eq!(s.no_improvement_generations, 0);
        let best = s.best_candidate.clone().unwrap();
        assert_eq!(best.id, "c0");

        // same fitness again: not strictly better
        e.observe(&mut s);
        if s.population[0].fitness_score <= best.fitness_score {
            e.critique(&mut s).unwrap();
            assert_eq!(s.no_improvement_generations, 1);
            assert_eq!(s.best_candidate.unwrap().id, "c0");
        }
    }
}
