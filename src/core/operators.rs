// src/core/operators.rs — Selection, crossover, mutation, repopulation

use rand::seq::index;
use rand::Rng;

use super::candidate::{Blueprint, Candidate};
use crate::infra::config::EvolutionConfig;

/// Multipliers a price mutation draws from.
pub const PRICE_FACTORS: [f64; 4] = [0.8, 0.9, 1.1, 1.25];
pub const MIN_PRICE: f64 = 5.0;
pub const MAX_PRICE: f64 = 500.0;

/// Minimum number of survivors, so crossover always has a pair to draw from.
const MIN_SURVIVORS: usize = 2;

/// Result of one crossover draw.
#[derive(Debug, Clone)]
pub enum Offspring {
    /// Crossover did not fire; the parents come back untouched.
    Parents(Candidate, Candidate),
    /// Two fresh candidates recombined from the parents.
    Children(Candidate, Candidate),
}

impl Offspring {
    pub fn into_pair(self) -> (Candidate, Candidate) {
        match self {
            Offspring::Parents(a, b) | Offspring::Children(a, b) => (a, b),
        }
    }
}

/// How many of `population_len` ranked candidates survive: the top half, at least two.
pub fn survivor_count(population_len: usize) -> usize {
    (population_len / 2).max(MIN_SURVIVORS).min(population_len)
}

/// Survivors of a population already ranked best-first.
pub fn select_survivors(ranked: &[Candidate]) -> Vec<Candidate> {
    ranked[..survivor_count(ranked.len())].to_vec()
}

/// Recombine two parents with probability `crossover_rate`.
///
/// Child A takes niche, problem, price and effort from `p1` and format,
/// solution and maintenance from `p2`; child B the other way round.
pub fn crossover<R: Rng + ?Sized>(
    p1: &Candidate,
    p2: &Candidate,
    crossover_rate: f64,
    rng: &mut R,
) -> Offspring {
    if !rng.gen_bool(crossover_rate.clamp(0.0, 1.0)) {
        return Offspring::Parents(p1.clone(), p2.clone());
    }
    Offspring::Children(
        Candidate::from_blueprint(splice(p1, p2)),
        Candidate::from_blueprint(splice(p2, p1)),
    )
}

fn splice(head: &Candidate, tail: &Candidate) -> Blueprint {
    Blueprint {
        niche: head.niche.clone(),
        problem: head.problem.clone(),
        price: head.price,
        effort_hours_est: head.effort_hours_est,
        format: tail.format.clone(),
        solution_outline: tail.solution_outline.clone(),
        maintenance_hours_est: tail.maintenance_hours_est,
    }
}

/// With probability `mutation_rate`, rescale the price by one of [`PRICE_FACTORS`].
/// Returns true if the candidate was mutated.
pub fn mutate<R: Rng + ?Sized>(candidate: &mut Candidate, mutation_rate: f64, rng: &mut R) -> bool {
    if !rng.gen_bool(mutation_rate.clamp(0.0, 1.0)) {
        return false;
    }
    let factor = PRICE_FACTORS[rng.gen_range(0..PRICE_FACTORS.len())];
    candidate.price = round_cents((candidate.price * factor).clamp(MIN_PRICE, MAX_PRICE));
    true
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Fill the next generation from `survivors` up to exactly `population_size`.
///
/// Survivors carry over as-is. Everything else is new: crossover children, or
/// fresh-identifier copies when crossover passes the parents through, so no
/// identifier ever appears twice.
pub fn repopulate<R: Rng + ?Sized>(
    survivors: Vec<Candidate>,
    population_size: usize,
    evo: &EvolutionConfig,
    rng: &mut R,
) -> Vec<Candidate> {
    let mut next = survivors;
    let n = next.len();
    if n == 0 {
        return next;
    }

    let mut children = Vec::new();
    while n + children.len() < population_size {
        let (mut a, mut b) = if n == 1 {
            // Nothing to mate with: breed by copying the lone survivor.
            let only = &next[0];
            (
                Candidate::from_blueprint(only.blueprint()),
                Candidate::from_blueprint(only.blueprint()),
            )
        } else {
            let pair = index::sample(rng, n, 2);
            match crossover(&next[pair.index(0)], &next[pair.index(1)], evo.crossover_rate, rng) {
                Offspring::Children(a, b) => (a, b),
                Offspring::Parents(a, b) => (
                    Candidate::from_blueprint(a.blueprint()),
                    Candidate::from_blueprint(b.blueprint()),
                ),
            }
        };
        mutate(&mut a, evo.mutation_rate, rng);
        mutate(&mut b, evo.mutation_rate, rng);
        children.push(a);
        children.push(b);
    }

    next.extend(children);
    next.truncate(population_size);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidate::tests::blueprint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn population(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| {
                let mut c = Candidate::from_blueprint(blueprint(&format!("niche-{i}")));
                c.fitness_score = 1.0 - i as f64 * 0.01;
                c
            })
            .collect()
    }

    fn evo(crossover_rate: f64, mutation_rate: f64) -> EvolutionConfig {
        EvolutionConfig {
            crossover_rate,
            mutation_rate,
            ..Default::default()
        }
    }

    #[test]
    fn test_survivor_count_floor() {
        assert_eq!(survivor_count(3), 2);
        assert_eq!(survivor_count(2), 2);
        assert_eq!(survivor_count(12), 6);
        assert_eq!(survivor_count(25), 12);
        assert_eq!(survivor_count(1), 1);
        assert_eq!(survivor_count(0), 0);
    }

    #[test]
    fn test_select_survivors_takes_top() {
        let pop = population(6);
        let s = select_survivors(&pop);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].id, pop[0].id);
        assert_eq!(s[2].id, pop[2].id);
    }

    #[test]
    fn test_crossover_rate_zero_returns_parents() {
        let mut rng = StdRng::seed_from_u64(7);
        let pop = population(2);
        for _ in 0..50 {
            let out = crossover(&pop[0], &pop[1], 0.0, &mut rng);
            assert!(matches!(out, Offspring::Parents(..)));
            let (a, b) = out.into_pair();
            assert_eq!(a.id, pop[0].id);
            assert_eq!(b.id, pop[1].id);
        }
    }

    #[test]
    fn test_crossover_rate_one_makes_fresh_children() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pop = population(2);
        pop[0].handoff_count = 4;
        pop[0].handoff_time_sec = 100.0;
        for _ in 0..50 {
            let out = crossover(&pop[0], &pop[1], 1.0, &mut rng);
            assert!(matches!(out, Offspring::Children(..)));
            let (a, b) = out.into_pair();
            assert!(a.id != pop[0].id && a.id != pop[1].id);
            assert!(b.id != pop[0].id && b.id != pop[1].id);
            assert_ne!(a.id, b.id);
            assert_eq!(a.handoff_count, 0);
            assert_eq!(a.handoff_time_sec, 0.0);
        }
    }

    #[test]
    fn test_crossover_gene_assignment() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pop = population(2);
        pop[1].format = "course".into();
        pop[1].price = 99.0;
        pop[1].maintenance_hours_est = 7.0;
        let (a, b) = crossover(&pop[0], &pop[1], 1.0, &mut rng).into_pair();

        assert_eq!(a.niche, pop[0].niche);
        assert_eq!(a.problem, pop[0].problem);
        assert_eq!(a.price, pop[0].price);
        assert_eq!(a.format, "course");
        assert_eq!(a.solution_outline, pop[1].solution_outline);
        assert_eq!(a.maintenance_hours_est, 7.0);

        assert_eq!(b.niche, pop[1].niche);
        assert_eq!(b.price, 99.0);
        assert_eq!(b.format, pop[0].format);
        assert_eq!(b.maintenance_hours_est, pop[0].maintenance_hours_est);
    }

    #[test]
    fn test_mutation_factor_and_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for start in [4.0, 29.0, 480.0] {
            for _ in 0..100 {
                let mut c = Candidate::from_blueprint(blueprint("m"));
                c.price = start;
                assert!(mutate(&mut c, 1.0, &mut rng));
                assert!((MIN_PRICE..=MAX_PRICE).contains(&c.price));
                assert_eq!(c.price, round_cents(c.price));
                let expected: Vec<f64> = PRICE_FACTORS
                    .iter()
                    .map(|f| round_cents((start * f).clamp(MIN_PRICE, MAX_PRICE)))
                    .collect();
                assert!(expected.contains(&c.price), "unexpected price {}", c.price);
            }
        }
    }

    #[test]
    fn test_mutation_rate_zero_never_mutates() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut c = Candidate::from_blueprint(blueprint("m"));
        for _ in 0..100 {
            assert!(!mutate(&mut c, 0.0, &mut rng));
        }
        assert_eq!(c.price, 29.0);
    }

    #[test]
    fn test_repopulate_exact_size_and_unique_ids() {
        let mut rng = StdRng::seed_from_u64(11);
        for (pop_len, size) in [(3, 3), (5, 5), (6, 7), (12, 12), (25, 12), (2, 9)] {
            for rate in [0.0, 0.5, 1.0] {
                let pop = population(pop_len);
                let survivors = select_survivors(&pop);
                let next = repopulate(survivors, size, &evo(rate, 0.5), &mut rng);
                assert_eq!(next.len(), size);
                let ids: HashSet<&str> = next.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids.len(), size, "duplicate ids at rate {rate}");
            }
        }
    }

    #[test]
    fn test_repopulate_keeps_survivors_first() {
        let mut rng = StdRng::seed_from_u64(5);
        let pop = population(6);
        let survivors = select_survivors(&pop);
        let next = repopulate(survivors.clone(), 6, &evo(1.0, 1.0), &mut rng);
        for (i, s) in survivors.iter().enumerate() {
            assert_eq!(next[i], *s, "survivor {i} changed");
        }
    }

    #[test]
    fn test_repopulate_single_survivor() {
        let mut rng = StdRng::seed_from_u64(5);
        let pop = population(1);
        let next = repopulate(pop.clone(), 4, &evo(0.7, 0.0), &mut rng);
        assert_eq!(next.len(), 4);
        assert_eq!(next[0].id, pop[0].id);
        assert!(next[1..].iter().all(|c| c.niche == pop[0].niche && c.id != pop[0].id));
    }

    #[test]
    fn test_repopulate_empty() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(repopulate(Vec::new(), 4, &evo(0.7, 0.2), &mut rng).is_empty());
    }
}
