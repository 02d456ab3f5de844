// src/cli/status.rs — Generation document status display

use std::path::Path;

use crate::cli::progress::format_summary;
use crate::core::state::{DocumentRead, GenerationState, PopulationStore};
use crate::core::types::CandidateSummary;
use crate::infra::config::Config;
use crate::infra::paths;

/// Display the state of the generation document without modifying it.
///
/// `config_path` is the `--config` file the caller loaded, if any.
pub async fn show_status(
    config: &Config,
    config_path: Option<&Path>,
    verbose: bool,
) -> anyhow::Result<()> {
    let store = PopulationStore::from_config(&config.storage);

    println!("ideaforge v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("{}", config_line(config_path, &paths::config_file_path()));
    let seed = store.seed_path();
    println!(
        "  Seed:       {}{}",
        seed.display(),
        if seed.exists() { "" } else { " (missing)" }
    );

    print!(
        "{}",
        render_document(&store.read_document(), store.state_path(), config, verbose)
    );

    if verbose {
        println!();
        println!("  Data dir:   {}", paths::data_dir().display());
        println!("  Config dir: {}", paths::config_dir().display());
    }
    Ok(())
}

/// Where the running config came from: the explicit file, else the default
/// location when it exists, else built-in defaults.
fn config_line(explicit: Option<&Path>, default_path: &Path) -> String {
    match explicit {
        Some(path) => format!("  Config:     {} (loaded)", path.display()),
        None if default_path.exists() => format!("  Config:     {} (loaded)", default_path.display()),
        None => "  Config:     (using defaults)".to_string(),
    }
}

pub fn render_document(read: &DocumentRead, path: &Path, config: &Config, verbose: bool) -> String {
    match read {
        DocumentRead::Missing => format!("  Document:   {} (no prior run)\n", path.display()),
        DocumentRead::Blank => format!("  Document:   {} (empty, no prior run)\n", path.display()),
        DocumentRead::Invalid(e) => format!(
            "  Document:   {} (unusable, next run reseeds)\n    {}\n",
            path.display(),
            e
        ),
        DocumentRead::Loaded(state) => render_state(state, path, config, verbose),
    }
}

fn render_state(state: &GenerationState, path: &Path, config: &Config, verbose: bool) -> String {
    let evo = &config.evolution;
    let mut out = format!("  Document:   {}\n", path.display());
    if let Some(saved_at) = state.saved_at {
        out.push_str(&format!("  Saved:      {}\n", saved_at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    out.push_str(&format!(
        "  Generation: {} of {}\n",
        state.generation, evo.max_generations
    ));
    out.push_str(&format!(
        "  Population: {} candidate(s)\n",
        state.population.len()
    ));
    out.push_str(&format!(
        "  Plateau:    {} of {} generation(s) without improvement\n",
        state.no_improvement_generations, evo.plateau_generations
    ));

    if state.handoff_pending() {
        out.push_str(&format!(
            "\n  Handoff pending for {} candidate(s):\n",
            state.validation_batch_ids.len()
        ));
        for c in state.batch_members() {
            out.push_str(&format_summary(&CandidateSummary::from(c)));
            out.push('\n');
        }
    }

    match &state.best_candidate {
        Some(best) => {
            out.push_str("\n  Best so far:\n");
            out.push_str(&format_summary(&CandidateSummary::from(best)));
            out.push('\n');
            if let Some(n) = best.sales_needed(evo.target_monthly_revenue) {
                out.push_str(&format!(
                    "    {} sale(s)/month to reach ${:.0}\n",
                    n, evo.target_monthly_revenue
                ));
            }
        }
        None => out.push_str("\n  Best so far: none yet\n"),
    }

    if verbose && !state.population.is_empty() {
        out.push_str("\n  Population:\n");
        for c in &state.population {
            out.push_str(&format_summary(&CandidateSummary::from(c)));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidate::tests::blueprint;
    use crate::core::candidate::Candidate;

    fn loaded() -> GenerationState {
        let pop: Vec<Candidate> = (0..4)
            .map(|i| Candidate::with_id(format!("c{i}"), blueprint(&format!("niche{i}"))))
            .collect();
        let mut state = GenerationState::initial(pop);
        state.generation = 2;
        state.validation_batch_ids = vec!["c1".into()];
        state
    }

    #[test]
    fn test_config_line_names_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "").unwrap();
        let absent_default = dir.path().join("config.toml");

        let line = config_line(Some(&custom), &absent_default);
        assert!(line.contains("custom.toml"));
        assert!(line.contains("(loaded)"));

        assert_eq!(config_line(None, &absent_default), "  Config:     (using defaults)");

        std::fs::write(&absent_default, "").unwrap();
        assert!(config_line(None, &absent_default).contains("config.toml (loaded)"));
    }

    #[test]
    fn test_missing_document() {
        let text = render_document(
            &DocumentRead::Missing,
            Path::new("s.json"),
            &Config::default(),
            false,
        );
        assert!(text.contains("no prior run"));
    }

    #[test]
    fn test_loaded_document_shows_pending_batch() {
        let text = render_document(
            &DocumentRead::Loaded(loaded()),
            Path::new("s.json"),
            &Config::default(),
            false,
        );
        assert!(text.contains("Generation: 2 of 20"));
        assert!(text.contains("Handoff pending for 1 candidate(s)"));
        assert!(text.contains("niche1"));
        assert!(!text.contains("niche3"));
        assert!(text.contains("Best so far: none yet"));
    }

    #[test]
    fn test_verbose_lists_population() {
        let text = render_document(
            &DocumentRead::Loaded(loaded()),
            Path::new("s.json"),
            &Config::default(),
            true,
        );
        assert!(text.contains("niche3"));
    }
}
