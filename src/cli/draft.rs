// src/cli/draft.rs — Draft seed candidates with a language model

use std::io::Write;
use std::path::Path;

use crate::core::candidate::Candidate;
use crate::core::seed::{parse_seed, to_seed_line};
use crate::infra::config::Config;
use crate::provider::{llm_call, provider_from_env};
use crate::util::one_line;

const SYSTEM_PROMPT: &str = "You generate small digital product ideas for a solo builder. \
Reply with JSON Lines only: one JSON object per line, no prose, no code fences. \
Each object has the keys niche, format, problem, solution_outline (strings), \
price (USD), effort_hours_est (hours to build) and maintenance_hours_est (hours per month).";

fn user_prompt(count: usize, niches: &[String], target_monthly_revenue: f64) -> String {
    let mut prompt = format!(
        "Propose {count} distinct product ideas that could plausibly reach ${target_monthly_revenue:.0} \
         in monthly revenue with low build effort."
    );
    if !niches.is_empty() {
        prompt.push_str(&format!(" Focus on these niches: {}.", niches.join(", ")));
    }
    prompt
}

/// Keep the reply lines that parse as seed records; drop everything else.
pub fn parse_drafted(reply: &str, limit: usize) -> Vec<Candidate> {
    let origin = Path::new("<model reply>");
    reply
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('{'))
        .filter_map(|line| match parse_seed(line, origin, 1) {
            Ok(mut parsed) => parsed.pop(),
            Err(e) => {
                tracing::warn!("Skipping drafted line {}: {}", one_line(line, 60), e);
                None
            }
        })
        .take(limit)
        .collect()
}

/// Append candidates to the seed file as JSONL, creating it if needed.
pub fn append_to_seed(path: &Path, candidates: &[Candidate]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let needs_newline = std::fs::read(path)
        .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
        .unwrap_or(false);

    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    if needs_newline {
        writeln!(f)?;
    }
    for c in candidates {
        writeln!(f, "{}", to_seed_line(c)?)?;
    }
    f.sync_all()?;
    Ok(())
}

/// Ask the configured model for `count` ideas and append them to the seed file.
pub async fn run_draft(config: &Config, count: usize, niches: &[String]) -> anyhow::Result<()> {
    if count == 0 {
        anyhow::bail!("--count must be at least 1");
    }
    let provider = provider_from_env(&config.llm)?;
    eprintln!("Asking {} ({}) for {} idea(s)...", provider.name(), config.llm.model, count);

    let reply = llm_call(
        provider.as_ref(),
        &config.llm,
        SYSTEM_PROMPT,
        &user_prompt(count, niches, config.evolution.target_monthly_revenue),
    )
    .await?;

    let drafted = parse_drafted(&reply, count);
    if drafted.is_empty() {
        anyhow::bail!("The model reply contained no usable candidates");
    }

    let seed = config.storage.seed_path();
    append_to_seed(&seed, &drafted)?;
    println!("Appended {} candidate(s) to {}", drafted.len(), seed.display());
    for c in &drafted {
        println!("  {} | {} | ${:.2}", c.niche, c.format, c.price);
    }
    Ok(())
}
