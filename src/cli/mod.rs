// src/cli/mod.rs — CLI definition (clap derive)

pub mod draft;
pub mod init;
pub mod progress;
pub mod run;
pub mod status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::infra::config::Config;
use crate::infra::errors::ForgeError;

#[derive(Parser)]
#[command(
    name = "ideaforge",
    about = "Evolve product ideas with a human in the loop",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Generation document path (overrides config and IDEAFORGE_STATE_FILE)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Seed file path (overrides config and IDEAFORGE_SEED_FILE)
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the generation loop (default)
    Run,
    /// Show the current generation document
    Status {
        /// List every candidate, not just the batch and the best
        #[arg(long)]
        verbose: bool,
    },
    /// Write a default config file
    Init,
    /// Ask a model for new seed candidates and append them to the seed file
    Draft {
        /// Number of candidates to request
        #[arg(short, long, default_value = "5")]
        count: usize,
        /// Niche hints to steer the model (repeatable)
        #[arg(long)]
        niche: Vec<String>,
    },
}

impl Cli {
    /// Fold the path flags into the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref p) = self.state {
            config.storage.state_file = Some(p.to_string_lossy().into_owned());
        }
        if let Some(ref p) = self.seed {
            config.storage.seed_file = Some(p.to_string_lossy().into_owned());
        }
    }
}

/// Next step to suggest when startup failed because there is nothing to evolve.
pub fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    let forge = err.downcast_ref::<ForgeError>()?;
    forge.is_fatal_seed_error().then_some(
        "hint: add one JSON candidate per line to the seed file, \
         or run `ideaforge draft` to have a model write some",
    )
}
