// src/lib.rs — Library root for ideaforge

pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod util;
