// src/core/mod.rs — Generational search core

pub mod candidate;
pub mod engine;
pub mod fitness;
pub mod handoff;
pub mod operators;
pub mod seed;
pub mod state;
pub mod types;
