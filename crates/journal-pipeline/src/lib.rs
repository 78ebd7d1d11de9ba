//! Context Builder, Parts Engine, Question Generator and Event Orchestrator
//! for the journal core (spec §4.6-§4.9, components C6-C9).
//!
//! Everything here is built on top of [`journal_store::JournalDocument`]
//! and [`journal_llm::LlmGateway`]; this crate owns no storage of its own.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod config;
mod context;
mod orchestrator;
mod parts;
mod questions;
mod summarize;

pub use config::PipelineConfig;
pub use context::build_context;
pub use orchestrator::Orchestrator;
pub use parts::PartsEngine;
pub use questions::get_or_generate as generate_questions;
pub use summarize::{get_or_build, structured_entry_summary};

// vim: ts=4
