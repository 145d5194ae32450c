//! AgentFlow - three-stage LLM agent pipeline
//!
//! A task (free-text objective plus optional context) runs through three
//! agents in fixed order. Each agent renders a prompt, asks the configured
//! LLM provider for a JSON reply and parses it leniently; its result is
//! summarized into the next agent's prompt.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait with OpenAI and Anthropic implementations
//! - [`generation`] - Text generation service and lenient JSON parsing
//! - [`prompts`] - Prompt templates with on-disk overrides
//! - [`agent`] - Stage definitions, stage agents and summarizers
//! - [`pipeline`] - Sequential orchestrator and workflow results
//! - [`events`] - Progress events broadcast during a run
//! - [`domain`] - Tasks and session history
//! - [`report`] - Terminal rendering of results and progress
//! - [`session`] - Interactive session
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod generation;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod session;

pub use agent::{Stage, StageAgent, StageError, StageResult};
pub use config::{Config, ConfigurationError};
pub use domain::Task;
pub use generation::{GenerationError, GenerationService};
pub use pipeline::{Orchestrator, WorkflowResult};
