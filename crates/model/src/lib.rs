//! Model backend clients.
//!
//! The orchestration loop talks to the [`ModelClient`] trait from
//! `loopsmith-core`; this crate provides the HTTP implementations.

pub mod openai_compat;

pub use loopsmith_core::model::ModelClient;
pub use openai_compat::OpenAiCompatClient;
