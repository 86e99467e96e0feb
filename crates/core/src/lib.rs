//! Core library for codeprompt
//!
//! This crate implements the **Functional Core** of the codeprompt application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The codeprompt project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`codeprompt_core`** (this crate): Pure transformation functions with zero I/O
//! - **`codeprompt`**: HTTP, filesystem, terminal and MCP orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Deterministic**: Behavior is predictable and reproducible
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! The only exceptions are id and timestamp generation when a context is created
//! ([`session::Session::complete_analysis`] takes the timestamp as an argument).
//!
//! # Module Organization
//!
//! - [`source`]: Collected files, extension filters and the delimited blob
//! - [`repo`]: Repository URL parsing and git hosting API transformations
//! - [`gemini`]: Model provider wire types and long-running operation handling
//! - [`analysis`]: Analysis schema, prompts, parsing and grounding extraction
//! - [`style`]: Prompt styles and their templates
//! - [`refine`]: Refinement request and response handling
//! - [`media`]: Logo, narration and video prompts, data URIs and WAV wrapping
//! - [`session`]: Files, history, current selection and refinement override
//! - [`config`]: Configuration model with defaults
//! - [`error`]: Error taxonomy
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use codeprompt_core::source::{build_blob, SourceFile};
//! use codeprompt_core::style::{render, PromptStyle};
//!
//! let files = vec![SourceFile::new("a.py", "print(1)")];
//! let blob = build_blob(&files);
//!
//! // `analysis` comes from `analysis::parse_analysis` on the model output
//! let prompt = render(PromptStyle::Concise, &analysis, &blob, "");
//! assert!(prompt.contains("print(1)"));
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod gemini;
pub mod media;
pub mod refine;
pub mod repo;
pub mod session;
pub mod source;
pub mod style;

pub use error::Error;
