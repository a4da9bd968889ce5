//! Core library for slashlint.
//!
//! This crate provides the validation and auto-fix engine used by the
//! `slashlint` CLI and any downstream consumers.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and management
//! - [`document`] - The parsed command document model
//! - [`frontmatter`] - Frontmatter extraction, decoding, and repair
//! - [`detect`] - Body convention detectors
//! - [`rules`] - The validation rule catalogue
//! - [`lint`] - Per-document validation
//! - [`fix`] - Deterministic auto-fixing
//! - [`report`] - Run-level aggregation
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use slashlint_core::{Config, rules};
//!
//! let config = Config::default();
//! let catalogue = rules::catalogue();
//! let ctx = rules::Context::new(&config);
//! let report = slashlint_core::lint::validate(
//!     "review.md",
//!     "---\ndescription: Review the staged changes\n---\nReview them.\n",
//!     &catalogue,
//!     &ctx,
//! );
//! assert!(report.is_valid());
//! ```
#![deny(unsafe_code)]

pub mod config;

pub mod detect;

pub mod document;

pub mod error;

pub mod fix;

pub mod frontmatter;

pub mod lint;

pub mod report;

pub mod rules;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult, FrontmatterError};

/// Default cap on input file size (5 MiB), shared by CLI commands.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
