// ABOUTME: Main library entry point for the evscrape event extraction engine.
// ABOUTME: Re-exports the public API: Engine, EngineBuilder, EventRecord, ExtractError, ErrorCode, schema loaders.

//! evscrape - A declarative extraction engine for event listing pages.
//!
//! Each source is described by a [`SiteSchema`]: where its event list lives
//! and how every field of an event is located and decoded. The engine turns a
//! parsed document plus its schema into complete [`EventRecord`]s, using the
//! `"N/A"` sentinel for anything it cannot resolve.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use evscrape_engine::{load_builtin_schemas, Engine, ExtractError};
//! use scraper::Html;
//!
//! fn main() -> Result<(), ExtractError> {
//!     let schemas = load_builtin_schemas()?;
//!     let mut documents = BTreeMap::new();
//!     let html = std::fs::read_to_string("pulse.html").unwrap_or_default();
//!     documents.insert("chattanooga-pulse".to_string(), Html::parse_document(&html));
//!
//!     let engine = Engine::builder().build();
//!     for (source, records) in engine.extract_all(&schemas, &documents) {
//!         println!("{}: {} events", source, records.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod extractors;
pub mod options;
pub mod pipeline;
pub mod record;

pub use crate::engine::{render, Engine};
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::extractors::datetime::{normalize, NormalizedDateTime, TimeSlot};
pub use crate::extractors::links::resolve as resolve_url;
pub use crate::extractors::loader::{
    load_builtin_schemas, load_schemas_from_path, load_schemas_from_str,
};
pub use crate::extractors::registry::FieldKind;
pub use crate::extractors::schema::{Locator, SchemaSet, SiteSchema};
pub use crate::options::{EngineBuilder, Options, OutputFormat};
pub use crate::pipeline::{combine, run_sources, SourceOutcome};
pub use crate::record::{EventRecord, COLUMNS, NOT_AVAILABLE, TIME_UNAVAILABLE};
