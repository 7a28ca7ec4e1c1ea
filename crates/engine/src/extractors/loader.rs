// ABOUTME: Loader for schema sets from JSON text, files, and the embedded builtin set.
// ABOUTME: Every schema is validated before the set is returned; one bad source fails the load.

//! Schema set loader.
//!
//! A schema set is a JSON object mapping source ids to site schemas. Loading
//! is all-or-nothing so malformed configuration surfaces before extraction.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::error::ExtractError;
use crate::extractors::registry::validate;
use crate::extractors::schema::{RawSiteSchema, SchemaSet};

/// Embedded JSON containing the builtin Chattanooga event sources.
const BUILTIN_SCHEMAS_JSON: &str = include_str!("../../data/sites.json");

/// Loads and validates a schema set from JSON text.
pub fn load_schemas_from_str(json: &str) -> Result<SchemaSet, ExtractError> {
    let raw: BTreeMap<String, RawSiteSchema> = serde_json::from_str(json)
        .map_err(|err| ExtractError::schema("*", "load", Some(err.into())))?;

    let mut set = SchemaSet::new();
    for (source_id, raw_schema) in raw {
        let schema = validate(&source_id, raw_schema)?;
        set.register(schema);
    }
    tracing::debug!(sources = set.len(), "schema set loaded");
    Ok(set)
}

/// Loads and validates a schema set from a JSON file.
pub fn load_schemas_from_path(path: impl AsRef<Path>) -> Result<SchemaSet, ExtractError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .map_err(|err| ExtractError::schema("*", "load", Some(err)))?;
    load_schemas_from_str(&json)
}

/// Loads the builtin schema set embedded in the crate.
pub fn load_builtin_schemas() -> Result<SchemaSet, ExtractError> {
    load_schemas_from_str(BUILTIN_SCHEMAS_JSON)
}
