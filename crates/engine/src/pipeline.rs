// ABOUTME: Runs one fetch, parse and extract pipeline per source on scoped threads.
// ABOUTME: A failing source contributes zero records and never affects the others.

//! Concurrent per-source pipelines.
//!
//! Sources share no mutable state, so each gets its own thread. Every thread
//! parses and owns its document; only the finished records cross back to the
//! caller, where they are aggregated after all threads join.

use std::collections::BTreeMap;
use std::thread;

use anyhow::anyhow;
use scraper::Html;

use crate::engine::Engine;
use crate::error::ExtractError;
use crate::extractors::schema::{SchemaSet, SiteSchema};
use crate::record::EventRecord;

/// Result of one source's pipeline.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source_id: String,
    pub records: Vec<EventRecord>,
    /// Why the source produced no records, when it failed.
    pub error: Option<ExtractError>,
}

impl SourceOutcome {
    fn failed(source_id: &str, error: ExtractError) -> Self {
        tracing::warn!(error = %error, "source produced no records");
        Self {
            source_id: source_id.to_string(),
            records: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs every source in `schemas` concurrently.
///
/// `fetch` returns the raw markup of a source; a fetch error marks that source
/// unavailable. The result has one outcome per schema, keyed by source id.
pub fn run_sources<F>(
    engine: &Engine,
    schemas: &SchemaSet,
    fetch: F,
) -> BTreeMap<String, SourceOutcome>
where
    F: Fn(&SiteSchema) -> Result<String, ExtractError> + Sync,
{
    let fetch = &fetch;
    thread::scope(|scope| {
        let handles: Vec<_> = schemas
            .iter()
            .map(|schema| {
                let handle = scope.spawn(move || run_one(engine, schema, fetch));
                (schema.source_id.as_str(), handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(source_id, handle)| {
                let outcome = handle.join().unwrap_or_else(|_| {
                    SourceOutcome::failed(
                        source_id,
                        ExtractError::unavailable(
                            source_id,
                            "pipeline",
                            Some(anyhow!("source pipeline panicked")),
                        ),
                    )
                });
                (source_id.to_string(), outcome)
            })
            .collect()
    })
}

fn run_one<F>(engine: &Engine, schema: &SiteSchema, fetch: &F) -> SourceOutcome
where
    F: Fn(&SiteSchema) -> Result<String, ExtractError>,
{
    let span = tracing::info_span!("source", id = %schema.source_id);
    let _guard = span.enter();

    let markup = match fetch(schema) {
        Ok(markup) => markup,
        Err(err) => return SourceOutcome::failed(&schema.source_id, err),
    };
    let doc = Html::parse_document(&markup);
    match engine.try_extract(&doc, schema) {
        Ok(records) => {
            tracing::info!(records = records.len(), "source extracted");
            SourceOutcome {
                source_id: schema.source_id.clone(),
                records,
                error: None,
            }
        }
        Err(err) => SourceOutcome::failed(&schema.source_id, err),
    }
}

/// Flattens outcomes into one record list in source-id order.
pub fn combine(outcomes: BTreeMap<String, SourceOutcome>) -> Vec<EventRecord> {
    outcomes
        .into_values()
        .flat_map(|outcome| outcome.records)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::loader::load_schemas_from_str;

    const SCHEMAS: &str = r#"{
        "alpha": {
            "base_url": "https://alpha.example",
            "content_list": {"tag": "section", "attrs": {"id": "events"}},
            "item": {"tag": "article"},
            "fields": {"title": {"locator": {"tag": "h2"}}}
        },
        "beta": {
            "base_url": "https://beta.example",
            "content_list": {"tag": "section", "attrs": {"id": "events"}},
            "item": {"tag": "article"},
            "fields": {"title": {"locator": {"tag": "h2"}}}
        },
        "gamma": {
            "base_url": "https://gamma.example",
            "content_list": {"tag": "div", "attrs": {"class": "listing"}},
            "item": {"tag": "article"},
            "fields": {"title": {"locator": {"tag": "h2"}}}
        }
    }"#;

    const PAGE: &str = r#"<section id="events"><article><h2>A</h2></article><article><h2>B</h2></article></section>"#;

    fn fake_fetch(schema: &SiteSchema) -> Result<String, ExtractError> {
        match schema.source_id.as_str() {
            "beta" => Err(ExtractError::unavailable("beta", "fetch", Some(anyhow!("timeout")))),
            _ => Ok(PAGE.to_string()),
        }
    }

    #[test]
    fn failures_stay_isolated_per_source() {
        let schemas = load_schemas_from_str(SCHEMAS).expect("schemas");
        let outcomes = run_sources(&Engine::default(), &schemas, fake_fetch);
        assert_eq!(outcomes.len(), 3);

        let alpha = &outcomes["alpha"];
        assert!(alpha.is_ok());
        assert_eq!(alpha.records.len(), 2);
        assert_eq!(alpha.records[1].title, "B");

        let beta = &outcomes["beta"];
        assert!(beta.records.is_empty());
        assert!(beta.error.as_ref().is_some_and(|e| e.is_unavailable()));

        let gamma = &outcomes["gamma"];
        assert!(gamma.records.is_empty());
        assert!(gamma.error.as_ref().is_some_and(|e| e.is_content_list_missing()));
    }

    #[test]
    fn combine_keeps_source_order() {
        let schemas = load_schemas_from_str(SCHEMAS).expect("schemas");
        let records = combine(run_sources(&Engine::default(), &schemas, fake_fetch));
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source_id == "alpha"));
    }
}
