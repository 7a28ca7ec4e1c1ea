// ABOUTME: The Engine struct assembling EventRecords from parsed documents and site schemas.
// ABOUTME: Provides extract(), try_extract(), extract_all() plus record rendering as JSON or TSV.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};

use crate::error::ExtractError;
use crate::extractors::fields::{
    apply_time_field, extract_all_texts, extract_datetime, extract_details, extract_location,
    extract_text, extract_title, extract_url,
};
use crate::extractors::image::resolve_image;
use crate::extractors::schema::{SchemaSet, SiteSchema};
use crate::extractors::select::{document_scope, resolve_all, resolve_one};
use crate::options::{EngineBuilder, Options, OutputFormat};
use crate::record::{EventRecord, COLUMNS, NOT_AVAILABLE};

/// The extraction engine. Holds only immutable options and is cheap to share.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    opts: Options,
}

impl Engine {
    /// Create a new Engine with the given options.
    pub fn new(opts: Options) -> Self {
        Self { opts }
    }

    /// Create a new EngineBuilder.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Extracts one record per item node of `schema` from `doc`.
    ///
    /// Fails only when the content list cannot be located; every item found
    /// yields a complete record.
    pub fn try_extract(
        &self,
        doc: &Html,
        schema: &SiteSchema,
    ) -> Result<Vec<EventRecord>, ExtractError> {
        let root = document_scope(doc);
        let list = if schema.content_list.is_bare() {
            root
        } else {
            resolve_one(root, &schema.content_list)
                .ok_or_else(|| ExtractError::content_list_missing(&schema.source_id, "extract"))?
        };

        let mut items = resolve_all(list, &schema.item);
        if let Some(max) = self.opts.max_items_per_source {
            items.truncate(max);
        }
        tracing::debug!(source = %schema.source_id, items = items.len(), "items located");

        Ok(items
            .into_iter()
            .map(|item| self.assemble(item, schema))
            .collect())
    }

    /// Like [`Engine::try_extract`], but a missing content list is logged and
    /// yields no records.
    pub fn extract(&self, doc: &Html, schema: &SiteSchema) -> Vec<EventRecord> {
        match self.try_extract(doc, schema) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "no records extracted");
                Vec::new()
            }
        }
    }

    /// Parses `html` and extracts its records.
    pub fn extract_html(&self, html: &str, schema: &SiteSchema) -> Vec<EventRecord> {
        let doc = Html::parse_document(html);
        self.extract(&doc, schema)
    }

    /// Extracts every source in `schemas` from its document in `documents`.
    ///
    /// A source without a document contributes zero records. The result has
    /// one entry per schema, keyed by source id.
    pub fn extract_all(
        &self,
        schemas: &SchemaSet,
        documents: &BTreeMap<String, Html>,
    ) -> BTreeMap<String, Vec<EventRecord>> {
        let mut out = BTreeMap::new();
        for schema in schemas.iter() {
            let records = match documents.get(&schema.source_id) {
                Some(doc) => self.extract(doc, schema),
                None => {
                    let err = ExtractError::unavailable(&schema.source_id, "extract_all", None);
                    tracing::warn!(error = %err, "no document for source");
                    Vec::new()
                }
            };
            tracing::info!(source = %schema.source_id, records = records.len(), "source extracted");
            out.insert(schema.source_id.clone(), records);
        }
        out
    }

    /// Builds the record of one item; each field is resolved independently.
    fn assemble(&self, item: ElementRef<'_>, schema: &SiteSchema) -> EventRecord {
        let fields = &schema.fields;

        let (title, title_node) = extract_title(item, fields.title.as_ref());
        let url = extract_url(item, fields.url.as_ref(), title_node, &schema.base_url);
        let when = apply_time_field(
            item,
            fields.time.as_ref(),
            extract_datetime(item, fields.date.as_ref(), &schema.source_id),
        );
        let image_url = fields
            .image
            .as_ref()
            .map(|image| resolve_image(item, image, &schema.source_id))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        EventRecord {
            title,
            url,
            date: when.date_text(),
            time: when.time_text(&self.opts.time_unavailable),
            end_time: when.end_time_text(),
            image_url,
            location: extract_location(
                item,
                fields.location.as_ref(),
                &self.opts.location_separator,
            ),
            recurrence: extract_text(item, fields.recurrence.as_ref()),
            category: extract_all_texts(item, fields.category.as_ref()),
            details: extract_details(item, fields.details.as_ref()),
            source_id: schema.source_id.clone(),
        }
    }
}

/// Renders records as pretty or compact JSON, or as a tab-separated table with a header row.
pub fn render(
    records: &[EventRecord],
    format: OutputFormat,
    compact: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json if compact => serde_json::to_string(records),
        OutputFormat::Json => serde_json::to_string_pretty(records),
        OutputFormat::Tsv => {
            let mut out = COLUMNS.join("\t");
            out.push('\n');
            for record in records {
                let row: Vec<String> = record
                    .to_row()
                    .iter()
                    .map(|value| value.replace(['\t', '\n', '\r'], " "))
                    .collect();
                out.push_str(&row.join("\t"));
                out.push('\n');
            }
            Ok(out)
        }
    }
}
