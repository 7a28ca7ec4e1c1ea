// ABOUTME: Per-field extraction strategies run against one item node.
// ABOUTME: Strategies are total: a missing locator or node yields the N/A sentinel, never an error.

//! Field extraction strategies.
//!
//! Key behaviors:
//! - Every strategy takes the item node and the field's schema (if declared)
//!   and returns an owned value; node references never escape.
//! - Title also returns the resolved title node, consumed by the
//!   `from_title_anchor` URL strategy.
//! - Date decoding failures are logged with the raw text and degrade to the
//!   sentinel pair.

use scraper::ElementRef;

use crate::error::ExtractError;
use crate::extractors::datetime::{self, find_clock_span, NormalizedDateTime, TimeSlot};
use crate::extractors::links;
use crate::extractors::schema::{
    DateParseMethod, DateSchema, LocationSchema, TextSchema, UrlParseMethod, UrlSchema,
};
use crate::extractors::select::{
    effective_locator, node_attr, node_text, resolve_all, resolve_one, self_or_descendant,
};
use crate::record::NOT_AVAILABLE;

fn sentinel() -> String {
    NOT_AVAILABLE.to_string()
}

/// First node matching a text schema's locator under the item.
fn first_node<'a>(item: ElementRef<'a>, schema: Option<&TextSchema>) -> Option<ElementRef<'a>> {
    let schema = schema?;
    let locator = effective_locator(schema.locator.as_ref()?, schema.extract_method);
    resolve_one(item, &locator)
}

/// Title text plus the title node.
///
/// The text comes from the node's anchor when the node is not an anchor
/// itself but wraps one.
pub fn extract_title<'a>(
    item: ElementRef<'a>,
    schema: Option<&TextSchema>,
) -> (String, Option<ElementRef<'a>>) {
    let Some(node) = first_node(item, schema) else {
        return (sentinel(), None);
    };
    let text = self_or_descendant(node, "a")
        .and_then(node_text)
        .or_else(|| node_text(node))
        .unwrap_or_else(sentinel);
    (text, Some(node))
}

/// Event link, resolved against the schema's base URL override or `site_base`.
pub fn extract_url<'a>(
    item: ElementRef<'a>,
    schema: Option<&UrlSchema>,
    title_node: Option<ElementRef<'a>>,
    site_base: &str,
) -> String {
    let Some(schema) = schema else {
        return sentinel();
    };
    let base = schema.base_url.as_deref().unwrap_or(site_base);
    let locate = || {
        let locator = effective_locator(schema.locator.as_ref()?, schema.extract_method);
        resolve_one(item, &locator)
    };

    let href = match schema.parse_method {
        UrlParseMethod::FromTitleAnchor => title_node
            .or_else(locate)
            .and_then(|node| node_attr(node, "href").or_else(|| anchor_href(node))),
        UrlParseMethod::FromExplicitTag => locate().and_then(|node| node_attr(node, "href")),
    };
    links::resolve(href.as_deref(), base)
}

fn anchor_href(node: ElementRef<'_>) -> Option<String> {
    self_or_descendant(node, "a").and_then(|a| node_attr(a, "href"))
}

/// Decodes the event date and start time.
///
/// `item_attribute` reads the ISO value on the item node first and decodes
/// the located node's text only when that attribute is missing or unusable.
pub fn extract_datetime(
    item: ElementRef<'_>,
    schema: Option<&DateSchema>,
    source_id: &str,
) -> NormalizedDateTime {
    let Some(schema) = schema else {
        return NormalizedDateTime::unresolved();
    };

    if schema.parse_method == DateParseMethod::ItemAttribute {
        if let Some(value) = node_attr(item, &schema.attribute) {
            match datetime::parse_iso(&value) {
                Ok(parsed) => return parsed,
                Err(err) => tracing::debug!(
                    source = source_id,
                    attribute = %schema.attribute,
                    error = %err,
                    "item date attribute unusable"
                ),
            }
        }
    }

    let Some(locator) = schema.locator.as_ref() else {
        return NormalizedDateTime::unresolved();
    };
    let Some(text) = resolve_one(item, &effective_locator(locator, schema.extract_method))
        .and_then(node_text)
    else {
        tracing::debug!(source = source_id, "date node missing");
        return NormalizedDateTime::unresolved();
    };

    match datetime::normalize(&text, schema) {
        Ok(parsed) => parsed,
        Err(err) => {
            let err = ExtractError::ambiguity(source_id, "date", Some(err.into()));
            tracing::warn!(
                method = schema.parse_method.as_str(),
                raw = %text,
                error = %err,
                "could not decode event date"
            );
            NormalizedDateTime::unresolved()
        }
    }
}

/// Fills in the start time from a declared `time` field when the date text gave none.
pub fn apply_time_field(
    item: ElementRef<'_>,
    schema: Option<&TextSchema>,
    parsed: NormalizedDateTime,
) -> NormalizedDateTime {
    if matches!(parsed.start, TimeSlot::At(_)) {
        return parsed;
    }
    let span = first_node(item, schema)
        .and_then(node_text)
        .and_then(|text| find_clock_span(&text));
    match span {
        Some(span) => NormalizedDateTime {
            date: parsed.date,
            start: TimeSlot::At(span.start),
            end: span.end,
        },
        None => parsed,
    }
}

/// Joins the trimmed texts of every location node, optionally under a parent scope.
pub fn extract_location(
    item: ElementRef<'_>,
    schema: Option<&LocationSchema>,
    separator: &str,
) -> String {
    let Some(schema) = schema else {
        return sentinel();
    };
    let Some(locator) = schema.locator.as_ref() else {
        return sentinel();
    };
    let scope = match &schema.parent {
        Some(parent) => match resolve_one(item, parent) {
            Some(scope) => scope,
            None => return sentinel(),
        },
        None => item,
    };

    let parts: Vec<String> = resolve_all(scope, &effective_locator(locator, schema.extract_method))
        .into_iter()
        .filter_map(node_text)
        .collect();
    if parts.is_empty() {
        sentinel()
    } else {
        parts.join(separator)
    }
}

/// Text of the first matching node.
pub fn extract_text(item: ElementRef<'_>, schema: Option<&TextSchema>) -> String {
    first_node(item, schema)
        .and_then(node_text)
        .unwrap_or_else(sentinel)
}

/// Texts of every matching node, in document order.
pub fn extract_all_texts(item: ElementRef<'_>, schema: Option<&TextSchema>) -> Vec<String> {
    let texts: Vec<String> = schema
        .and_then(|s| {
            let locator = effective_locator(s.locator.as_ref()?, s.extract_method);
            Some(resolve_all(item, &locator))
        })
        .unwrap_or_default()
        .into_iter()
        .filter_map(node_text)
        .collect();
    if texts.is_empty() {
        vec![sentinel()]
    } else {
        texts
    }
}

/// Text fragments of the first matching node, each trimmed, joined with one space.
pub fn extract_details(item: ElementRef<'_>, schema: Option<&TextSchema>) -> String {
    let Some(node) = first_node(item, schema) else {
        return sentinel();
    };
    let text = node
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        sentinel()
    } else {
        text
    }
}
