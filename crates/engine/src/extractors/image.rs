// ABOUTME: Image URL resolution for the lazy, srcset, CSS background, and container conventions.
// ABOUTME: Every method yields one URL or the N/A sentinel; "none" never inspects the item.

use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::error::ExtractError;
use crate::extractors::links;
use crate::extractors::schema::{ImageParseMethod, ImageSchema};
use crate::extractors::select::{node_attr, resolve_one, self_or_descendant};
use crate::record::NOT_AVAILABLE;

static BACKGROUND_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)background-image\s*:\s*url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap()
});

/// Why an item produced no image URL.
#[derive(Debug, PartialEq, Eq)]
enum ImageMiss {
    /// The container, image node or attribute is not there.
    Absent,
    /// The attribute is present but its value names no image.
    Undecodable(String),
}

/// Resolves the image URL of `item` according to `schema`.
///
/// A missing node is logged at debug level; an attribute whose value matches
/// no image convention is a parse ambiguity and is logged with its raw value.
pub fn resolve_image(item: ElementRef<'_>, schema: &ImageSchema, source_id: &str) -> String {
    let method = schema.parse_method.as_str();
    match locate_image(item, schema) {
        Ok(url) => match schema.base_url.as_deref() {
            Some(base) => links::resolve(Some(&url), base),
            None => url,
        },
        Err(ImageMiss::Absent) => {
            tracing::debug!(source = source_id, method, "no image found");
            NOT_AVAILABLE.to_string()
        }
        Err(ImageMiss::Undecodable(raw)) => {
            let err = ExtractError::ambiguity(
                source_id,
                "image",
                Some(anyhow!("{} value names no image", method)),
            );
            tracing::warn!(method, raw = %raw, error = %err, "could not decode event image");
            NOT_AVAILABLE.to_string()
        }
    }
}

fn locate_image(item: ElementRef<'_>, schema: &ImageSchema) -> Result<String, ImageMiss> {
    match schema.parse_method {
        ImageParseMethod::Disabled => Err(ImageMiss::Absent),
        ImageParseMethod::LazyAttribute => lazy_source(item, schema).ok_or(ImageMiss::Absent),
        ImageParseMethod::ResponsiveSrcset => decode(
            container_image(item, schema).and_then(|img| node_attr(img, schema.attribute_or_default())),
            |srcset| pick_srcset_candidate(srcset, &schema.target_descriptor),
        ),
        ImageParseMethod::CssBackground => decode(
            container(item, schema).and_then(|node| node_attr(node, schema.attribute_or_default())),
            background_image_url,
        ),
        ImageParseMethod::ContainerAttribute => container_image(item, schema)
            .and_then(|img| node_attr(img, schema.attribute_or_default()))
            .ok_or(ImageMiss::Absent),
    }
}

fn decode(raw: Option<String>, parse: impl FnOnce(&str) -> Option<String>) -> Result<String, ImageMiss> {
    let raw = raw.ok_or(ImageMiss::Absent)?;
    parse(&raw).ok_or(ImageMiss::Undecodable(raw))
}

/// `lazy_attribute`: the deferred attribute wins over the plain source.
fn lazy_source(item: ElementRef<'_>, schema: &ImageSchema) -> Option<String> {
    let node = match &schema.locator {
        Some(locator) => resolve_one(item, locator)?,
        None => self_or_descendant(item, &schema.tag)?,
    };
    node_attr(node, &schema.lazy_attribute).or_else(|| node_attr(node, schema.attribute_or_default()))
}

/// The declared container, or the item itself when none is declared.
fn container<'a>(item: ElementRef<'a>, schema: &ImageSchema) -> Option<ElementRef<'a>> {
    match &schema.container {
        Some(locator) => resolve_one(item, locator),
        None => Some(item),
    }
}

fn container_image<'a>(item: ElementRef<'a>, schema: &ImageSchema) -> Option<ElementRef<'a>> {
    self_or_descendant(container(item, schema)?, &schema.tag)
}

/// Picks the candidate tagged `target` from a srcset list, else the first candidate.
pub fn pick_srcset_candidate(srcset: &str, target: &str) -> Option<String> {
    let candidates: Vec<(&str, Option<&str>)> = srcset
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?;
            Some((url, parts.next()))
        })
        .collect();

    candidates
        .iter()
        .find(|(_, descriptor)| descriptor.is_some_and(|d| d.eq_ignore_ascii_case(target)))
        .or_else(|| candidates.first())
        .map(|(url, _)| url.to_string())
}

/// Extracts the `background-image:url(...)` argument of an inline style.
pub fn background_image_url(style: &str) -> Option<String> {
    BACKGROUND_URL_RE
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}
