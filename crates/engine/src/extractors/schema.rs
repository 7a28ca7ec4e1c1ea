// ABOUTME: Per-source schema data models: locators, typed field schemas, and the schema set.
// ABOUTME: Field schemas are closed variants per field kind, validated once when a set is loaded.

//! Site schema definitions for source-specific event extraction.
//!
//! A [`SiteSchema`] describes where the event list lives on one source and how
//! each field of an event is located and decoded. Schemas are plain data: they
//! are deserialized from JSON, validated by the registry, and never mutated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute predicate of a [`Locator`].
///
/// JSON forms: `"value"` (exact; for `class`, every listed class must be
/// present), `true` / `false` (attribute present / absent), or an operator
/// object such as `{"starts_with": "https://"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrPredicate {
    Present(bool),
    Equals(String),
    Match(AttrMatch),
}

/// Substring operators for attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum AttrMatch {
    StartsWith(String),
    EndsWith(String),
    Contains(String),
}

/// A tag name plus attribute predicates identifying candidate nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Locator {
    /// Tag name; empty or `*` matches any element.
    pub tag: String,
    /// Attribute predicates; empty matches by tag alone.
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrPredicate>,
    /// Append the bare tag as the last step of the fallback chain.
    #[serde(default)]
    pub fallback_to_tag: bool,
}

impl Locator {
    /// Creates a locator matching `tag` with no predicates.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Adds an exact-value predicate.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs
            .insert(name.into(), AttrPredicate::Equals(value.into()));
        self
    }

    /// Adds an arbitrary predicate.
    pub fn with(mut self, name: impl Into<String>, predicate: AttrPredicate) -> Self {
        self.attrs.insert(name.into(), predicate);
        self
    }

    /// Returns true if the locator carries no attribute predicate.
    pub fn is_bare(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The same tag with every predicate dropped.
    pub fn tag_only(&self) -> Locator {
        Locator::tag(self.tag.clone())
    }
}

/// How the locator of a field is applied to the item node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMethod {
    /// Match tag and attribute predicates.
    #[default]
    ByAttributes,
    /// Match the tag alone, ignoring declared predicates.
    ByTagOnly,
}

/// Locator for plain text fields: title, time, recurrence, category, details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TextSchema {
    #[serde(default)]
    pub locator: Option<Locator>,
    #[serde(default)]
    pub extract_method: ExtractMethod,
}

/// Date/time decoding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateParseMethod {
    DirectFuzzyParse,
    SplitOnDelimiter,
    SplitOnAtSymbol,
    TimeRangeWithFallback,
    ItemAttribute,
}

impl DateParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateParseMethod::DirectFuzzyParse => "direct_fuzzy_parse",
            DateParseMethod::SplitOnDelimiter => "split_on_delimiter",
            DateParseMethod::SplitOnAtSymbol => "split_on_at_symbol",
            DateParseMethod::TimeRangeWithFallback => "time_range_with_fallback",
            DateParseMethod::ItemAttribute => "item_attribute",
        }
    }
}

/// Where the event date lives and how its text is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateSchema {
    #[serde(default)]
    pub locator: Option<Locator>,
    #[serde(default)]
    pub extract_method: ExtractMethod,
    pub parse_method: DateParseMethod,
    /// Start of the clock slice after the comma (`split_on_delimiter`).
    #[serde(default = "default_time_offset")]
    pub time_offset: usize,
    /// Width of the clock slice (`split_on_delimiter`).
    #[serde(default = "default_time_width")]
    pub time_width: usize,
    /// Item attribute carrying an ISO date (`item_attribute`).
    #[serde(default = "default_date_attribute")]
    pub attribute: String,
}

fn default_time_offset() -> usize {
    6
}

fn default_time_width() -> usize {
    8
}

fn default_date_attribute() -> String {
    "data-date".to_string()
}

impl DateSchema {
    pub fn new(locator: Option<Locator>, parse_method: DateParseMethod) -> Self {
        Self {
            locator,
            extract_method: ExtractMethod::default(),
            parse_method,
            time_offset: default_time_offset(),
            time_width: default_time_width(),
            attribute: default_date_attribute(),
        }
    }
}

/// Image embedding conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageParseMethod {
    LazyAttribute,
    ResponsiveSrcset,
    CssBackground,
    ContainerAttribute,
    /// Declared absence; the item is never inspected.
    #[serde(rename = "none")]
    Disabled,
}

impl ImageParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageParseMethod::LazyAttribute => "lazy_attribute",
            ImageParseMethod::ResponsiveSrcset => "responsive_srcset",
            ImageParseMethod::CssBackground => "css_background",
            ImageParseMethod::ContainerAttribute => "container_attribute",
            ImageParseMethod::Disabled => "none",
        }
    }
}

/// Where the event image lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSchema {
    pub parse_method: ImageParseMethod,
    /// Image node locator (`lazy_attribute`).
    #[serde(default)]
    pub locator: Option<Locator>,
    /// Container locator (`responsive_srcset`, `css_background`, `container_attribute`).
    #[serde(default)]
    pub container: Option<Locator>,
    /// Tag of the image nested in the container.
    #[serde(default = "default_image_tag")]
    pub tag: String,
    /// Attribute read from the image node.
    #[serde(default)]
    pub attribute: Option<String>,
    /// Deferred-source attribute preferred by `lazy_attribute`.
    #[serde(default = "default_lazy_attribute")]
    pub lazy_attribute: String,
    /// Width descriptor selected from a srcset.
    #[serde(default = "default_target_descriptor")]
    pub target_descriptor: String,
    /// Resolve relative image URLs against this base.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_image_tag() -> String {
    "img".to_string()
}

fn default_lazy_attribute() -> String {
    "data-lazy-src".to_string()
}

fn default_target_descriptor() -> String {
    "220w".to_string()
}

impl ImageSchema {
    pub fn new(parse_method: ImageParseMethod) -> Self {
        Self {
            parse_method,
            locator: None,
            container: None,
            tag: default_image_tag(),
            attribute: None,
            lazy_attribute: default_lazy_attribute(),
            target_descriptor: default_target_descriptor(),
            base_url: None,
        }
    }

    /// Attribute to read, falling back to the conventional one for the method.
    pub fn attribute_or_default(&self) -> &str {
        match (&self.attribute, self.parse_method) {
            (Some(attr), _) => attr,
            (None, ImageParseMethod::ResponsiveSrcset) => "srcset",
            (None, ImageParseMethod::CssBackground) => "style",
            (None, _) => "src",
        }
    }
}

/// Event link strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlParseMethod {
    FromTitleAnchor,
    FromExplicitTag,
}

impl UrlParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlParseMethod::FromTitleAnchor => "from_title_anchor",
            UrlParseMethod::FromExplicitTag => "from_explicit_tag",
        }
    }
}

/// Where the event link lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlSchema {
    pub parse_method: UrlParseMethod,
    #[serde(default)]
    pub locator: Option<Locator>,
    #[serde(default)]
    pub extract_method: ExtractMethod,
    /// Overrides the site base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Location nodes, optionally scoped under a parent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LocationSchema {
    #[serde(default)]
    pub locator: Option<Locator>,
    #[serde(default)]
    pub extract_method: ExtractMethod,
    #[serde(default)]
    pub parent: Option<Locator>,
}

/// One validated field schema, tagged by field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSchema {
    Title(TextSchema),
    Url(UrlSchema),
    Date(DateSchema),
    Time(TextSchema),
    Image(ImageSchema),
    Location(LocationSchema),
    Recurrence(TextSchema),
    Category(TextSchema),
    Details(TextSchema),
}

/// The declared fields of a site; `None` means "not declared".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSchemas {
    pub title: Option<TextSchema>,
    pub url: Option<UrlSchema>,
    pub date: Option<DateSchema>,
    pub time: Option<TextSchema>,
    pub image: Option<ImageSchema>,
    pub location: Option<LocationSchema>,
    pub recurrence: Option<TextSchema>,
    pub category: Option<TextSchema>,
    pub details: Option<TextSchema>,
}

impl FieldSchemas {
    /// Stores a field schema in its slot, replacing any previous one.
    pub fn insert(&mut self, field: FieldSchema) {
        match field {
            FieldSchema::Title(s) => self.title = Some(s),
            FieldSchema::Url(s) => self.url = Some(s),
            FieldSchema::Date(s) => self.date = Some(s),
            FieldSchema::Time(s) => self.time = Some(s),
            FieldSchema::Image(s) => self.image = Some(s),
            FieldSchema::Location(s) => self.location = Some(s),
            FieldSchema::Recurrence(s) => self.recurrence = Some(s),
            FieldSchema::Category(s) => self.category = Some(s),
            FieldSchema::Details(s) => self.details = Some(s),
        }
    }

    /// Every locator declared by the fields, for selector precompilation.
    pub fn locators(&self) -> Vec<&Locator> {
        let mut out = Vec::new();
        let text = [
            &self.title,
            &self.time,
            &self.recurrence,
            &self.category,
            &self.details,
        ];
        for schema in text.into_iter().flatten() {
            out.extend(schema.locator.as_ref());
        }
        if let Some(s) = &self.url {
            out.extend(s.locator.as_ref());
        }
        if let Some(s) = &self.date {
            out.extend(s.locator.as_ref());
        }
        if let Some(s) = &self.image {
            out.extend(s.locator.as_ref());
            out.extend(s.container.as_ref());
        }
        if let Some(s) = &self.location {
            out.extend(s.locator.as_ref());
            out.extend(s.parent.as_ref());
        }
        out
    }
}

/// Raw, unvalidated form of a site schema as written in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSiteSchema {
    pub base_url: String,
    #[serde(default)]
    pub page_url: Option<String>,
    pub content_list: Locator,
    pub item: Locator,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// A validated, immutable per-source schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSchema {
    pub source_id: String,
    pub base_url: String,
    pub page_url: Option<String>,
    pub content_list: Locator,
    pub item: Locator,
    pub fields: FieldSchemas,
}

/// Validated schemas keyed by source id.
#[derive(Debug, Default, Clone)]
pub struct SchemaSet {
    map: BTreeMap<String, SiteSchema>,
}

impl SchemaSet {
    /// Creates a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its source id, returning any schema it replaced.
    pub fn register(&mut self, schema: SiteSchema) -> Option<SiteSchema> {
        self.map.insert(schema.source_id.clone(), schema)
    }

    /// Looks up a schema by source id.
    pub fn get(&self, source_id: &str) -> Option<&SiteSchema> {
        self.map.get(source_id)
    }

    /// Iterates schemas in source-id order.
    pub fn iter(&self) -> impl Iterator<Item = &SiteSchema> {
        self.map.values()
    }

    /// Keeps only the listed source ids.
    pub fn retain_sources(&mut self, keep: &[String]) {
        self.map.retain(|id, _| keep.iter().any(|k| k == id));
    }

    /// Returns the number of registered sources.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_deserializes_all_predicate_forms() {
        let json = r#"{
            "tag": "a",
            "attrs": {
                "class": "title truncate",
                "href": {"starts_with": "https://example.com/locations/"},
                "data-hidden": false,
                "role": true
            }
        }"#;
        let loc: Locator = serde_json::from_str(json).expect("deserialize");
        assert_eq!(loc.tag, "a");
        assert_eq!(
            loc.attrs.get("class"),
            Some(&AttrPredicate::Equals("title truncate".to_string()))
        );
        assert_eq!(
            loc.attrs.get("href"),
            Some(&AttrPredicate::Match(AttrMatch::StartsWith(
                "https://example.com/locations/".to_string()
            )))
        );
        assert_eq!(loc.attrs.get("data-hidden"), Some(&AttrPredicate::Present(false)));
        assert_eq!(loc.attrs.get("role"), Some(&AttrPredicate::Present(true)));
        assert!(!loc.fallback_to_tag);
    }

    #[test]
    fn locator_rejects_unknown_keys() {
        let json = r#"{"tag": "div", "atrs": {"class": "x"}}"#;
        assert!(serde_json::from_str::<Locator>(json).is_err());
    }

    #[test]
    fn date_schema_fills_defaults() {
        let json = r#"{"locator": {"tag": "p"}, "parse_method": "split_on_delimiter"}"#;
        let schema: DateSchema = serde_json::from_str(json).expect("deserialize");
        assert_eq!(schema.parse_method, DateParseMethod::SplitOnDelimiter);
        assert_eq!(schema.time_offset, 6);
        assert_eq!(schema.time_width, 8);
        assert_eq!(schema.attribute, "data-date");
        assert_eq!(schema.extract_method, ExtractMethod::ByAttributes);
    }

    #[test]
    fn date_schema_requires_parse_method() {
        let json = r#"{"locator": {"tag": "p"}}"#;
        assert!(serde_json::from_str::<DateSchema>(json).is_err());
    }

    #[test]
    fn image_none_method_maps_to_disabled() {
        let schema: ImageSchema =
            serde_json::from_str(r#"{"parse_method": "none"}"#).expect("deserialize");
        assert_eq!(schema.parse_method, ImageParseMethod::Disabled);
        assert_eq!(schema.parse_method.as_str(), "none");
    }

    #[test]
    fn image_attribute_defaults_follow_method() {
        let mut schema = ImageSchema::new(ImageParseMethod::ResponsiveSrcset);
        assert_eq!(schema.attribute_or_default(), "srcset");
        schema.parse_method = ImageParseMethod::ContainerAttribute;
        assert_eq!(schema.attribute_or_default(), "src");
        schema.attribute = Some("data-src".to_string());
        assert_eq!(schema.attribute_or_default(), "data-src");
    }

    #[test]
    fn field_schemas_insert_and_collect_locators() {
        let mut fields = FieldSchemas::default();
        fields.insert(FieldSchema::Title(TextSchema {
            locator: Some(Locator::tag("h3").attr("class", "event-title")),
            ..Default::default()
        }));
        fields.insert(FieldSchema::Location(LocationSchema {
            locator: Some(Locator::tag("span")),
            parent: Some(Locator::tag("div").attr("class", "cityVenue")),
            ..Default::default()
        }));
        fields.insert(FieldSchema::Category(TextSchema::default()));

        assert!(fields.title.is_some());
        assert!(fields.category.is_some());
        assert_eq!(fields.locators().len(), 3);
    }

    #[test]
    fn schema_set_register_and_filter() {
        let schema = |id: &str| SiteSchema {
            source_id: id.to_string(),
            base_url: String::new(),
            page_url: None,
            content_list: Locator::tag("div"),
            item: Locator::tag("article"),
            fields: FieldSchemas::default(),
        };
        let mut set = SchemaSet::new();
        assert!(set.is_empty());
        assert!(set.register(schema("a")).is_none());
        assert!(set.register(schema("b")).is_none());
        assert!(set.register(schema("a")).is_some());
        assert_eq!(set.len(), 2);

        set.retain_sources(&["b".to_string()]);
        assert_eq!(set.len(), 1);
        assert!(set.get("b").is_some());
        assert!(set.get("a").is_none());
    }
}
