// ABOUTME: Field-kind registry: the closed set of field kinds and their parse methods.
// ABOUTME: Validates raw site schemas into typed SiteSchemas, failing fast on anything unknown.

//! Field strategy registry and schema validation.
//!
//! Url, date and image fields pick one of several parse methods; the other
//! kinds have a single strategy. A raw schema is accepted
//! only when every field name is a known kind, every field body deserializes
//! into that kind's typed schema, and every locator lowers to valid CSS.

use std::fmt;

use anyhow::anyhow;
use serde_json::Value;

use crate::error::ExtractError;
use crate::extractors::compiled::precompile_locators;
use crate::extractors::schema::{FieldSchema, FieldSchemas, RawSiteSchema, SiteSchema};

/// The semantic fields of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Title,
    Url,
    Date,
    Time,
    Image,
    Location,
    Recurrence,
    Category,
    Details,
}

impl FieldKind {
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Title,
        FieldKind::Url,
        FieldKind::Date,
        FieldKind::Time,
        FieldKind::Image,
        FieldKind::Location,
        FieldKind::Recurrence,
        FieldKind::Category,
        FieldKind::Details,
    ];

    /// Name used as the key in schema JSON.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Url => "url",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Image => "image",
            FieldKind::Location => "location",
            FieldKind::Recurrence => "recurrence",
            FieldKind::Category => "category",
            FieldKind::Details => "details",
        }
    }

    pub fn from_name(name: &str) -> Option<FieldKind> {
        FieldKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FieldSchema {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSchema::Title(_) => FieldKind::Title,
            FieldSchema::Url(_) => FieldKind::Url,
            FieldSchema::Date(_) => FieldKind::Date,
            FieldSchema::Time(_) => FieldKind::Time,
            FieldSchema::Image(_) => FieldKind::Image,
            FieldSchema::Location(_) => FieldKind::Location,
            FieldSchema::Recurrence(_) => FieldKind::Recurrence,
            FieldSchema::Category(_) => FieldKind::Category,
            FieldSchema::Details(_) => FieldKind::Details,
        }
    }

    /// The (field kind, parse method) key of the strategy. Kinds with a
    /// single strategy have no parse method.
    pub fn strategy_key(&self) -> (FieldKind, Option<&'static str>) {
        let method = match self {
            FieldSchema::Url(s) => Some(s.parse_method.as_str()),
            FieldSchema::Date(s) => Some(s.parse_method.as_str()),
            FieldSchema::Image(s) => Some(s.parse_method.as_str()),
            _ => None,
        };
        (self.kind(), method)
    }
}

/// Deserializes one field body. `null` and `{}` declare the field absent.
pub fn parse_field(kind: FieldKind, body: Value) -> Result<Option<FieldSchema>, serde_json::Error> {
    let declared_absent = match &body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if declared_absent {
        return Ok(None);
    }

    let schema = match kind {
        FieldKind::Title => FieldSchema::Title(serde_json::from_value(body)?),
        FieldKind::Url => FieldSchema::Url(serde_json::from_value(body)?),
        FieldKind::Date => FieldSchema::Date(serde_json::from_value(body)?),
        FieldKind::Time => FieldSchema::Time(serde_json::from_value(body)?),
        FieldKind::Image => FieldSchema::Image(serde_json::from_value(body)?),
        FieldKind::Location => FieldSchema::Location(serde_json::from_value(body)?),
        FieldKind::Recurrence => FieldSchema::Recurrence(serde_json::from_value(body)?),
        FieldKind::Category => FieldSchema::Category(serde_json::from_value(body)?),
        FieldKind::Details => FieldSchema::Details(serde_json::from_value(body)?),
    };
    Ok(Some(schema))
}

/// Validates a raw schema into a [`SiteSchema`].
///
/// Fails with [`ErrorCode::SchemaMalformed`](crate::error::ErrorCode) on an
/// unknown field kind, a field body that does not fit its kind, or a locator
/// that does not lower to a valid selector.
pub fn validate(source_id: &str, raw: RawSiteSchema) -> Result<SiteSchema, ExtractError> {
    let mut fields = FieldSchemas::default();
    for (name, body) in raw.fields {
        let kind = FieldKind::from_name(&name).ok_or_else(|| {
            ExtractError::schema(
                source_id,
                "validate",
                Some(anyhow!(
                    "unknown field kind {:?} (expected one of: {})",
                    name,
                    FieldKind::ALL.map(|k| k.name()).join(", ")
                )),
            )
        })?;
        let parsed = parse_field(kind, body).map_err(|err| {
            ExtractError::schema(
                source_id,
                "validate",
                Some(anyhow!("field {:?}: {}", name, err)),
            )
        })?;
        if let Some(field) = parsed {
            tracing::trace!(source = source_id, strategy = ?field.strategy_key(), "field registered");
            fields.insert(field);
        }
    }

    let schema = SiteSchema {
        source_id: source_id.to_string(),
        base_url: raw.base_url,
        page_url: raw.page_url,
        content_list: raw.content_list,
        item: raw.item,
        fields,
    };

    let locators = [&schema.content_list, &schema.item]
        .into_iter()
        .chain(schema.fields.locators());
    precompile_locators(locators).map_err(|css| {
        ExtractError::schema(
            source_id,
            "validate",
            Some(anyhow!("invalid selector {:?}", css)),
        )
    })?;

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::schema::{DateParseMethod, ImageParseMethod};
    use serde_json::json;

    fn raw(fields: Value) -> RawSiteSchema {
        serde_json::from_value(json!({
            "base_url": "https://www.cha.guide",
            "content_list": {"tag": "div", "attrs": {"class": "flex-table w-dyn-items"}},
            "item": {"tag": "div", "attrs": {"role": "listitem"}},
            "fields": fields
        }))
        .expect("raw schema")
    }

    #[test]
    fn field_names_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FieldKind::from_name("price"), None);
    }

    #[test]
    fn empty_bodies_declare_absence() {
        assert!(parse_field(FieldKind::Details, json!({})).unwrap().is_none());
        assert!(parse_field(FieldKind::Recurrence, Value::Null).unwrap().is_none());
    }

    #[test]
    fn validate_builds_typed_fields() {
        let schema = validate(
            "cha-guide",
            raw(json!({
                "title": {"locator": {"tag": "h3", "attrs": {"class": "event-title"}}},
                "date": {
                    "locator": {"tag": "div", "attrs": {"class": "smaller-text"}},
                    "parse_method": "time_range_with_fallback"
                },
                "image": {
                    "parse_method": "css_background",
                    "container": {"tag": "div", "attrs": {"class": "event-image---horizontal"}}
                },
                "details": {}
            })),
        )
        .expect("valid schema");

        assert_eq!(schema.source_id, "cha-guide");
        assert!(schema.fields.title.is_some());
        assert!(schema.fields.details.is_none());
        let date = schema.fields.date.as_ref().expect("date");
        assert_eq!(date.parse_method, DateParseMethod::TimeRangeWithFallback);
        let image = schema.fields.image.as_ref().expect("image");
        assert_eq!(image.parse_method, ImageParseMethod::CssBackground);
    }

    #[test]
    fn unknown_field_kind_is_fatal() {
        let err = validate("cha-guide", raw(json!({"price": {"locator": {"tag": "span"}}})))
            .unwrap_err();
        assert!(err.is_schema());
        assert!(err.is_fatal());
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn unknown_parse_method_is_fatal() {
        let err = validate(
            "cha-guide",
            raw(json!({"date": {"locator": {"tag": "p"}, "parse_method": "parser.parse"}})),
        )
        .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn unknown_field_key_is_fatal() {
        let err = validate(
            "cha-guide",
            raw(json!({"title": {"locator": {"tag": "h3"}, "selector": "h3.title"}})),
        )
        .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn invalid_locator_is_fatal() {
        let err = validate(
            "cha-guide",
            raw(json!({"title": {"locator": {"tag": "h3["}}})),
        )
        .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("invalid selector"));
    }

    #[test]
    fn strategy_keys_follow_parse_method() {
        let title = parse_field(FieldKind::Title, json!({"locator": {"tag": "h3"}}))
            .unwrap()
            .unwrap();
        assert_eq!(title.strategy_key(), (FieldKind::Title, None));

        let image = parse_field(FieldKind::Image, json!({"parse_method": "none"}))
            .unwrap()
            .unwrap();
        assert_eq!(image.strategy_key(), (FieldKind::Image, Some("none")));
    }
}
