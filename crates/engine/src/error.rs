// ABOUTME: Error types for the extraction engine including ErrorCode enum and ExtractError struct.
// ABOUTME: Separates fatal schema errors from the recoverable per-source conditions.

use std::fmt;

/// Error codes representing the categories of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The schema set is invalid. Fatal, raised before any extraction.
    SchemaMalformed,
    /// The fetch collaborator produced no document for the source.
    SourceUnavailable,
    /// The content-list locator matched nothing in the document.
    ContentListMissing,
    /// Date, time or image text matched no strategy in the fallback chain.
    ParseAmbiguity,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::SchemaMalformed => "schema malformed",
            ErrorCode::SourceUnavailable => "source unavailable",
            ErrorCode::ContentListMissing => "content list missing",
            ErrorCode::ParseAmbiguity => "parse ambiguity",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub source_id: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evscrape: {} {}: {}", self.op, self.source_id, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    /// Create a SchemaMalformed error.
    pub fn schema(
        source_id: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::SchemaMalformed,
            source_id: source_id.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a SourceUnavailable error.
    pub fn unavailable(
        source_id: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::SourceUnavailable,
            source_id: source_id.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a ContentListMissing error.
    pub fn content_list_missing(source_id: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ContentListMissing,
            source_id: source_id.into(),
            op: op.into(),
            source: None,
        }
    }

    /// Create a ParseAmbiguity error.
    pub fn ambiguity(
        source_id: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::ParseAmbiguity,
            source_id: source_id.into(),
            op: op.into(),
            source,
        }
    }

    /// Returns true for errors that must stop the run before extraction.
    pub fn is_fatal(&self) -> bool {
        self.code == ErrorCode::SchemaMalformed
    }

    /// Returns true if this is a SchemaMalformed error.
    pub fn is_schema(&self) -> bool {
        self.code == ErrorCode::SchemaMalformed
    }

    /// Returns true if this is a SourceUnavailable error.
    pub fn is_unavailable(&self) -> bool {
        self.code == ErrorCode::SourceUnavailable
    }

    /// Returns true if this is a ContentListMissing error.
    pub fn is_content_list_missing(&self) -> bool {
        self.code == ErrorCode::ContentListMissing
    }

    /// Returns true if this is a ParseAmbiguity error.
    pub fn is_ambiguity(&self) -> bool {
        self.code == ErrorCode::ParseAmbiguity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_source_and_code() {
        let err = ExtractError::content_list_missing("chatt-library", "extract");
        assert_eq!(
            err.to_string(),
            "evscrape: extract chatt-library: content list missing"
        );
    }

    #[test]
    fn display_appends_underlying_cause() {
        let err = ExtractError::schema(
            "pulse",
            "load",
            Some(anyhow::anyhow!("unknown field kind `price`")),
        );
        assert_eq!(
            err.to_string(),
            "evscrape: load pulse: schema malformed: unknown field kind `price`"
        );
    }

    #[test]
    fn only_schema_errors_are_fatal() {
        assert!(ExtractError::schema("a", "load", None).is_fatal());
        assert!(!ExtractError::unavailable("a", "fetch", None).is_fatal());
        assert!(!ExtractError::content_list_missing("a", "extract").is_fatal());
        assert!(!ExtractError::ambiguity("a", "date", None).is_fatal());
    }

    #[test]
    fn predicates_match_codes() {
        assert!(ExtractError::unavailable("a", "fetch", None).is_unavailable());
        assert!(ExtractError::ambiguity("a", "date", None).is_ambiguity());
        assert!(ExtractError::content_list_missing("a", "x").is_content_list_missing());
        assert!(ExtractError::schema("a", "load", None).is_schema());
    }
}
