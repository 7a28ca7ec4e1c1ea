// ABOUTME: Extraction options and the EngineBuilder fluent API.
// ABOUTME: Options are caller-supplied values; nothing here is process-wide state.

use std::fmt;

use crate::engine::Engine;
use crate::record::TIME_UNAVAILABLE;

/// Output format of the CLI and of [`crate::engine::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Tsv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Json => "json",
            OutputFormat::Tsv => "tsv",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tsv" | "table" => OutputFormat::Tsv,
            _ => OutputFormat::Json,
        }
    }
}

/// Configuration options for the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Time text emitted when a date carried no explicit clock time.
    pub time_unavailable: String,
    /// Separator between multi-node location parts.
    pub location_separator: String,
    /// Maximum items extracted per source; `None` keeps all.
    pub max_items_per_source: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            time_unavailable: TIME_UNAVAILABLE.to_string(),
            location_separator: " | ".to_string(),
            max_items_per_source: None,
        }
    }
}

/// Builder for constructing Engine instances with custom configuration.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    opts: Options,
}

impl EngineBuilder {
    /// Create a new EngineBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the label used when no time was given.
    pub fn time_unavailable(mut self, label: impl Into<String>) -> Self {
        self.opts.time_unavailable = label.into();
        self
    }

    /// Set the location part separator.
    pub fn location_separator(mut self, separator: impl Into<String>) -> Self {
        self.opts.location_separator = separator.into();
        self
    }

    /// Cap the number of items extracted per source.
    pub fn max_items_per_source(mut self, max: usize) -> Self {
        self.opts.max_items_per_source = Some(max);
        self
    }

    /// Build the Engine with the configured options.
    pub fn build(self) -> Engine {
        Engine::new(self.opts)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_record_sentinels() {
        let opts = Options::default();
        assert_eq!(opts.time_unavailable, "Open link for time");
        assert_eq!(opts.location_separator, " | ");
        assert_eq!(opts.max_items_per_source, None);
    }

    #[test]
    fn builder_overrides_options() {
        let engine = EngineBuilder::new()
            .time_unavailable("See website")
            .location_separator(" / ")
            .max_items_per_source(5)
            .build();
        let opts = engine.options();
        assert_eq!(opts.time_unavailable, "See website");
        assert_eq!(opts.location_separator, " / ");
        assert_eq!(opts.max_items_per_source, Some(5));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from("TSV"), OutputFormat::Tsv);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Json);
        assert_eq!(OutputFormat::Tsv.to_string(), "tsv");
    }
}
