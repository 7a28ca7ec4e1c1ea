// ABOUTME: Locator compilation into CSS selector chains plus a process-wide selector cache.
// ABOUTME: Each locator becomes an ordered list of candidate selectors (id, class, bare tag).

//! Selector compilation and caching.
//!
//! A [`Locator`] is lowered to one or more CSS selector strings, ordered from
//! most to least specific. Parsed selectors are cached so repeated item
//! lookups do not re-parse the same selector text.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

use crate::extractors::schema::{AttrMatch, AttrPredicate, Locator};

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for selector text that does not parse; invalid text is
/// cached too. A poisoned lock degrades to an uncached parse.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    if let Ok(cache) = SELECTOR_CACHE.read() {
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    if let Ok(mut cache) = SELECTOR_CACHE.write() {
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
        cache.insert(css.to_string(), compiled.clone());
    }
    compiled
}

/// Compiles every candidate of every locator, returning the first selector
/// text that fails to parse.
pub fn precompile_locators<'a, I>(locators: I) -> Result<(), String>
where
    I: IntoIterator<Item = &'a Locator>,
{
    for locator in locators {
        for css in candidate_selectors(locator) {
            if get_or_compile(&css).is_none() {
                return Err(css);
            }
        }
    }
    Ok(())
}

/// Lowers a locator to its fallback chain of CSS selectors.
///
/// Order: all predicates, then id-based (class dropped), then class-based
/// (id dropped), then the bare tag when `fallback_to_tag` is set. Duplicates
/// are removed while keeping the first position.
pub fn candidate_selectors(locator: &Locator) -> Vec<String> {
    let tag = match locator.tag.trim() {
        "" => "*",
        t => t,
    };

    let mut chain = vec![build_selector(tag, locator, |_| true)];

    let has_id = locator.attrs.contains_key("id");
    let has_class = locator.attrs.contains_key("class");
    if has_id && has_class {
        chain.push(build_selector(tag, locator, |name| name != "class"));
        chain.push(build_selector(tag, locator, |name| name != "id"));
    }
    if locator.fallback_to_tag {
        chain.push(tag.to_string());
    }

    let mut seen = Vec::with_capacity(chain.len());
    for css in chain {
        if !seen.contains(&css) {
            seen.push(css);
        }
    }
    seen
}

fn build_selector(tag: &str, locator: &Locator, keep: impl Fn(&str) -> bool) -> String {
    let mut css = tag.to_string();
    for (name, predicate) in &locator.attrs {
        if !keep(name) {
            continue;
        }
        css.push_str(&predicate_css(name, predicate));
    }
    css
}

fn predicate_css(name: &str, predicate: &AttrPredicate) -> String {
    match predicate {
        AttrPredicate::Present(true) => format!("[{}]", name),
        AttrPredicate::Present(false) => format!(":not([{}])", name),
        AttrPredicate::Equals(value) if name == "class" => {
            let classes: Vec<&str> = value.split_whitespace().collect();
            if classes.is_empty() {
                "[class=\"\"]".to_string()
            } else {
                classes
                    .iter()
                    .map(|c| format!("[class~=\"{}\"]", escape(c)))
                    .collect()
            }
        }
        AttrPredicate::Equals(value) => format!("[{}=\"{}\"]", name, escape(value)),
        AttrPredicate::Match(AttrMatch::StartsWith(v)) => format!("[{}^=\"{}\"]", name, escape(v)),
        AttrPredicate::Match(AttrMatch::EndsWith(v)) => format!("[{}$=\"{}\"]", name, escape(v)),
        AttrPredicate::Match(AttrMatch::Contains(v)) => format!("[{}*=\"{}\"]", name, escape(v)),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
