// ABOUTME: Selector resolution of locators against document and item nodes.
// ABOUTME: Walks a locator's fallback chain; the first candidate selector with matches wins.

//! Locator resolution utilities.
//!
//! Key behaviors:
//! - Candidates from [`candidate_selectors`] are tried in order; the first
//!   candidate yielding at least one node wins.
//! - Only descendants of the scope are matched, never the scope itself.
//! - Text helpers normalize whitespace and treat empty strings as no match.

use scraper::{ElementRef, Html};

use crate::extractors::compiled::{candidate_selectors, get_or_compile};
use crate::extractors::schema::{ExtractMethod, Locator};

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the element the document scope starts from.
pub fn document_scope(doc: &Html) -> ElementRef<'_> {
    doc.root_element()
}

/// Applies the declared extract method to a locator.
pub fn effective_locator(locator: &Locator, method: ExtractMethod) -> Locator {
    match method {
        ExtractMethod::ByAttributes => locator.clone(),
        ExtractMethod::ByTagOnly => locator.tag_only(),
    }
}

/// Resolves the first node matching `locator` under `scope`.
pub fn resolve_one<'a>(scope: ElementRef<'a>, locator: &Locator) -> Option<ElementRef<'a>> {
    for css in candidate_selectors(locator) {
        let Some(selector) = get_or_compile(&css) else {
            continue;
        };
        if let Some(found) = scope.select(&selector).next() {
            tracing::trace!(selector = %css, "locator resolved");
            return Some(found);
        }
    }
    None
}

/// Resolves every node matching `locator` under `scope`, in document order.
pub fn resolve_all<'a>(scope: ElementRef<'a>, locator: &Locator) -> Vec<ElementRef<'a>> {
    for css in candidate_selectors(locator) {
        let Some(selector) = get_or_compile(&css) else {
            continue;
        };
        let found: Vec<ElementRef<'a>> = scope.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Whitespace-normalized text of a node; `None` when empty.
pub fn node_text(node: ElementRef<'_>) -> Option<String> {
    let text = normalize_whitespace(&node.text().collect::<Vec<_>>().join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Trimmed attribute value of a node; `None` when absent or empty.
pub fn node_attr(node: ElementRef<'_>, attr: &str) -> Option<String> {
    let value = node.value().attr(attr)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Returns the node itself when it has tag `tag`, else its first descendant with that tag.
pub fn self_or_descendant<'a>(node: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    if node.value().name().eq_ignore_ascii_case(tag) {
        return Some(node);
    }
    resolve_one(node, &Locator::tag(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::schema::{AttrMatch, AttrPredicate};

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <div id="event_list_div" class="list">
                <div class="event_result"><h4 class="event_title"><a href="/e/1">  First   Event </a></h4></div>
                <div class="event_result"><h4 class="event_title">Second Event</h4></div>
                <div class="event_result featured"><h4>Third</h4></div>
            </div>
            <a href="https://pulse.example/locations/hall">Hall</a>
            <a href="https://other.example/">Other</a>
            <p class="empty">   </p>
        </body>
        </html>
    "#;

    fn parse_html() -> Html {
        Html::parse_document(SAMPLE_HTML)
    }

    #[test]
    fn resolve_all_keeps_document_order() {
        let doc = parse_html();
        let items = resolve_all(
            document_scope(&doc),
            &Locator::tag("div").attr("class", "event_result"),
        );
        assert_eq!(items.len(), 3);
        assert_eq!(node_text(items[1]).as_deref(), Some("Second Event"));
    }

    #[test]
    fn class_list_matches_subset_of_node_classes() {
        let doc = parse_html();
        let found = resolve_all(
            document_scope(&doc),
            &Locator::tag("div").attr("class", "featured event_result"),
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn resolve_one_returns_none_when_nothing_matches() {
        let doc = parse_html();
        let found = resolve_one(
            document_scope(&doc),
            &Locator::tag("div").attr("class", "content grid"),
        );
        assert!(found.is_none());
    }

    #[test]
    fn id_candidate_wins_when_class_is_stale() {
        let doc = parse_html();
        let loc = Locator::tag("div")
            .attr("id", "event_list_div")
            .attr("class", "renamed-list");
        let found = resolve_one(document_scope(&doc), &loc).expect("id fallback");
        assert_eq!(found.value().attr("id"), Some("event_list_div"));
    }

    #[test]
    fn bare_tag_fallback_is_opt_in() {
        let doc = parse_html();
        let mut loc = Locator::tag("p").attr("class", "missing");
        assert!(resolve_one(document_scope(&doc), &loc).is_none());
        loc.fallback_to_tag = true;
        assert!(resolve_one(document_scope(&doc), &loc).is_some());
    }

    #[test]
    fn prefix_predicate_selects_matching_links() {
        let doc = parse_html();
        let loc = Locator::tag("a").with(
            "href",
            AttrPredicate::Match(AttrMatch::StartsWith(
                "https://pulse.example/locations/".to_string(),
            )),
        );
        let found = resolve_all(document_scope(&doc), &loc);
        assert_eq!(found.len(), 1);
        assert_eq!(node_text(found[0]).as_deref(), Some("Hall"));
    }

    #[test]
    fn resolution_is_scoped_to_descendants() {
        let doc = parse_html();
        let items = resolve_all(
            document_scope(&doc),
            &Locator::tag("div").attr("class", "event_result"),
        );
        let anchor = resolve_one(items[1], &Locator::tag("a"));
        assert!(anchor.is_none());
    }

    #[test]
    fn tag_only_method_drops_predicates() {
        let loc = Locator::tag("p").attr("class", "event-date");
        assert_eq!(effective_locator(&loc, ExtractMethod::ByTagOnly), Locator::tag("p"));
        assert_eq!(effective_locator(&loc, ExtractMethod::ByAttributes), loc);
    }

    #[test]
    fn text_helpers_normalize_and_skip_empty() {
        let doc = parse_html();
        let scope = document_scope(&doc);
        let anchor = resolve_one(scope, &Locator::tag("a")).expect("anchor");
        assert_eq!(node_text(anchor).as_deref(), Some("First Event"));
        assert_eq!(node_attr(anchor, "href").as_deref(), Some("/e/1"));
        assert!(node_attr(anchor, "title").is_none());

        let empty = resolve_one(scope, &Locator::tag("p")).expect("p");
        assert!(node_text(empty).is_none());
    }

    #[test]
    fn self_or_descendant_prefers_the_node() {
        let doc = parse_html();
        let scope = document_scope(&doc);
        let h4 = resolve_one(scope, &Locator::tag("h4")).expect("h4");
        let a = self_or_descendant(h4, "a").expect("nested anchor");
        assert_eq!(a.value().name(), "a");
        assert_eq!(self_or_descendant(a, "a"), Some(a));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("no\textra\nspaces"), "no extra spaces");
        assert_eq!(normalize_whitespace(""), "");
    }
}
