//! DOM helpers over a rendered page snapshot.
//!
//! `scraper::Html` is not `Send`, so snapshots are parsed and consumed inside
//! synchronous functions and never held across an `.await`.

use scraper::{ElementRef, Html, Selector};

/// A parsed copy of the page as the browser rendered it.
pub struct Snapshot {
    html: Html,
}

impl Snapshot {
    #[must_use]
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// All elements matching `css`, in document order.
    ///
    /// An invalid selector matches nothing.
    #[must_use]
    pub fn find_elements(&self, css: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(css) {
            Some(selector) => self.html.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    /// Like [`find_elements`](Self::find_elements), but a match nested inside
    /// another match is dropped so each listing item is counted once.
    #[must_use]
    pub fn find_outermost(&self, css: &str) -> Vec<ElementRef<'_>> {
        let matched = self.find_elements(css);
        matched
            .iter()
            .copied()
            .filter(|element| {
                !element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|ancestor| matched.contains(&ancestor))
            })
            .collect()
    }
}

/// Whitespace-collapsed text of the first descendant of `scope` matching
/// `css` whose text is not blank.
#[must_use]
pub fn element_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = parse_selector(css)?;
    scope.select(&selector).find_map(|element| {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!collapsed.is_empty()).then_some(collapsed)
    })
}

/// Trimmed `attr` of the first descendant of `scope` matching `css` that
/// carries a non-blank value.
#[must_use]
pub fn element_attribute(scope: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let selector = parse_selector(css)?;
    scope
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!(selector = css, error = %e, "invalid CSS selector");
            None
        }
    }
}
