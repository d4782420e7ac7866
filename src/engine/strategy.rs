// strategy.rs
use crate::errors::ScraperError;
use scraper::{ElementRef, Html, Selector};

/// One heuristic for locating a value in a heterogeneous document.
///
/// `Ok(None)` means the heuristic ran and found nothing; `Err` means it could
/// not run at all (bad selector, unexpected markup).
pub trait Strategy<T> {
    fn name(&self) -> &'static str;
    fn try_extract(&self, document: &Html) -> Result<Option<T>, ScraperError>;
}

/// Runs `strategies` in order and returns the first hit.
/// A strategy that errors is skipped like one that found nothing.
pub fn first_hit<T>(strategies: &[&dyn Strategy<T>], document: &Html) -> Option<T> {
    strategies.iter().find_map(|s| match s.try_extract(document) {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!(strategy = s.name(), error = %e, "strategy skipped");
            None
        }
    })
}

pub fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(e.to_string()))
}

/// Concatenated, trimmed text of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether the element's `class` attribute contains any of `keywords`, ignoring case.
pub fn class_contains(element: ElementRef<'_>, keywords: &[&str]) -> bool {
    element
        .value()
        .attr("class")
        .map(|class| {
            let class = class.to_lowercase();
            keywords.iter().any(|k| class.contains(&k.to_lowercase()))
        })
        .unwrap_or(false)
}

/// Whether the element carries `class` as one of its class tokens.
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Nearest ancestor carrying the class token `class`.
pub fn ancestor_with_class<'a>(element: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| has_class(*e, class))
}

/// First descendant of `scope` matching `tag` whose class token list includes `class`.
pub fn find_by_class<'a>(
    scope: ElementRef<'a>,
    tag: &str,
    class: &str,
) -> Result<Option<ElementRef<'a>>, ScraperError> {
    let sel = selector(tag)?;
    Ok(scope.select(&sel).find(|e| has_class(*e, class)))
}

/// First attribute in `names` that is present and non-empty.
pub fn first_attr<'a>(element: ElementRef<'a>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|n| element.value().attr(n).filter(|v| !v.trim().is_empty()))
}

/// Text of the first `tag` element whose class mentions one of `keywords`.
pub struct ClassKeywordText {
    pub name: &'static str,
    pub tag: &'static str,
    pub keywords: &'static [&'static str],
}

impl Strategy<String> for ClassKeywordText {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, document: &Html) -> Result<Option<String>, ScraperError> {
        let sel = selector(self.tag)?;
        Ok(document
            .select(&sel)
            .find(|e| class_contains(*e, self.keywords))
            .map(text_of))
    }
}

/// Text of the first element matching a CSS selector.
pub struct SelectorText {
    pub name: &'static str,
    pub css: &'static str,
}

impl Strategy<String> for SelectorText {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, document: &Html) -> Result<Option<String>, ScraperError> {
        let sel = selector(self.css)?;
        Ok(document.select(&sel).next().map(text_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_keyword_is_case_insensitive() {
        let doc = Html::parse_document(
            r#"<div class="Header">x</div><div class="CommunityPrice big">From $400,000</div>"#,
        );
        let strategy = ClassKeywordText {
            name: "price",
            tag: "div",
            keywords: &["price"],
        };
        assert_eq!(
            strategy.try_extract(&doc).unwrap(),
            Some("From $400,000".to_string())
        );
    }

    #[test]
    fn first_hit_falls_through_to_later_strategies() {
        let doc = Html::parse_document(r#"<h2 class="title">Fallback</h2>"#);
        let broken = SelectorText {
            name: "broken",
            css: "h1[",
        };
        let missing = SelectorText {
            name: "h1",
            css: "h1",
        };
        let h2 = SelectorText {
            name: "h2",
            css: "h2",
        };
        let found = first_hit::<String>(&[&broken, &missing, &h2], &doc);
        assert_eq!(found, Some("Fallback".to_string()));
    }

    #[test]
    fn ancestor_lookup_by_class_token() {
        let doc = Html::parse_document(
            r#"<div class="row col-sm-12"><div><span id="t">x</span></div></div>"#,
        );
        let span = doc.select(&selector("#t").unwrap()).next().unwrap();
        let wrapper = ancestor_with_class(span, "col-sm-12").unwrap();
        assert!(has_class(wrapper, "row"));
        assert!(ancestor_with_class(span, "missing").is_none());
    }
}
