// discovery.rs
use crate::config::SiteConfig;
use crate::engine::fetcher::PageFetcher;
use crate::engine::strategy::{class_contains, first_attr, selector, Strategy};
use crate::errors::{Diagnostic, DiagnosticSink, ScraperError};
use scraper::Html;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Accepts a URL only when its last path segment ends in a digit.
///
/// Trailing slashes are ignored, so `u` and `u/` always agree.
pub fn is_valid_link(url: &str) -> bool {
    let trimmed = url.trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(last) => last.chars().last().is_some_and(|c| c.is_ascii_digit()),
        None => false,
    }
}

pub fn filter_valid_links<I, S>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    links
        .into_iter()
        .filter(|l| is_valid_link(l.as_ref()))
        .map(|l| l.as_ref().to_string())
        .collect()
}

fn mentions_path(href: &str, listing_path: &str) -> bool {
    href.to_lowercase().contains(&listing_path.to_lowercase())
}

/// Anchors inside `ul.list-unstyled` containers that point at a listing path.
pub struct UnstyledListLinks {
    pub listing_path: String,
}

impl Strategy<Vec<String>> for UnstyledListLinks {
    fn name(&self) -> &'static str {
        "unstyled_list"
    }

    fn try_extract(&self, document: &Html) -> Result<Option<Vec<String>>, ScraperError> {
        let sel = selector("ul.list-unstyled a[href]")?;
        let hrefs = document
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| mentions_path(href, &self.listing_path))
            .map(str::to_string)
            .collect();
        Ok(Some(hrefs))
    }
}

/// Any anchor whose href contains the listing path.
pub struct ListingPathLinks {
    pub listing_path: String,
}

impl Strategy<Vec<String>> for ListingPathLinks {
    fn name(&self) -> &'static str {
        "listing_path"
    }

    fn try_extract(&self, document: &Html) -> Result<Option<Vec<String>>, ScraperError> {
        let sel = selector("a[href]")?;
        let hrefs = document
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| mentions_path(href, &self.listing_path))
            .map(str::to_string)
            .collect();
        Ok(Some(hrefs))
    }
}

/// The anchor under each product headline; `data-href` wins over `href`.
pub struct ProductHeadlineLinks;

impl Strategy<Vec<String>> for ProductHeadlineLinks {
    fn name(&self) -> &'static str {
        "product_headline"
    }

    fn try_extract(&self, document: &Html) -> Result<Option<Vec<String>>, ScraperError> {
        let headline = selector(".ProductSummary__headline")?;
        let anchor = selector("a")?;
        let hrefs = document
            .select(&headline)
            .filter_map(|h| h.select(&anchor).next())
            .filter_map(|a| first_attr(a, &["data-href", "href"]))
            .map(str::to_string)
            .collect();
        Ok(Some(hrefs))
    }
}

/// Listing-path anchors inside community/product cards.
pub struct CommunityCardLinks {
    pub listing_path: String,
}

impl Strategy<Vec<String>> for CommunityCardLinks {
    fn name(&self) -> &'static str {
        "community_card"
    }

    fn try_extract(&self, document: &Html) -> Result<Option<Vec<String>>, ScraperError> {
        let cards = selector("div, article")?;
        let anchor = selector("a[href]")?;
        let hrefs = document
            .select(&cards)
            .filter(|c| class_contains(*c, &["community", "product", "home-item"]))
            .flat_map(|c| c.select(&anchor).collect::<Vec<_>>())
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| mentions_path(href, &self.listing_path))
            .map(str::to_string)
            .collect();
        Ok(Some(hrefs))
    }
}

/// Ordered link strategies plus the site they normalize against.
pub struct LinkDiscovery {
    site: SiteConfig,
    strategies: Vec<Box<dyn Strategy<Vec<String>>>>,
}

impl LinkDiscovery {
    pub fn new(site: SiteConfig, strategies: Vec<Box<dyn Strategy<Vec<String>>>>) -> Self {
        Self { site, strategies }
    }

    /// Home page -> region pages.
    pub fn regions(site: SiteConfig) -> Self {
        let path = site.listing_path.clone();
        Self::new(
            site,
            vec![
                Box::new(UnstyledListLinks {
                    listing_path: path.clone(),
                }),
                Box::new(ListingPathLinks { listing_path: path }),
            ],
        )
    }

    /// Region page -> community pages.
    pub fn communities(site: SiteConfig) -> Self {
        let path = site.listing_path.clone();
        Self::new(
            site,
            vec![
                Box::new(ProductHeadlineLinks),
                Box::new(CommunityCardLinks { listing_path: path }),
            ],
        )
    }

    /// Runs every strategy in order and returns the normalized, deduplicated hrefs.
    pub fn discover(&self, document: &Html, sink: &dyn DiagnosticSink) -> BTreeSet<String> {
        let mut links = BTreeSet::new();

        for strategy in &self.strategies {
            match strategy.try_extract(document) {
                Ok(Some(hrefs)) => {
                    let before = links.len();
                    links.extend(hrefs.iter().map(|h| self.site.absolutize(h)));
                    info!(
                        strategy = strategy.name(),
                        added = links.len() - before,
                        "strategy collected links"
                    );
                }
                Ok(None) => {}
                Err(e) => sink.report(Diagnostic::DiscoveryStrategyFailure {
                    strategy: strategy.name(),
                    reason: e.to_string(),
                }),
            }
        }

        links
    }
}

/// Two-level crawl: home page -> regions -> communities, filtered to leaf listings.
///
/// Only a failure to fetch the home page is returned; region pages that fail are skipped.
pub fn harvest_links(
    fetcher: &dyn PageFetcher,
    site: &SiteConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<String>, ScraperError> {
    let home_url = format!("{}/", site.origin);
    let home = fetcher.fetch(&home_url)?.parse();
    let regions = LinkDiscovery::regions(site.clone()).discover(&home, sink);
    info!(count = regions.len(), "found region links");

    let communities = LinkDiscovery::communities(site.clone());
    let mut found = BTreeSet::new();
    for url in &regions {
        match fetcher.fetch(url) {
            Ok(page) => found.extend(communities.discover(&page.parse(), sink)),
            Err(e) => warn!(%url, error = %e, "region page skipped"),
        }
    }
    info!(count = found.len(), "found community links");

    let valid = filter_valid_links(&found);
    info!(count = valid.len(), "community links after filtering");
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TracingSink;

    #[test]
    fn valid_link_requires_trailing_digit() {
        assert!(is_valid_link(
            "https://www.pulte.com/homes/nevada/las-vegas/las-vegas/monument-at-reverence-211219"
        ));
        assert!(is_valid_link("https://www.pulte.com/homes/x-12/"));
        assert!(!is_valid_link("https://www.pulte.com/homes/nevada"));
        assert!(!is_valid_link(""));
        assert!(!is_valid_link("/"));
    }

    #[test]
    fn trailing_slash_never_changes_validity() {
        for u in [
            "https://www.pulte.com/homes/x-1",
            "https://www.pulte.com/homes/x",
            "https://www.pulte.com/homes/x-1/",
            "",
            "abc9",
        ] {
            assert_eq!(is_valid_link(u), is_valid_link(&format!("{u}/")), "{u}");
        }
    }

    #[test]
    fn discover_normalizes_before_dedup() {
        let doc = Html::parse_document(
            r#"
            <ul class="list-unstyled">
              <li><a href="/homes/nevada">Nevada</a></li>
              <li><a href="/about">About</a></li>
            </ul>
            <a href="https://www.pulte.com/homes/nevada">Nevada again</a>
            <a href="/homes/florida">Florida</a>
            "#,
        );
        let discovery = LinkDiscovery::regions(SiteConfig::pulte());
        let first = discovery.discover(&doc, &TracingSink);
        let second = discovery.discover(&doc, &TracingSink);

        assert_eq!(first.len(), 2);
        assert_eq!(first.len(), second.len());
        assert!(first.contains("https://www.pulte.com/homes/nevada"));
        assert!(first.contains("https://www.pulte.com/homes/florida"));
    }

    #[test]
    fn community_strategies_prefer_data_href() {
        let doc = Html::parse_document(
            r##"
            <div class="ProductSummary__headline">
              <a data-href="/homes/fl/ftm/estero/verdana-village-210715" href="#">Verdana</a>
            </div>
            <article class="CommunityCard">
              <a href="/homes/sc/hh/bluffton/malind-bluff-210500">Malind</a>
              <a href="/contact">Contact</a>
            </article>
            "##,
        );
        let links = LinkDiscovery::communities(SiteConfig::pulte()).discover(&doc, &TracingSink);
        assert_eq!(
            links.into_iter().collect::<Vec<_>>(),
            vec![
                "https://www.pulte.com/homes/fl/ftm/estero/verdana-village-210715".to_string(),
                "https://www.pulte.com/homes/sc/hh/bluffton/malind-bluff-210500".to_string(),
            ]
        );
    }

    #[test]
    fn filter_keeps_only_leaf_listings() {
        let links = vec![
            "https://www.pulte.com/homes/nevada",
            "https://www.pulte.com/homes/nevada/las-vegas/las-vegas/monument-211219/",
        ];
        assert_eq!(
            filter_valid_links(links),
            vec!["https://www.pulte.com/homes/nevada/las-vegas/las-vegas/monument-211219/"]
        );
    }
}
