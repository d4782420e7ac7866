// assembler.rs
use crate::config::SiteConfig;
use crate::engine::aggregate::aggregate;
use crate::engine::fetcher::PageFetcher;
use crate::engine::fields::extract_fields;
use crate::engine::models::{ListingRecord, Location, LocationAddress};
use crate::engine::plans::link_plans_and_sites;
use crate::errors::{DiagnosticSink, ScraperError};
use crate::store::{listing_key, OutputStore};
use chrono::Local;
use scraper::Html;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

/// Builds one [`ListingRecord`] per listing page.
pub struct ListingAssembler<'a> {
    site: &'a SiteConfig,
    fetcher: &'a dyn PageFetcher,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> ListingAssembler<'a> {
    pub fn new(
        site: &'a SiteConfig,
        fetcher: &'a dyn PageFetcher,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            site,
            fetcher,
            sink,
        }
    }

    /// Fetches `url` and assembles its record. Only the fetch itself can fail.
    pub fn scrape(&self, url: &str) -> Result<ListingRecord, ScraperError> {
        info!(%url, "processing listing");
        let page = self.fetcher.fetch(url)?;
        Ok(self.assemble(url, &page.parse()))
    }

    /// Assembles the record for an already rendered listing page.
    pub fn assemble(&self, url: &str, document: &Html) -> ListingRecord {
        let mut record = ListingRecord::new(url, Local::now().naive_local());

        let fields = extract_fields(document, self.site, self.sink);
        record.name = fields.name;
        record.price_from = fields.price_from;
        record.address = fields.address;
        record.phone = fields.phone;
        record.description = fields.description;
        record.images = fields.images;
        record.amenities = fields.amenities;
        record.location = Location {
            latitude: fields.latitude,
            longitude: fields.longitude,
            address: location_from_url(url, &self.site.listing_path),
        };

        let (homeplans, homesites) =
            link_plans_and_sites(document, self.site, self.fetcher, self.sink);
        record.details = aggregate(&homeplans, &homesites, self.sink);
        record.homeplans = homeplans;
        record.homesites = homesites;

        info!(
            %url,
            images = record.images.len(),
            amenities = record.amenities.len(),
            homeplans = record.homeplans.len(),
            homesites = record.homesites.len(),
            "listing assembled"
        );
        record
    }
}

/// State, market and city from `/homes/<state>/<market>/<city>/<slug>`.
pub fn location_from_url(url: &str, listing_path: &str) -> LocationAddress {
    let Ok(parsed) = Url::parse(url) else {
        return LocationAddress::default();
    };
    let path = parsed.path();
    let Some(idx) = path.find(listing_path) else {
        return LocationAddress::default();
    };

    let segments: Vec<&str> = path[idx + listing_path.len()..]
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [state, market, city, _slug, ..] => LocationAddress {
            state: Some(title_case(state)),
            market: Some(title_case(market)),
            city: Some(title_case(city)),
        },
        _ => LocationAddress::default(),
    }
}

fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Scrapes `urls` one after another, skipping those already in `store`.
///
/// A failing URL is logged and counted; the batch always runs to the end.
pub fn run_batch(
    assembler: &ListingAssembler<'_>,
    urls: &[String],
    store: &dyn OutputStore,
    delay: Duration,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for (i, url) in urls.iter().enumerate() {
        info!("listing {}/{}", i + 1, urls.len());
        let key = listing_key(url);

        match store.exists(key) {
            Ok(true) => {
                info!(%url, key, "output exists, skipping");
                summary.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => warn!(%url, error = %e, "could not check existing output"),
        }

        let result = assembler
            .scrape(url)
            .and_then(|record| store.write(key, &record));

        match result {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                error!(%url, error = %e, "listing failed");
                summary.failed += 1;
            }
        }

        if !delay.is_zero() && i + 1 < urls.len() {
            std::thread::sleep(delay);
        }
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_comes_from_listing_path() {
        let loc = location_from_url(
            "https://www.pulte.com/homes/nevada/las-vegas/las-vegas/monument-at-reverence-211219",
            "/homes/",
        );
        assert_eq!(loc.state.as_deref(), Some("Nevada"));
        assert_eq!(loc.market.as_deref(), Some("Las Vegas"));
        assert_eq!(loc.city.as_deref(), Some("Las Vegas"));

        let short = location_from_url("https://www.pulte.com/homes/nevada", "/homes/");
        assert_eq!(short, LocationAddress::default());
        assert_eq!(location_from_url("not a url", "/homes/"), LocationAddress::default());
    }

    #[test]
    fn title_case_slugs() {
        assert_eq!(title_case("south-carolina"), "South Carolina");
        assert_eq!(title_case("hilton-head"), "Hilton Head");
    }
}
