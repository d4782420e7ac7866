use crate::engine::fetcher::{PageFetcher, RenderedDocument};
use crate::errors::{Diagnostic, DiagnosticSink, ScraperError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Serves canned HTML by URL; anything else fails like a dead link.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, String>,
    pub requested: RefCell<Vec<String>>,
}

impl MapFetcher {
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }
}

impl PageFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<RenderedDocument, ScraperError> {
        self.requested.borrow_mut().push(url.to_string());
        self.pages
            .get(url)
            .map(|html| RenderedDocument::new(url, html.clone()))
            .ok_or_else(|| ScraperError::Fetch {
                url: url.to_string(),
                reason: "404".into(),
            })
    }
}

/// Keeps every diagnostic for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub seen: RefCell<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn count(&self, kind: &str) -> usize {
        self.seen.borrow().iter().filter(|d| d.kind() == kind).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.seen.borrow_mut().push(diagnostic);
    }
}

pub struct PlanBlock<'a> {
    pub name: &'a str,
    pub href: &'a str,
    pub price: &'a str,
    pub beds: &'a str,
    pub baths: &'a str,
    pub sqft: &'a str,
}

/// A listing page in the shape the plan linker expects.
pub fn listing_page(address: Option<&str>, plans: &[PlanBlock<'_>]) -> String {
    let address = address
        .map(|a| format!(r#"<div class="CommunityHeader__address">{a}</div>"#))
        .unwrap_or_default();

    let blocks: String = plans
        .iter()
        .map(|p| {
            format!(
                r#"
                <div class="row">
                  <div class="col-sm-12 HomeDesignCompactListView">
                    <div class="HomeDesignCompactListView__homeImage"><img data-csrc="//cdn.pulte.com/{name}.jpg" src="/placeholder.gif"></div>
                    <div class="HomeDesignCompactListView__details">
                      <div class="HomeDesignCompactListView__homeTitle"><a href="{href}">{name}</a></div>
                      <div class="HomeDesignCompactListView__startingPrice">From {price}</div>
                      <div class="HomeDesignCompactListView__bedrooms">{beds}</div>
                      <div class="HomeDesignCompactListView__bathrooms">{baths}</div>
                      <div class="HomeDesignCompactListView__squareFeet">{sqft}</div>
                    </div>
                  </div>
                </div>"#,
                name = p.name,
                href = p.href,
                price = p.price,
                beds = p.beds,
                baths = p.baths,
                sqft = p.sqft,
            )
        })
        .collect();

    format!(
        r#"<html><head><script>var map = {{"latitude": 32.23, "longitude": -80.86}};</script></head>
        <body>
          <h1>Malind Bluff</h1>
          {address}
          <div class="GlanceViewSection">{blocks}</div>
        </body></html>"#
    )
}

/// A homesite page with `floors` floorplan figures.
pub fn homesite_page(address: &str, floors: usize) -> String {
    let figures: String = (1..=floors)
        .map(|i| {
            format!(
                r#"<div class="floor-container"><figure><img data-src="/floors/{i}.png"></figure></div>"#
            )
        })
        .collect();

    format!(
        r#"<html><body>
          <div class="CommunityPersistentNav__address">{address}</div>
          <div class="PlanOverview">A plan worth living in.</div>
          <script>{{"Latitude":"32.2370","Longitude":"-80.8603"}}</script>
          {figures}
          <div class="owl-stage"><div class="owl-item"><img data-csrc="//cdn.pulte.com/g1.jpg"></div></div>
        </body></html>"#
    )
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{name}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}
