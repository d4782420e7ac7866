// fields.rs
use crate::config::SiteConfig;
use crate::engine::models::Amenity;
use crate::engine::patterns::{classify_amenity, extract_coordinate, extract_price, Axis};
use crate::engine::strategy::{
    first_hit, selector, text_of, ClassKeywordText, SelectorText, Strategy,
};
use crate::errors::{Diagnostic, DiagnosticSink, ScraperError};
use scraper::Html;

/// Top-level fields of a listing page. Anything not found stays `None` / empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFields {
    pub name: Option<String>,
    pub price_from: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenities: Vec<Amenity>,
}

const NAME: SelectorText = SelectorText {
    name: "name",
    css: "h1",
};

const PRICE_BLOCK: ClassKeywordText = ClassKeywordText {
    name: "price",
    tag: "div",
    keywords: &["price"],
};

const ADDRESS_BLOCK: ClassKeywordText = ClassKeywordText {
    name: "address",
    tag: "div",
    keywords: &["address"],
};

pub(crate) const DESCRIPTION_BLOCK: ClassKeywordText = ClassKeywordText {
    name: "description",
    tag: "div",
    keywords: &["description", "overview"],
};

/// Text of the first `tel:` link.
struct TelLinkText;

impl Strategy<String> for TelLinkText {
    fn name(&self) -> &'static str {
        "phone"
    }

    fn try_extract(&self, document: &Html) -> Result<Option<String>, ScraperError> {
        let sel = selector("a[href]")?;
        Ok(document
            .select(&sel)
            .find(|a| a.value().attr("href").is_some_and(|h| h.contains("tel:")))
            .map(text_of))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Reports a [`Diagnostic::FieldExtractionMiss`] for every flagged field.
pub(crate) fn report_misses(sink: &dyn DiagnosticSink, checks: &[(&'static str, bool)]) {
    for &(field, missing) in checks {
        if missing {
            sink.report(Diagnostic::FieldExtractionMiss { field });
        }
    }
}

// A failed read counts as a miss and leaves the field empty.
fn or_miss<T: Default>(
    result: Result<T, ScraperError>,
    field: &'static str,
    sink: &dyn DiagnosticSink,
) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(field, error = %e, "field could not be read");
        sink.report(Diagnostic::FieldExtractionMiss { field });
        T::default()
    })
}

/// Pulls the top-level fields out of a listing page.
pub fn extract_fields(document: &Html, site: &SiteConfig, sink: &dyn DiagnosticSink) -> ListingFields {
    let mut fields = ListingFields {
        name: non_empty(first_hit::<String>(&[&NAME], document)),
        price_from: first_hit::<String>(&[&PRICE_BLOCK], document).and_then(|t| extract_price(&t)),
        address: non_empty(first_hit::<String>(&[&ADDRESS_BLOCK], document)),
        phone: non_empty(first_hit::<String>(&[&TelLinkText], document)),
        description: non_empty(first_hit::<String>(&[&DESCRIPTION_BLOCK], document)),
        ..ListingFields::default()
    };

    fields.images = or_miss(carousel_images(document, site), "images", sink);
    fields.amenities = or_miss(amenities(document), "amenities", sink);

    // Unreadable scripts surface below as latitude/longitude misses.
    let scripts = inline_scripts(document).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "inline scripts could not be read");
        Vec::new()
    });
    fields.latitude = scripts
        .iter()
        .find_map(|s| extract_coordinate(s, Axis::Latitude));
    fields.longitude = scripts
        .iter()
        .find_map(|s| extract_coordinate(s, Axis::Longitude));

    report_misses(
        sink,
        &[
            ("name", fields.name.is_none()),
            ("price_from", fields.price_from.is_none()),
            ("address", fields.address.is_none()),
            ("phone", fields.phone.is_none()),
            ("description", fields.description.is_none()),
            ("latitude", fields.latitude.is_none()),
            ("longitude", fields.longitude.is_none()),
        ],
    );

    fields
}

fn inline_scripts(document: &Html) -> Result<Vec<String>, ScraperError> {
    let sel = selector("script")?;
    Ok(document
        .select(&sel)
        .map(|s| s.text().collect::<String>())
        .filter(|s| !s.trim().is_empty())
        .collect())
}

// One photo per active carousel slide; inactive clones repeat the same photos.
fn carousel_images(document: &Html, site: &SiteConfig) -> Result<Vec<String>, ScraperError> {
    let slide = selector("div.owl-item.active")?;
    let img = selector("img.u-responsiveMedia[src]")?;
    let images: Vec<String> = document
        .select(&slide)
        .filter_map(|s| s.select(&img).next())
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.trim().is_empty())
        .map(|src| site.absolutize(src))
        .collect();
    tracing::info!(count = images.len(), "carousel images found");
    Ok(images)
}

fn amenities(document: &Html) -> Result<Vec<Amenity>, ScraperError> {
    let container = selector("div.neighborhood-features-container")?;
    let item = selector("div.neighborhood-item li")?;

    let Some(container) = document.select(&container).next() else {
        return Ok(Vec::new());
    };

    Ok(container
        .select(&item)
        .map(text_of)
        .filter(|d| !d.is_empty())
        .map(|description| Amenity {
            name: classify_amenity(&description),
            description,
            icon_url: None,
        })
        .collect())
}
