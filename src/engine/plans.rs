// plans.rs
use crate::config::{PlanLayout, SiteConfig};
use crate::engine::fetcher::{PageFetcher, RenderedDocument};
use crate::engine::fields::{report_misses, DESCRIPTION_BLOCK};
use crate::engine::models::{FloorplanImage, HomePlan, HomeSite, PlanDetails};
use crate::engine::patterns::{
    extract_baths, extract_beds, extract_coordinate, extract_price, extract_sqft, ordinal,
    strip_postal_code, url_numeric_id, Axis,
};
use crate::engine::strategy::{
    ancestor_with_class, find_by_class, first_attr, has_class, selector, text_of, Strategy,
};
use crate::errors::{Diagnostic, DiagnosticSink, ScraperError};
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use tracing::{info, warn};

const PLAN_STATUS: &str = "Actively selling";
const SITE_STATUS: &str = "Available";

/// What a homesite's own page adds to the seeded values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteEnrichment {
    pub address: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub floorplans: Vec<FloorplanImage>,
    pub images: Vec<String>,
}

/// Builds homeplans and their homesites from a listing page, then enriches
/// each homesite from its own page.
pub fn link_plans_and_sites(
    document: &Html,
    site: &SiteConfig,
    fetcher: &dyn PageFetcher,
    sink: &dyn DiagnosticSink,
) -> (Vec<HomePlan>, Vec<HomeSite>) {
    // Phase 1: skeletons from the listing page.
    let mut plans = match collect_plans(document, site, sink) {
        Ok(plans) => plans,
        Err(e) => {
            warn!(error = %e, "plan blocks could not be read");
            Vec::new()
        }
    };
    let mut homesites: Vec<HomeSite> = Vec::with_capacity(plans.len());
    for plan in &plans {
        let seeded = seed_homesite(plan, homesites.len());
        homesites.push(seeded);
    }
    info!(
        plans = plans.len(),
        homesites = homesites.len(),
        "plan blocks collected"
    );

    // Phase 2: enrich each homesite, then hand floorplans back to the owning plan.
    let plan_index: HashMap<String, usize> =
        plans
            .iter()
            .enumerate()
            .rev()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();

    for homesite in &mut homesites {
        let Some(enrichment) = enrich_homesite(homesite, site, fetcher, sink) else {
            continue;
        };
        if enrichment.floorplans.is_empty() {
            continue;
        }
        match plan_index.get(&homesite.plan) {
            Some(&i) => {
                info!(
                    plan = %plans[i].name,
                    floors = enrichment.floorplans.len(),
                    "floorplans attached"
                );
                plans[i].floorplan_images = Some(enrichment.floorplans);
            }
            None => warn!(plan = %homesite.plan, "homesite refers to an unknown plan"),
        }
    }

    (plans, homesites)
}

/// One [`HomePlan`] per recognized plan title inside a row wrapper.
pub fn collect_plans(
    document: &Html,
    site: &SiteConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<HomePlan>, ScraperError> {
    let layout = &site.layout;
    let divs = selector("div")?;

    if !document
        .select(&divs)
        .any(|d| has_class(d, &layout.glance_section))
    {
        warn!(marker = %layout.glance_section, "no plan section on page");
        return Ok(Vec::new());
    }

    let anchor = selector("a")?;
    let mut plans = Vec::new();

    for title in document
        .select(&divs)
        .filter(|d| has_class(*d, &layout.home_title))
    {
        let Some(a) = title.select(&anchor).next() else {
            continue;
        };
        let Some(block) = ancestor_with_class(title, &layout.row_wrapper) else {
            warn!(title = %text_of(title), "plan title outside a row wrapper");
            continue;
        };

        let plan = HomePlan {
            name: text_of(a),
            url: a.value().attr("href").map(|h| site.absolutize(h)),
            details: plan_details(block, layout, site, sink)?,
            floorplan_images: None,
        };
        info!(plan = %plan.name, "plan found");
        plans.push(plan);
    }

    Ok(plans)
}

fn block_text(
    block: ElementRef<'_>,
    class: &str,
) -> Result<Option<String>, ScraperError> {
    Ok(find_by_class(block, "div", class)?.map(text_of))
}

fn plan_details(
    block: ElementRef<'_>,
    layout: &PlanLayout,
    site: &SiteConfig,
    sink: &dyn DiagnosticSink,
) -> Result<PlanDetails, ScraperError> {
    let price = block_text(block, &layout.starting_price)?
        .and_then(|t| extract_price(&t))
        .map(|p| format!("From {p}"));
    let beds = block_text(block, &layout.bedrooms)?
        .and_then(|t| extract_beds(&t))
        .map(|b| format!("{b} bd"));
    let baths = block_text(block, &layout.bathrooms)?
        .and_then(|t| extract_baths(&t))
        .map(|b| format!("{b} ba"));
    let sqft = block_text(block, &layout.square_feet)?
        .and_then(|t| extract_sqft(&t))
        .map(|s| format!("{s} ft²"));
    report_misses(
        sink,
        &[
            ("plan.price", price.is_none()),
            ("plan.beds", beds.is_none()),
            ("plan.baths", baths.is_none()),
            ("plan.sqft", sqft.is_none()),
        ],
    );

    let img = selector("img")?;
    let image_url = find_by_class(block, "div", &layout.home_image)?
        .and_then(|wrapper| wrapper.select(&img).next())
        .and_then(|img| first_attr(img, &["data-csrc", "src"]))
        .map(|src| site.absolutize(src));

    Ok(PlanDetails {
        price,
        beds,
        baths,
        half_baths: None,
        sqft,
        status: Some(PLAN_STATUS.to_string()),
        image_url,
    })
}

/// Homesite seeded from its plan; `collected` is how many homesites precede it.
pub fn seed_homesite(plan: &HomePlan, collected: usize) -> HomeSite {
    let id = plan
        .url
        .as_deref()
        .and_then(url_numeric_id)
        .unwrap_or_else(|| (collected + 1).to_string());

    HomeSite {
        name: None,
        plan: plan.name.clone(),
        id,
        address: None,
        price: plan
            .details
            .price
            .as_deref()
            .map(|p| p.trim_start_matches("From ").to_string()),
        beds: plan.details.beds.clone(),
        baths: plan.details.baths.clone(),
        sqft: plan.details.sqft.clone(),
        status: SITE_STATUS.to_string(),
        image_url: plan.details.image_url.clone(),
        url: plan.url.clone(),
        latitude: None,
        longitude: None,
        overview: None,
        images: Vec::new(),
    }
}

/// Fetches the homesite page and merges what it finds. On failure the seeded
/// values are kept and `None` is returned.
fn enrich_homesite(
    homesite: &mut HomeSite,
    site: &SiteConfig,
    fetcher: &dyn PageFetcher,
    sink: &dyn DiagnosticSink,
) -> Option<SiteEnrichment> {
    let Some(url) = homesite.url.clone() else {
        sink.report(Diagnostic::SubPageFetchFailure {
            url: None,
            reason: format!("plan '{}' has no link", homesite.plan),
        });
        return None;
    };

    let enrichment = fetcher
        .fetch(&url)
        .and_then(|page| parse_homesite_page(&page, site, sink));

    match enrichment {
        Ok(enrichment) => {
            apply_enrichment(homesite, &enrichment);
            Some(enrichment)
        }
        Err(e) => {
            sink.report(Diagnostic::SubPageFetchFailure {
                url: Some(url),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn apply_enrichment(homesite: &mut HomeSite, enrichment: &SiteEnrichment) {
    if enrichment.address.is_some() {
        homesite.address = enrichment.address.clone();
        homesite.name = enrichment.name.clone();
    }
    if enrichment.overview.is_some() {
        homesite.overview = enrichment.overview.clone();
    }
    if enrichment.latitude.is_some() {
        homesite.latitude = enrichment.latitude;
    }
    if enrichment.longitude.is_some() {
        homesite.longitude = enrichment.longitude;
    }
    homesite.images.extend(enrichment.images.iter().cloned());
    info!(
        homesite = %homesite.id,
        images = homesite.images.len(),
        "homesite enriched"
    );
}

/// Reads a homesite page: address, overview, coordinates, floorplans and gallery.
pub fn parse_homesite_page(
    page: &RenderedDocument,
    site: &SiteConfig,
    sink: &dyn DiagnosticSink,
) -> Result<SiteEnrichment, ScraperError> {
    let document = page.parse();

    let address = document
        .select(&selector("div.CommunityPersistentNav__address")?)
        .next()
        .map(text_of)
        .filter(|a| !a.is_empty())
        .map(|a| strip_postal_code(&a));
    let name = address
        .as_deref()
        .and_then(|a| a.split(',').next())
        .map(|n| n.trim().to_string());

    let overview = DESCRIPTION_BLOCK
        .try_extract(&document)?
        .filter(|o| !o.is_empty());

    // Coordinates may sit anywhere in the raw source, not only in scripts.
    let latitude = extract_coordinate(&page.html, Axis::Latitude);
    let longitude = extract_coordinate(&page.html, Axis::Longitude);
    report_misses(
        sink,
        &[
            ("homesite.address", address.is_none()),
            ("homesite.overview", overview.is_none()),
            ("homesite.latitude", latitude.is_none()),
            ("homesite.longitude", longitude.is_none()),
        ],
    );

    Ok(SiteEnrichment {
        address,
        name,
        overview,
        latitude,
        longitude,
        floorplans: floorplans(&document, site)?,
        images: gallery(&document, site)?,
    })
}

const LAZY_SOURCES: [&str; 3] = ["data-csrc", "data-src", "src"];

// Floors are numbered by container position.
fn floorplans(document: &Html, site: &SiteConfig) -> Result<Vec<FloorplanImage>, ScraperError> {
    let container = selector("div.floor-container")?;
    let figure = selector("figure")?;
    let img = selector("img")?;

    Ok(document
        .select(&container)
        .enumerate()
        .filter_map(|(idx, floor)| {
            let src = floor
                .select(&figure)
                .next()
                .and_then(|fig| fig.select(&img).next())
                .and_then(|img| first_attr(img, &LAZY_SOURCES))?;
            Some(FloorplanImage {
                name: format!("{} Floor Floorplan", ordinal(idx + 1)),
                url: site.absolutize(src),
            })
        })
        .collect())
}

fn gallery(document: &Html, site: &SiteConfig) -> Result<Vec<String>, ScraperError> {
    let stage = selector("div.owl-stage")?;
    let item = selector("div.owl-item")?;
    let img = selector("img")?;

    let Some(stage) = document.select(&stage).next() else {
        return Ok(Vec::new());
    };

    Ok(stage
        .select(&item)
        .filter_map(|it| it.select(&img).next())
        .filter_map(|img| first_attr(img, &LAZY_SOURCES))
        .map(|src| site.absolutize(src))
        .collect())
}
