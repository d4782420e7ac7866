use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// listing
//  ├── timestamp, name, status, url, price_from, address, phone, description
//  ├── images
//  ├── location
//  │    ├── latitude / longitude
//  │    └── address { city, state, market }
//  ├── details (ranges)
//  ├── amenities
//  ├── homeplans ── floorplan_images
//  ├── homesites ── plan (by name)
//  ├── nearbyplaces
//  └── collections

/// One normalized community listing, as written to the JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub timestamp: NaiveDateTime,
    pub name: Option<String>,
    pub status: Option<String>,
    pub url: String,
    pub price_from: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub location: Location,
    pub details: DetailsRange,
    pub amenities: Vec<Amenity>,
    pub homeplans: Vec<HomePlan>,
    pub homesites: Vec<HomeSite>,
    pub nearbyplaces: Vec<Value>,
    pub collections: Vec<Value>,
}

impl ListingRecord {
    pub fn new(url: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            name: None,
            status: None,
            url: url.into(),
            price_from: None,
            address: None,
            phone: None,
            description: None,
            images: Vec::new(),
            location: Location::default(),
            details: DetailsRange::default(),
            amenities: Vec::new(),
            homeplans: Vec::new(),
            homesites: Vec::new(),
            nearbyplaces: Vec::new(),
            collections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: LocationAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationAddress {
    pub city: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
}

/// Each range is a single formatted value or `"min-max"`, unset when nothing contributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsRange {
    pub price_range: Option<String>,
    pub sqft_range: Option<String>,
    pub bed_range: Option<String>,
    pub bath_range: Option<String>,
    pub stories_range: Option<String>,
    pub community_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    pub name: String,
    pub description: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomePlan {
    pub name: String,
    pub url: Option<String>,
    pub details: PlanDetails,
    pub floorplan_images: Option<Vec<FloorplanImage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDetails {
    pub price: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub half_baths: Option<String>,
    pub sqft: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorplanImage {
    pub name: String,
    pub url: String,
}

/// A buildable lot. `plan` is the name of its owning [`HomePlan`], looked up by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSite {
    pub name: Option<String>,
    pub plan: String,
    pub id: String,
    pub address: Option<String>,
    pub price: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub sqft: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub overview: Option<String>,
    pub images: Vec<String>,
}
