// src/config.rs

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// CSS markers that identify a plan block on a listing page.
#[derive(Debug, Clone)]
pub struct PlanLayout {
    pub glance_section: String,
    pub home_title: String,
    pub row_wrapper: String,
    pub starting_price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_feet: String,
    pub home_image: String,
}

impl Default for PlanLayout {
    fn default() -> Self {
        Self {
            glance_section: "GlanceViewSection".into(),
            home_title: "HomeDesignCompactListView__homeTitle".into(),
            row_wrapper: "col-sm-12".into(),
            starting_price: "HomeDesignCompactListView__startingPrice".into(),
            bedrooms: "HomeDesignCompactListView__bedrooms".into(),
            bathrooms: "HomeDesignCompactListView__bathrooms".into(),
            square_feet: "HomeDesignCompactListView__squareFeet".into(),
            home_image: "HomeDesignCompactListView__homeImage".into(),
        }
    }
}

/// Everything the engine needs to know about the site being harvested.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Scheme and host, no trailing slash.
    pub origin: String,
    /// Prefix for artifact file names, e.g. `pulte_<slug>.json`.
    pub artifact_prefix: String,
    /// Path segment that marks listing and region pages.
    pub listing_path: String,
    pub layout: PlanLayout,
}

impl SiteConfig {
    pub fn pulte() -> Self {
        Self {
            origin: "https://www.pulte.com".into(),
            artifact_prefix: "pulte".into(),
            listing_path: "/homes/".into(),
            layout: PlanLayout::default(),
        }
    }

    /// Absolute form of an href or image source found on the site.
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        match Url::parse(&self.origin).and_then(|base| base.join(href)) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.origin, href),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::pulte()
    }
}

/// Runtime knobs for the binary, filled in from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub zenrows_api_key: Option<String>,
    pub render_wait: Duration,
    pub page_delay: Duration,
    pub db_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/pulte"),
            zenrows_api_key: None,
            render_wait: Duration::from_millis(5000),
            page_delay: Duration::from_secs(2),
            db_path: None,
        }
    }
}

impl Settings {
    pub fn json_dir(&self) -> PathBuf {
        self.output_dir.join("json")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.output_dir.join("html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_handles_relative_and_protocol_relative() {
        let site = SiteConfig::pulte();
        assert_eq!(
            site.absolutize("/homes/nevada"),
            "https://www.pulte.com/homes/nevada"
        );
        assert_eq!(
            site.absolutize("//cdn.pulte.com/a.jpg"),
            "https://cdn.pulte.com/a.jpg"
        );
        assert_eq!(
            site.absolutize("https://www.pulte.com/x"),
            "https://www.pulte.com/x"
        );
    }
}
