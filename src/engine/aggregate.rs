// aggregate.rs
use crate::engine::models::{DetailsRange, HomePlan, HomeSite};
use crate::engine::patterns::{
    group_thousands, parse_decimal_bounds, parse_grouped_bounds, parse_int_bounds, parse_price,
};
use crate::errors::{Diagnostic, DiagnosticSink};
use tracing::info;

/// Renders `min` alone when every value is equal, else `min-max`. `None` for an empty pool.
pub fn render_range<T, F>(values: &[T], format: F) -> Option<String>
where
    T: PartialOrd + Copy,
    F: Fn(T) -> String,
{
    let (&first, rest) = values.split_first()?;
    let (min, max) = rest.iter().fold((first, first), |(lo, hi), &v| {
        (
            if v < lo { v } else { lo },
            if v > hi { v } else { hi },
        )
    });

    if min == max {
        Some(format(min))
    } else {
        Some(format!("{}-{}", format(min), format(max)))
    }
}

fn price(v: u64) -> String {
    format!("${}", group_thousands(v))
}

// `2.0` renders as `2`, `2.5` as `2.5`.
fn plain(v: f64) -> String {
    v.to_string()
}

/// Min-max ranges across all homesites, plus stories from floorplan counts.
pub fn aggregate(
    homeplans: &[HomePlan],
    homesites: &[HomeSite],
    sink: &dyn DiagnosticSink,
) -> DetailsRange {
    let mut prices = Vec::new();
    let mut beds = Vec::new();
    let mut baths = Vec::new();
    let mut sqft = Vec::new();

    for site in homesites {
        if let Some(p) = site.price.as_deref().and_then(parse_price) {
            prices.push(p);
        }
        if let Some(b) = site.beds.as_deref() {
            beds.extend(parse_int_bounds(b));
        }
        if let Some(b) = site.baths.as_deref() {
            baths.extend(parse_decimal_bounds(b));
        }
        if let Some(s) = site.sqft.as_deref() {
            sqft.extend(parse_grouped_bounds(s));
        }
    }

    let stories: Vec<usize> = homeplans
        .iter()
        .filter_map(|p| p.floorplan_images.as_ref())
        .filter(|images| !images.is_empty())
        .map(Vec::len)
        .collect();

    let details = DetailsRange {
        price_range: render_range(&prices, price),
        sqft_range: render_range(&sqft, group_thousands),
        bed_range: render_range(&beds, |b: u32| b.to_string()),
        bath_range: render_range(&baths, plain),
        stories_range: render_range(&stories, |s: usize| s.to_string()),
        community_count: Some(1),
    };

    for (field, value) in [
        ("price_range", &details.price_range),
        ("sqft_range", &details.sqft_range),
        ("bed_range", &details.bed_range),
        ("bath_range", &details.bath_range),
        ("stories_range", &details.stories_range),
    ] {
        match value {
            Some(v) => info!(field, range = %v, "range computed"),
            None => sink.report(Diagnostic::AggregationGap { field }),
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::{FloorplanImage, PlanDetails};
    use crate::errors::TracingSink;

    fn site(price: Option<&str>, beds: Option<&str>, baths: Option<&str>, sqft: Option<&str>) -> HomeSite {
        HomeSite {
            name: None,
            plan: "Plan".into(),
            id: "1".into(),
            address: None,
            price: price.map(Into::into),
            beds: beds.map(Into::into),
            baths: baths.map(Into::into),
            sqft: sqft.map(Into::into),
            status: "Available".into(),
            image_url: None,
            url: None,
            latitude: None,
            longitude: None,
            overview: None,
            images: Vec::new(),
        }
    }

    fn plan_with_floors(name: &str, floors: usize) -> HomePlan {
        HomePlan {
            name: name.into(),
            url: None,
            details: PlanDetails::default(),
            floorplan_images: Some(
                (0..floors)
                    .map(|i| FloorplanImage {
                        name: format!("floor {i}"),
                        url: format!("https://img/{i}.png"),
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn equal_bounds_collapse() {
        assert_eq!(render_range(&[3u32, 3, 3], |v| v.to_string()), Some("3".into()));
        assert_eq!(render_range(&[350_000u64], price), Some("$350,000".into()));
        assert_eq!(render_range::<u32, _>(&[], |v| v.to_string()), None);
        assert_eq!(render_range(&[2.5, 2.5], plain), Some("2.5".into()));
    }

    #[test]
    fn ranges_across_homesites() {
        let sites = vec![
            site(Some("$350,000"), Some("3 - 4 bd"), Some("2 ba"), Some("1,800-2,200 ft²")),
            site(Some("$410,500"), Some("2 bd"), Some("2.5 - 3 ba"), Some("2,850+ ft²")),
            site(None, None, None, None),
        ];
        let details = aggregate(&[], &sites, &TracingSink);

        assert_eq!(details.price_range.as_deref(), Some("$350,000-$410,500"));
        assert_eq!(details.bed_range.as_deref(), Some("2-4"));
        assert_eq!(details.bath_range.as_deref(), Some("2-3"));
        assert_eq!(details.sqft_range.as_deref(), Some("1,800-2,850"));
        assert_eq!(details.stories_range, None);
        assert_eq!(details.community_count, Some(1));
    }

    #[test]
    fn empty_pools_stay_unset() {
        let details = aggregate(&[], &[], &TracingSink);
        assert_eq!(
            details,
            DetailsRange {
                community_count: Some(1),
                ..DetailsRange::default()
            }
        );
    }

    #[test]
    fn stories_from_floorplan_counts() {
        let plans = vec![plan_with_floors("A", 1), plan_with_floors("B", 2)];
        assert_eq!(
            aggregate(&plans, &[], &TracingSink).stories_range.as_deref(),
            Some("1-2")
        );

        let plans = vec![
            plan_with_floors("A", 1),
            plan_with_floors("B", 1),
            plan_with_floors("C", 0),
        ];
        assert_eq!(
            aggregate(&plans, &[], &TracingSink).stories_range.as_deref(),
            Some("1")
        );
    }
}
