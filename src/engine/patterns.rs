//! Text patterns shared by the field extractor, the plan linker and the aggregator.

use regex::Regex;
use std::sync::LazyLock;

static RE_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+(?:,\d{3})*").unwrap());

static RE_BEDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?)\s*Bed").unwrap()
});

static RE_BATHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?)\s*Bath").unwrap()
});

// low[+] [- high[+]] directly before "Sq"
static RE_SQFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,3}(?:,\d{3})+\+?|\d+\+?)(?:\s*-\s*(\d{1,3}(?:,\d{3})+\+?|\d+\+?))?\s*sq",
    )
    .unwrap()
});

static RE_LAT_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""Latitude"\s*:\s*"([-\d.]+)""#).unwrap());
static RE_LNG_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""Longitude"\s*:\s*"([-\d.]+)""#).unwrap());
static RE_LAT_LOOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"latitude["\s:]+([-\d.]+)"#).unwrap());
static RE_LNG_LOOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"longitude["\s:]+([-\d.]+)"#).unwrap());

static RE_POSTAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\d{5}$").unwrap());
static RE_LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s*").unwrap());
static RE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static RE_INT_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\s*-\s*(\d+))?").unwrap());
static RE_DECIMAL_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)(?:\s*-\s*(\d+(?:\.\d+)?))?").unwrap());
static RE_GROUPED_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:,\d{3})*)\+?(?:\s*-\s*(\d+(?:,\d{3})*)\+?)?").unwrap()
});

const STOP_WORDS: [&str; 5] = ["the", "and", "or", "with", "from"];

/// First `$`-prefixed, comma-grouped amount, e.g. `"$350,000"`.
pub fn extract_price(text: &str) -> Option<String> {
    RE_PRICE.find(text).map(|m| m.as_str().to_string())
}

/// Bedroom count or range as written, e.g. `"3 - 4"`.
pub fn extract_beds(text: &str) -> Option<String> {
    RE_BEDS.captures(text).map(|c| c[1].trim().to_string())
}

/// Bathroom count or range as written, e.g. `"2.5"`.
pub fn extract_baths(text: &str) -> Option<String> {
    RE_BATHS.captures(text).map(|c| c[1].trim().to_string())
}

/// Square footage with commas and `+` kept; a hyphen joins a genuine range.
pub fn extract_sqft(text: &str) -> Option<String> {
    let caps = RE_SQFT.captures(text)?;
    let low = caps.get(1)?.as_str();
    Some(match caps.get(2) {
        Some(high) => format!("{low}-{}", high.as_str()),
        None => low.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Coordinate embedded in a script or page source.
///
/// Tries `"Latitude":"27.36"` first, then the looser `latitude: 27.36`.
/// The first occurrence that parses as a number wins.
pub fn extract_coordinate(text: &str, axis: Axis) -> Option<f64> {
    let (quoted, loose) = match axis {
        Axis::Latitude => (&*RE_LAT_QUOTED, &*RE_LAT_LOOSE),
        Axis::Longitude => (&*RE_LNG_QUOTED, &*RE_LNG_LOOSE),
    };

    [quoted, loose].into_iter().find_map(|re| {
        re.captures_iter(text)
            .find_map(|c| c[1].parse::<f64>().ok())
    })
}

/// Drops a trailing 5-digit postal code from an address line.
pub fn strip_postal_code(address: &str) -> String {
    RE_POSTAL_SUFFIX.replace(address.trim(), "").into_owned()
}

/// First run of digits in the last path segment of `url`.
pub fn url_numeric_id(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    RE_DIGITS.find(last).map(|m| m.as_str().to_string())
}

/// Label for a neighborhood feature line.
pub fn classify_amenity(description: &str) -> String {
    let text = RE_LEADING_NUMBER.replace(description, "");

    let label = if text.contains("Home") {
        Some("Home Designs")
    } else if text.contains("Floor") {
        Some("Floor Plans")
    } else if ["Square", "Sq", "sq.ft"].iter().any(|w| text.contains(w)) {
        Some("Square Footage")
    } else if text.contains("Bath") {
        Some("Bathrooms")
    } else if text.contains("Bed") {
        Some("Bedrooms")
    } else if text.contains("Stories") || text.to_lowercase().contains("story") {
        Some("Stories")
    } else if text.contains("Price") {
        Some("Price Range")
    } else {
        None
    };

    if let Some(label) = label {
        return label.to_string();
    }

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .take(2)
        .collect();

    if words.is_empty() {
        description.chars().take(30).collect()
    } else {
        words.join(" ")
    }
}

/// "1st", "2nd", "3rd", "4th", "11th", "22nd", ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Integer price from text like `"$350,000"`.
pub fn parse_price(text: &str) -> Option<u64> {
    let m = RE_PRICE.find(text)?;
    m.as_str()[1..].replace(',', "").parse().ok()
}

/// One or both bounds of an integer range such as `"3 - 4 bd"`.
pub fn parse_int_bounds(text: &str) -> Vec<u32> {
    bounds(&RE_INT_RANGE, text, |s| s.parse().ok())
}

/// One or both bounds of a decimal range such as `"2.5 - 3 ba"`.
pub fn parse_decimal_bounds(text: &str) -> Vec<f64> {
    bounds(&RE_DECIMAL_RANGE, text, |s| s.parse().ok())
}

/// One or both bounds of a comma-grouped range such as `"1,800-2,200 ft²"`.
pub fn parse_grouped_bounds(text: &str) -> Vec<u64> {
    bounds(&RE_GROUPED_RANGE, text, |s| s.replace(',', "").parse().ok())
}

fn bounds<T>(re: &Regex, text: &str, parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    let Some(caps) = re.captures(text) else {
        return Vec::new();
    };
    [caps.get(1), caps.get(2)]
        .into_iter()
        .flatten()
        .filter_map(|m| parse(m.as_str()))
        .collect()
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
