//! Coordinate extraction from free text.
//!
//! Recognized, in order:
//! 1. A plain pair, the whole message: `12.345,67.890` (a space after the comma is tolerated)
//! 2. A long-form map URL with `@<lat>,<lon>` or `?q=<lat>,<lon>` / `&q=<lat>,<lon>`;
//!    the earliest match in the text wins
//! 3. A map short link, which needs expanding before (2) can apply
//!
//! Anything else yields nothing, and pairs outside WGS-84 ranges count as
//! nothing too.

use lastmile_geo::Coordinate;
use lastmile_routing::is_short_link;
use once_cell::sync::Lazy;
use regex::Regex;

static PLAIN_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?\d{1,3}\.\d+), ?(-?\d{1,3}\.\d+)$").unwrap());

static AT_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(-?\d{1,3}\.\d+),(-?\d{1,3}\.\d+)").unwrap());

static QUERY_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]q=(-?\d{1,3}\.\d+)(?:,|%2C|%2c)(-?\d{1,3}\.\d+)").unwrap());

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://[^\s<>]+").unwrap());

/// What a message contains.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Coordinates found directly
    Point(Coordinate),
    /// A short link that must be expanded first
    ShortLink(String),
}

/// Find a location in a message.
///
/// # Example
/// ```
/// use lastmile_bot::parse::{extract, Extracted};
/// use lastmile_geo::Coordinate;
///
/// let found = extract("https://www.google.com/maps/place/X/@12.345,67.890,15z");
/// assert_eq!(found, Some(Extracted::Point(Coordinate::new(12.345, 67.89))));
/// assert_eq!(extract("not a location"), None);
/// ```
pub fn extract(text: &str) -> Option<Extracted> {
    if let Some(point) = extract_coordinates(text) {
        return Some(Extracted::Point(point));
    }
    URL.find_iter(text)
        .map(|m| m.as_str())
        .find(|url| is_short_link(url))
        .map(|url| Extracted::ShortLink(url.to_string()))
}

/// Coordinates from a plain pair or long-form map URL.
pub fn extract_coordinates(text: &str) -> Option<Coordinate> {
    let text = text.trim();

    if let Some(caps) = PLAIN_PAIR.captures(text) {
        return to_coordinate(&caps[1], &caps[2]);
    }

    let at = AT_PAIR.captures(text);
    let query = QUERY_PAIR.captures(text);
    let caps = match (at, query) {
        (Some(a), Some(q)) => {
            let a_start = a.get(0).map_or(usize::MAX, |m| m.start());
            let q_start = q.get(0).map_or(usize::MAX, |m| m.start());
            if a_start <= q_start { a } else { q }
        }
        (Some(a), None) => a,
        (None, Some(q)) => q,
        (None, None) => return None,
    };
    to_coordinate(&caps[1], &caps[2])
}

fn to_coordinate(lat: &str, lon: &str) -> Option<Coordinate> {
    let coordinate = Coordinate::new(lat.parse().ok()?, lon.parse().ok()?);
    coordinate.is_valid().then_some(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Option<Coordinate> {
        Some(Coordinate::new(lat, lon))
    }

    #[test]
    fn test_plain_pair() {
        assert_eq!(extract_coordinates("12.3450,67.8900"), point(12.345, 67.89));
        assert_eq!(extract_coordinates("-33.8688,151.2093"), point(-33.8688, 151.2093));
        assert_eq!(extract_coordinates(" 12.345, 67.89 "), point(12.345, 67.89));
    }

    #[test]
    fn test_plain_pair_requires_decimals() {
        assert_eq!(extract_coordinates("12,67"), None);
        assert_eq!(extract_coordinates("meet at 12.345,67.890 please"), None);
    }

    #[test]
    fn test_at_url() {
        let text = "https://www.google.com/maps/place/X/@12.345,67.890,15z";
        assert_eq!(extract_coordinates(text), point(12.345, 67.89));
    }

    #[test]
    fn test_query_url() {
        assert_eq!(
            extract_coordinates("https://maps.google.com/?q=12.345,67.890"),
            point(12.345, 67.89)
        );
        assert_eq!(
            extract_coordinates("https://www.google.com/maps/search/?api=1&q=12.345%2C67.890"),
            point(12.345, 67.89)
        );
    }

    #[test]
    fn test_earliest_match_wins() {
        let text = "https://www.google.com/maps?q=1.5,2.5 and https://www.google.com/maps/@3.5,4.5,10z";
        assert_eq!(extract_coordinates(text), point(1.5, 2.5));

        let text = "https://www.google.com/maps/@3.5,4.5,10z?q=1.5,2.5";
        assert_eq!(extract_coordinates(text), point(3.5, 4.5));
    }

    #[test]
    fn test_out_of_range_is_nothing() {
        assert_eq!(extract_coordinates("123.456,67.890"), None);
        assert_eq!(extract_coordinates("https://x.test/@12.5,190.5,3z"), None);
    }

    #[test]
    fn test_short_link() {
        assert_eq!(
            extract("look here https://maps.app.goo.gl/AbC123xyz thanks"),
            Some(Extracted::ShortLink("https://maps.app.goo.gl/AbC123xyz".into()))
        );
        assert_eq!(
            extract("https://goo.gl/maps/q1w2e3"),
            Some(Extracted::ShortLink("https://goo.gl/maps/q1w2e3".into()))
        );
        assert_eq!(
            extract("https://example.com/menu then https://maps.app.goo.gl/Zz9"),
            Some(Extracted::ShortLink("https://maps.app.goo.gl/Zz9".into()))
        );
        assert_eq!(extract("https://evilgoo.gl/x"), None);
    }

    #[test]
    fn test_not_a_location() {
        assert_eq!(extract("not a location"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("https://example.com/maps"), None);
    }
}
