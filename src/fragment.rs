use crate::error::ParseError;
use crate::geo::{LngLat, LngLatBounds};

/// Format a bounds box as `"{NWlat},{NWlng}-{SElat},{SElng}"`
pub fn serialize_bounds(bounds: &LngLatBounds) -> String {
    let nw = bounds.north_west();
    let se = bounds.south_east();
    format!("{},{}-{},{}", nw.lat, nw.lng, se.lat, se.lng)
}

/// Parse a string produced by [`serialize_bounds`]. A leading `#` is ignored.
pub fn deserialize_bounds(s: &str) -> Result<LngLatBounds, ParseError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ParseError::Bounds(s.to_string());

    // The corner separator is the first '-' that ends a number (spaces allowed
    // in between); any other '-' is a sign.
    let split = s
        .match_indices('-')
        .map(|(i, _)| i)
        .find(|&i| {
            s[..i]
                .trim_end()
                .bytes()
                .last()
                .is_some_and(|b| b.is_ascii_digit() || b == b'.')
        })
        .ok_or_else(bad)?;

    let nw = deserialize_lat_lng(&s[..split]).ok_or_else(bad)?;
    let se = deserialize_lat_lng(&s[split + 1..]).ok_or_else(bad)?;
    Ok(LngLatBounds::from_corners(nw, se))
}

fn deserialize_lat_lng(s: &str) -> Option<LngLat> {
    let mut parts = s.split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lng: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    Some(LngLat::new(lng, lat))
}

/// Address-bar style state holder: the current fragment plus navigation entries
pub trait History {
    /// Current fragment, without the leading `#`
    fn hash(&self) -> &str;

    /// Record a new fragment as the current state
    fn push_state(&mut self, fragment: String);
}

/// In-memory history for a terminal session. Every settle adds an entry.
#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: Vec<String>,
}

impl SessionHistory {
    /// Start from an optional initial fragment (e.g. from the command line)
    pub fn new(initial: Option<&str>) -> Self {
        let entries = initial
            .map(|s| s.trim_start_matches('#').to_string())
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl History for SessionHistory {
    fn hash(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or("")
    }

    fn push_state(&mut self, fragment: String) {
        self.entries.push(fragment);
    }
}
