/// A geographic position in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build from a GeoJSON position (`[lng, lat, ...]`)
    pub fn from_position(coords: &[f64]) -> Option<Self> {
        match coords {
            [lng, lat, ..] => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }
}

/// Axis-aligned geographic rectangle stored as its south-west and north-east corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LngLatBounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

impl LngLatBounds {
    /// Box spanning two arbitrary corners
    pub fn from_corners(a: LngLat, b: LngLat) -> Self {
        Self {
            sw: LngLat::new(a.lng.min(b.lng), a.lat.min(b.lat)),
            ne: LngLat::new(a.lng.max(b.lng), a.lat.max(b.lat)),
        }
    }

    /// Degenerate box around a single point
    pub fn from_point(p: LngLat) -> Self {
        Self { sw: p, ne: p }
    }

    /// Grow to include a point. Never shrinks.
    pub fn extend(&mut self, p: LngLat) {
        self.sw.lng = self.sw.lng.min(p.lng);
        self.sw.lat = self.sw.lat.min(p.lat);
        self.ne.lng = self.ne.lng.max(p.lng);
        self.ne.lat = self.ne.lat.max(p.lat);
    }

    pub fn north_west(&self) -> LngLat {
        LngLat::new(self.sw.lng, self.ne.lat)
    }

    pub fn south_east(&self) -> LngLat {
        LngLat::new(self.ne.lng, self.sw.lat)
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.sw.lng + self.ne.lng) * 0.5,
            (self.sw.lat + self.ne.lat) * 0.5,
        )
    }
}

/// Extend an optional running box, starting it at the first point
pub fn extend_bounds(bounds: &mut Option<LngLatBounds>, p: LngLat) {
    match bounds {
        Some(b) => b.extend(p),
        None => *bounds = Some(LngLatBounds::from_point(p)),
    }
}

/// Strict containment via sign change: a point on any edge is outside.
#[inline(always)]
pub fn in_bounds(point: LngLat, bounds: &LngLatBounds) -> bool {
    let lng = (point.lng - bounds.ne.lng) * (point.lng - bounds.sw.lng) < 0.0;
    let lat = (point.lat - bounds.ne.lat) * (point.lat - bounds.sw.lat) < 0.0;
    lng && lat
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn okinawa() -> LngLatBounds {
        LngLatBounds::from_corners(LngLat::new(127.6, 26.1), LngLat::new(128.2, 26.9))
    }

    #[test]
    fn test_center_is_inside() {
        let b = okinawa();
        assert!(in_bounds(b.center(), &b));
    }

    #[rstest]
    #[case::west_edge(127.6, 26.5)]
    #[case::east_edge(128.2, 26.5)]
    #[case::south_edge(127.9, 26.1)]
    #[case::north_edge(127.9, 26.9)]
    #[case::corner(127.6, 26.9)]
    fn test_edges_are_outside(#[case] lng: f64, #[case] lat: f64) {
        assert!(!in_bounds(LngLat::new(lng, lat), &okinawa()));
    }

    #[rstest]
    #[case::west(127.6 - 1e-9, 26.5)]
    #[case::east(128.2 + 1e-9, 26.5)]
    #[case::south(127.9, 26.1 - 1e-9)]
    #[case::north(127.9, 26.9 + 1e-9)]
    fn test_epsilon_outside_single_axis(#[case] lng: f64, #[case] lat: f64) {
        assert!(!in_bounds(LngLat::new(lng, lat), &okinawa()));
    }

    #[test]
    fn test_corners_are_normalized() {
        let b = LngLatBounds::from_corners(LngLat::new(10.0, -5.0), LngLat::new(-10.0, 5.0));
        assert_eq!(b.sw, LngLat::new(-10.0, -5.0));
        assert_eq!(b.ne, LngLat::new(10.0, 5.0));
        assert_eq!(b.north_west(), LngLat::new(-10.0, 5.0));
        assert_eq!(b.south_east(), LngLat::new(10.0, -5.0));
    }

    #[test]
    fn test_extend_never_shrinks() {
        let mut bounds = None;
        extend_bounds(&mut bounds, LngLat::new(1.0, 1.0));
        extend_bounds(&mut bounds, LngLat::new(-2.0, 3.0));
        extend_bounds(&mut bounds, LngLat::new(0.0, 0.0));
        let b = bounds.unwrap();
        assert_eq!(b.sw, LngLat::new(-2.0, 0.0));
        assert_eq!(b.ne, LngLat::new(1.0, 3.0));
    }

    #[test]
    fn test_position_needs_two_values() {
        assert_eq!(LngLat::from_position(&[1.0]), None);
        assert_eq!(
            LngLat::from_position(&[1.0, 2.0, 30.0]),
            Some(LngLat::new(1.0, 2.0))
        );
    }
}
