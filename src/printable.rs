use crate::category::{Category, Legend};
use crate::data::{self, is_point, Batch, Source};
use crate::error::{MapError, ParseError};
use crate::fragment::{deserialize_bounds, serialize_bounds, History};
use crate::geo::{extend_bounds, in_bounds, LngLat, LngLatBounds};
use geojson::{Feature, FeatureCollection, JsonObject, Value};

/// The widget that owns the visible region
pub trait MapSurface {
    /// Currently visible bounds
    fn bounds(&self) -> LngLatBounds;

    /// Move and zoom so `bounds` is visible
    fn fit_bounds(&mut self, bounds: &LngLatBounds);
}

/// Receives the sorted list of visible points after every viewport settle
pub trait PoiListener {
    fn poi_filtered(&mut self, targets: &[&Poi]);
}

impl PoiListener for () {
    fn poi_filtered(&mut self, _targets: &[&Poi]) {}
}

/// A registered point feature, stamped with its category and layer id
#[derive(Clone, Debug)]
pub struct Poi {
    pub position: LngLat,
    pub properties: Option<JsonObject>,
    pub category: Category,
    pub layer_id: usize,
}

impl Poi {
    /// Display form of the `name` property
    pub fn name(&self) -> Option<String> {
        self.property("name")
    }

    pub fn description(&self) -> Option<String> {
        self.property("description")
    }

    /// Only points with a properties block and a `name` key are listed
    pub fn is_listed(&self) -> bool {
        self.properties
            .as_ref()
            .is_some_and(|p| p.contains_key("name"))
    }

    fn property(&self, key: &str) -> Option<String> {
        let value = self.properties.as_ref()?.get(key)?;
        Some(match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub description: String,
}

/// Rendering handle for one point. Created once, only its number changes.
#[derive(Clone, Debug)]
pub struct Marker {
    pub layer_id: usize,
    pub position: LngLat,
    pub color: String,
    /// Ordinal badge; 0 until the point is first listed
    pub number: usize,
    pub popup: Popup,
}

/// Marker, legend and bounds registry with viewport filtering
pub struct PrintableMap<L = ()> {
    legends: Vec<Legend>,
    pois: Vec<Poi>,
    markers: Vec<Marker>,
    next_layer_id: usize,
    bounds: Option<LngLatBounds>,
    visible: Vec<usize>,
    updated: Option<String>,
    listener: Option<L>,
}

impl<L: PoiListener> PrintableMap<L> {
    pub fn new(listener: Option<L>) -> Self {
        Self {
            legends: Vec::new(),
            pois: Vec::new(),
            markers: Vec::new(),
            next_layer_id: 0,
            bounds: None,
            visible: Vec::new(),
            updated: None,
            listener,
        }
    }

    /// Register one point feature under `category`
    pub fn add_marker(&mut self, feature: Feature, category: &Category) -> Result<(), ParseError> {
        let position = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) => {
                LngLat::from_position(coords).ok_or(ParseError::NotAPoint)?
            }
            _ => return Err(ParseError::NotAPoint),
        };
        let color = category
            .color
            .as_deref()
            .ok_or_else(|| ParseError::MissingColor(category.name.clone()))?;

        extend_bounds(&mut self.bounds, position);
        if !self.legends.iter().any(|l| l.name == category.name) {
            self.legends.push(Legend {
                name: category.name.clone(),
                color: color.to_string(),
            });
        }

        let poi = Poi {
            position,
            properties: feature.properties,
            category: category.clone(),
            layer_id: self.next_layer_id,
        };
        self.markers.push(Marker {
            layer_id: poi.layer_id,
            position,
            color: color.to_lowercase(),
            number: 0,
            popup: Popup {
                title: format!("Name: {}", poi.name().unwrap_or_default()),
                description: poi.description().unwrap_or_default(),
            },
        });
        self.pois.push(poi);
        self.next_layer_id += 1;
        Ok(())
    }

    /// Register every Point member of a collection; other geometries are skipped
    pub fn add_feature_collection(
        &mut self,
        features: FeatureCollection,
        category: &Category,
    ) -> Result<(), ParseError> {
        for feature in features.features {
            if is_point(&feature) {
                self.add_marker(feature, category)?;
            } else {
                log::debug!("skipping non-point feature in {:?}", category.name);
            }
        }
        Ok(())
    }

    /// Feed loader output into the registry
    pub fn ingest(&mut self, batches: &[Batch]) -> Result<(), ParseError> {
        for batch in batches {
            for (feature, category) in batch.pairs() {
                self.add_marker(feature.clone(), category)?;
            }
        }
        Ok(())
    }

    /// Fetch, parse and register a data source, then fit the surface.
    /// Legends and data bounds restart; registered points are kept.
    pub fn load_file(
        &mut self,
        source: &Source,
        surface: &mut dyn MapSurface,
        history: &dyn History,
    ) -> Result<(), MapError> {
        self.legends.clear();
        self.bounds = None;

        let fetched = data::fetch(source)?;
        self.updated = fetched.updated;
        let batches = data::parse(&fetched.content, fetched.kind)?;
        self.ingest(&batches)?;
        log::debug!("legends length is {}", self.legends.len());

        self.fit_bounds(surface, history);
        Ok(())
    }

    /// Fit to the bounds in the current fragment, or to the data when the
    /// fragment does not parse
    pub fn fit_bounds(&self, surface: &mut dyn MapSurface, history: &dyn History) {
        match deserialize_bounds(history.hash()) {
            Ok(bounds) => surface.fit_bounds(&bounds),
            Err(e) => {
                log::debug!("{e}, fitting to data");
                self.fit_data_bounds(surface);
            }
        }
    }

    pub fn fit_data_bounds(&self, surface: &mut dyn MapSurface) {
        if let Some(bounds) = &self.bounds {
            surface.fit_bounds(bounds);
        }
    }

    /// Viewport settle: record the fragment, list the visible named points
    /// sorted by category name (descending, stable), number their markers and
    /// notify the listener. Markers that left the view keep their old number.
    pub fn move_end(&mut self, surface: &dyn MapSurface, history: &mut dyn History) {
        let bounds = surface.bounds();
        history.push_state(serialize_bounds(&bounds));

        let mut targets: Vec<&Poi> = self
            .pois
            .iter()
            .filter(|poi| in_bounds(poi.position, &bounds) && poi.is_listed())
            .collect();
        targets.sort_by(|a, b| b.category.name.cmp(&a.category.name));

        for (index, poi) in targets.iter().enumerate() {
            self.markers[poi.layer_id].number = index + 1;
        }
        log::trace!("{} of {} points visible", targets.len(), self.pois.len());

        if let Some(listener) = self.listener.as_mut() {
            listener.poi_filtered(&targets);
        }
        self.visible = targets.iter().map(|poi| poi.layer_id).collect();
    }

    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Running box around every point registered since the last load
    pub fn bounds(&self) -> Option<&LngLatBounds> {
        self.bounds.as_ref()
    }

    /// Sorted visible points from the last settle
    pub fn visible(&self) -> impl Iterator<Item = &Poi> + '_ {
        self.visible.iter().map(|&id| &self.pois[id])
    }

    /// Server date of the last fetch, when the transport provided one
    pub fn updated(&self) -> Option<&str> {
        self.updated.as_deref()
    }

    pub fn listener(&self) -> Option<&L> {
        self.listener.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContentKind;
    use crate::fragment::SessionHistory;
    use geojson::{Geometry, JsonValue};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    struct FixedSurface {
        bounds: LngLatBounds,
        fitted: Option<LngLatBounds>,
    }

    impl FixedSurface {
        fn new(w: f64, s: f64, e: f64, n: f64) -> Self {
            Self {
                bounds: LngLatBounds::from_corners(LngLat::new(w, s), LngLat::new(e, n)),
                fitted: None,
            }
        }
    }

    impl MapSurface for FixedSurface {
        fn bounds(&self) -> LngLatBounds {
            self.bounds
        }

        fn fit_bounds(&mut self, bounds: &LngLatBounds) {
            self.fitted = Some(*bounds);
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Vec<usize>>,
    }

    impl PoiListener for Recorder {
        fn poi_filtered(&mut self, targets: &[&Poi]) {
            self.calls.push(targets.iter().map(|p| p.layer_id).collect());
        }
    }

    fn point(lng: f64, lat: f64, name: Option<&str>) -> Feature {
        let mut properties = JsonObject::new();
        if let Some(name) = name {
            properties.insert("name".into(), JsonValue::String(name.into()));
        }
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn test_layer_ids_are_sequential() {
        let mut map = PrintableMap::<()>::new(None);
        let cat = Category::new("Shelter", "Blue");
        for i in 0..5 {
            map.add_marker(point(i as f64, 0.0, Some("p")), &cat).unwrap();
        }
        let ids: Vec<usize> = map.pois().iter().map(|p| p.layer_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        let marker_ids: Vec<usize> = map.markers().iter().map(|m| m.layer_id).collect();
        assert_eq!(marker_ids, ids);
    }

    #[test]
    fn test_legend_dedup_first_color_wins() {
        let mut map = PrintableMap::<()>::new(None);
        map.add_marker(point(0.0, 0.0, None), &Category::new("Hospital", "Red")).unwrap();
        map.add_marker(point(1.0, 0.0, None), &Category::new("Shelter", "Blue")).unwrap();
        map.add_marker(point(2.0, 0.0, None), &Category::new("Hospital", "Green")).unwrap();
        map.add_marker(point(3.0, 0.0, None), &Category::new("hospital", "Pink")).unwrap();

        let legend: Vec<(&str, &str)> = map
            .legends()
            .iter()
            .map(|l| (l.name.as_str(), l.color.as_str()))
            .collect();
        assert_eq!(
            legend,
            vec![("Hospital", "Red"), ("Shelter", "Blue"), ("hospital", "Pink")]
        );
        let names: BTreeSet<&str> = map.pois().iter().map(|p| p.category.name.as_str()).collect();
        let legend_names: BTreeSet<&str> = map.legends().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, legend_names);
    }

    #[test]
    fn test_marker_color_and_popup() {
        let mut map = PrintableMap::<()>::new(None);
        let mut feature = point(1.0, 2.0, Some("Gym"));
        feature
            .properties
            .as_mut()
            .unwrap()
            .insert("description".into(), JsonValue::String("2F".into()));
        map.add_marker(feature, &Category::new("Shelter", "#00AAFF")).unwrap();
        map.add_marker(point(1.0, 2.0, None), &Category::new("Shelter", "Blue")).unwrap();

        let marker = &map.markers()[0];
        assert_eq!(marker.color, "#00aaff");
        assert_eq!(marker.number, 0);
        assert_eq!(
            marker.popup,
            Popup {
                title: "Name: Gym".into(),
                description: "2F".into()
            }
        );
        assert_eq!(map.markers()[1].popup.description, "");
    }

    #[test]
    fn test_missing_color_is_rejected() {
        let mut map = PrintableMap::<()>::new(None);
        let category = Category {
            name: "Plain".into(),
            ..Default::default()
        };
        let err = map.add_marker(point(0.0, 0.0, None), &category).unwrap_err();
        assert!(matches!(err, ParseError::MissingColor(name) if name == "Plain"));
        assert!(map.pois().is_empty());
        assert!(map.legends().is_empty());
        assert!(map.bounds().is_none());
    }

    #[test]
    fn test_non_point_marker_is_rejected() {
        let mut map = PrintableMap::<()>::new(None);
        let mut feature = point(0.0, 0.0, None);
        feature.geometry = Some(Geometry::new(Value::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        ])));
        let err = map.add_marker(feature, &Category::new("Road", "Gray")).unwrap_err();
        assert!(matches!(err, ParseError::NotAPoint));
    }

    #[test]
    fn test_feature_collection_skips_non_points() {
        let mut map = PrintableMap::<()>::new(None);
        let mut line = point(0.0, 0.0, None);
        line.geometry = Some(Geometry::new(Value::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        ])));
        let fc = FeatureCollection {
            bbox: None,
            features: vec![point(5.0, 5.0, Some("a")), line, point(6.0, 6.0, Some("b"))],
            foreign_members: None,
        };
        map.add_feature_collection(fc, &Category::new("Mixed", "Gray")).unwrap();
        assert_eq!(map.pois().len(), 2);
        assert_eq!(map.pois()[1].layer_id, 1);
    }

    #[test]
    fn test_move_end_sorts_descending_and_stable() {
        let mut map = PrintableMap::new(Some(Recorder::default()));
        map.add_marker(point(1.0, 1.0, Some("h1")), &Category::new("Hospital", "Red")).unwrap();
        map.add_marker(point(2.0, 2.0, Some("s1")), &Category::new("Shelter", "Blue")).unwrap();
        map.add_marker(point(3.0, 3.0, Some("h2")), &Category::new("Hospital", "Red")).unwrap();

        let surface = FixedSurface::new(0.0, 0.0, 10.0, 10.0);
        let mut history = SessionHistory::default();
        map.move_end(&surface, &mut history);

        let categories: Vec<&str> = map.visible().map(|p| p.category.name.as_str()).collect();
        assert_eq!(categories, vec!["Shelter", "Hospital", "Hospital"]);
        let names: Vec<String> = map.visible().filter_map(|p| p.name()).collect();
        assert_eq!(names, vec!["s1", "h1", "h2"]);

        let numbers: Vec<usize> = map.markers().iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![2, 1, 3]);
        assert_eq!(map.listener().unwrap().calls, vec![vec![1, 0, 2]]);
        assert_eq!(history.hash(), "10,0-0,10");
    }

    #[test]
    fn test_move_end_filters_bounds_and_unnamed() {
        let mut map = PrintableMap::new(Some(Recorder::default()));
        let cat = Category::new("Shelter", "Blue");
        map.add_marker(point(1.0, 1.0, Some("inside")), &cat).unwrap();
        map.add_marker(point(2.0, 2.0, None), &cat).unwrap();
        map.add_marker(point(20.0, 2.0, Some("outside")), &cat).unwrap();
        map.add_marker(point(10.0, 5.0, Some("on edge")), &cat).unwrap();
        let mut bare = point(3.0, 3.0, None);
        bare.properties = None;
        map.add_marker(bare, &cat).unwrap();

        let mut history = SessionHistory::default();
        map.move_end(&FixedSurface::new(0.0, 0.0, 10.0, 10.0), &mut history);
        assert_eq!(map.listener().unwrap().calls, vec![vec![0]]);
    }

    #[test]
    fn test_hidden_markers_keep_stale_numbers() {
        let mut map = PrintableMap::<()>::new(None);
        let cat = Category::new("Shelter", "Blue");
        map.add_marker(point(1.0, 1.0, Some("a")), &cat).unwrap();
        map.add_marker(point(5.0, 5.0, Some("b")), &cat).unwrap();

        let mut history = SessionHistory::default();
        map.move_end(&FixedSurface::new(0.0, 0.0, 10.0, 10.0), &mut history);
        map.move_end(&FixedSurface::new(4.0, 4.0, 10.0, 10.0), &mut history);

        let numbers: Vec<usize> = map.markers().iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 1]);
        assert_eq!(map.visible().count(), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_fit_prefers_fragment() {
        let mut map = PrintableMap::<()>::new(None);
        map.add_marker(point(1.0, 1.0, None), &Category::new("A", "Red")).unwrap();
        map.add_marker(point(3.0, 4.0, None), &Category::new("A", "Red")).unwrap();

        let mut surface = FixedSurface::new(0.0, 0.0, 1.0, 1.0);
        map.fit_bounds(&mut surface, &SessionHistory::new(Some("#20,10-15,12")));
        assert_eq!(
            surface.fitted,
            Some(LngLatBounds::from_corners(LngLat::new(10.0, 15.0), LngLat::new(12.0, 20.0)))
        );

        map.fit_bounds(&mut surface, &SessionHistory::new(Some("#garbage")));
        assert_eq!(
            surface.fitted,
            Some(LngLatBounds::from_corners(LngLat::new(1.0, 1.0), LngLat::new(3.0, 4.0)))
        );
    }

    #[test]
    fn test_grouped_layers_end_to_end() {
        let json = r##"{"layers": [
            {"_umap_options": {"name": "Hospital", "color": "Red"}, "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.70, 26.20]}, "properties": {"name": "H1"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.75, 26.25]}, "properties": {"name": "H2"}}
            ]},
            {"_umap_options": {"name": "Shelter", "color": "Blue"}, "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.60, 26.10]}, "properties": {"name": "S1"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.90, 26.40]}, "properties": {"name": "S2"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.80, 26.30]}, "properties": {"name": "S3"}}
            ]}
        ]}"##;
        let mut map = PrintableMap::<()>::new(None);
        map.ingest(&data::parse(json, ContentKind::Json).unwrap()).unwrap();

        assert_eq!(map.pois().len(), 5);
        assert_eq!(map.legends().len(), 2);
        let bounds = map.bounds().unwrap();
        assert_eq!(bounds.sw, LngLat::new(127.60, 26.10));
        assert_eq!(bounds.ne, LngLat::new(127.90, 26.40));
        let ids: Vec<usize> = map.pois().iter().map(|p| p.layer_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_load_file_resets_legends_but_keeps_points() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".kml").tempfile().unwrap();
        write!(
            file,
            r#"<kml><Folder><name>Shelter</name>
                <Placemark><name>Gym</name><Point><coordinates>127.8,26.3</coordinates></Point></Placemark>
                <Placemark><name>Hall</name><Point><coordinates>127.9,26.4</coordinates></Point></Placemark>
            </Folder></kml>"#
        )
        .unwrap();
        let source = Source::File(file.path().to_path_buf());

        let mut map = PrintableMap::<()>::new(None);
        let mut surface = FixedSurface::new(0.0, 0.0, 1.0, 1.0);
        let history = SessionHistory::default();
        map.load_file(&source, &mut surface, &history).unwrap();
        map.load_file(&source, &mut surface, &history).unwrap();

        assert_eq!(map.pois().len(), 4);
        assert_eq!(map.pois()[3].layer_id, 3);
        assert_eq!(map.legends().len(), 1);
        assert_eq!(
            surface.fitted,
            Some(LngLatBounds::from_corners(LngLat::new(127.8, 26.3), LngLat::new(127.9, 26.4)))
        );
    }
}
