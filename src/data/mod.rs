pub mod kml;
mod source;
pub mod umap;

pub use source::{fetch, ContentKind, Fetched, Source};

use crate::category::Category;
use crate::error::ParseError;
use geojson::{Feature, FeatureCollection, Value};

/// One unit of loader output, sharing a single category
#[derive(Clone, Debug)]
pub enum Batch {
    /// A container that converted to exactly one point feature
    Single(Feature, Category),
    /// A layer or container holding many features, possibly non-point
    Collection(FeatureCollection, Category),
}

impl Batch {
    pub fn category(&self) -> &Category {
        match self {
            Batch::Single(_, category) | Batch::Collection(_, category) => category,
        }
    }

    /// Flatten into (point feature, category) pairs. Non-point members of a
    /// collection are skipped.
    pub fn pairs(&self) -> Box<dyn Iterator<Item = (&Feature, &Category)> + '_> {
        match self {
            Batch::Single(feature, category) => Box::new(std::iter::once((feature, category))),
            Batch::Collection(fc, category) => Box::new(
                fc.features
                    .iter()
                    .filter(|f| is_point(f))
                    .map(move |f| (f, category)),
            ),
        }
    }
}

/// True when the feature's geometry is a GeoJSON Point
pub fn is_point(feature: &Feature) -> bool {
    matches!(
        feature.geometry.as_ref().map(|g| &g.value),
        Some(Value::Point(_))
    )
}

/// Convert fetched text into batches according to its declared kind.
/// Unknown content is tried as JSON.
pub fn parse(content: &str, kind: ContentKind) -> Result<Vec<Batch>, ParseError> {
    match kind {
        ContentKind::Xml => {
            log::debug!("call XML data");
            kml::parse(content)
        }
        ContentKind::Json => {
            log::debug!("call JSON data");
            umap::parse(content)
        }
        ContentKind::Unknown => {
            log::debug!("unknown content kind, trying JSON");
            umap::parse(content)
        }
    }
}
