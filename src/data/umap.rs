//! Grouped-layer JSON as exported by uMap: a `layers` array where every layer
//! carries its category in `_umap_options` and its points in `features`.

use super::Batch;
use crate::category::Category;
use crate::error::ParseError;
use geojson::{Feature, FeatureCollection};
use serde::Deserialize;

#[derive(Deserialize)]
struct UmapLayer {
    #[serde(rename = "_umap_options")]
    options: Category,
    #[serde(default)]
    features: Vec<Feature>,
}

/// Parse a uMap document into one collection batch per layer
pub fn parse(content: &str) -> Result<Vec<Batch>, ParseError> {
    let mut doc: serde_json::Value = serde_json::from_str(content)?;
    let layers = match doc.get_mut("layers") {
        Some(layers @ serde_json::Value::Array(_)) => layers.take(),
        _ => return Err(ParseError::UnrecognizedShape),
    };
    let layers: Vec<UmapLayer> = serde_json::from_value(layers)?;

    Ok(layers
        .into_iter()
        .map(|layer| {
            let fc = FeatureCollection {
                bbox: None,
                features: layer.features,
                foreign_members: None,
            };
            Batch::Collection(fc, layer.options)
        })
        .collect())
}
