use thiserror::Error;

/// Failures while turning text (data files, bounds strings) into map data
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed bounds string {0:?}")]
    Bounds(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("data is neither a grouped-layer JSON nor a KML document")]
    UnrecognizedShape,

    #[error("container <{0}> has no <name>")]
    MissingName(String),

    #[error("invalid coordinates {0:?}")]
    Coordinates(String),

    #[error("feature has no point geometry")]
    NotAPoint,

    #[error("category {0:?} has no color")]
    MissingColor(String),
}

/// Errors surfaced by loading a data source
#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
