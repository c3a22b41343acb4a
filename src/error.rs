use thiserror::Error;

/// Why a single fragment was left out of the output. Never fatal.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("malformed feature collection: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("feature collection has no features")]
    EmptyCollection,
    #[error("first feature has no geometry")]
    MissingGeometry,
    #[error("area is not a non-negative number: {0:?}")]
    BadArea(String),
    #[error("no tooltip metadata for this geometry")]
    NoMetadata,
}

impl SkipReason {
    /// Short stable label, used for grouping in reports.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MalformedJson(_) => "malformed_json",
            SkipReason::EmptyCollection => "empty_collection",
            SkipReason::MissingGeometry => "missing_geometry",
            SkipReason::BadArea(_) => "bad_area",
            SkipReason::NoMetadata => "no_metadata",
        }
    }
}

/// A fragment that was dropped, with the identifier it carried.
#[derive(Debug)]
pub struct Skipped {
    pub id: String,
    pub reason: SkipReason,
}
