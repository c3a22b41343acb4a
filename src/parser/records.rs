use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::fragments::{FragmentExtractor, GeometryFragment, MetadataFragment};
use crate::error::{SkipReason, Skipped};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub id: String,
    pub geometry: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub id: String,
    pub plot_name: String,
    pub crop_label: String,
    pub area_ha: f64,
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Value,
}

/// Parsed records plus what was dropped along the way.
#[derive(Debug, Default)]
pub struct Extracted {
    pub geometry_fragments: usize,
    pub metadata_fragments: usize,
    pub geometries: Vec<GeometryRecord>,
    pub metadata: Vec<MetadataRecord>,
    pub skipped: Vec<Skipped>,
}

/// Collapse whitespace runs to one space. The exporter wraps payloads at
/// arbitrary points, including inside string literals.
pub fn normalize_whitespace(payload: &str) -> Cow<'_, str> {
    WHITESPACE_RE.replace_all(payload, " ")
}

pub fn parse_geometry(fragment: &GeometryFragment) -> Result<GeometryRecord, SkipReason> {
    let clean = normalize_whitespace(&fragment.payload);
    let collection: RawCollection = serde_json::from_str(&clean)?;
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(SkipReason::EmptyCollection)?;
    if feature.geometry.is_null() {
        return Err(SkipReason::MissingGeometry);
    }
    if let Some(kind) = feature.geometry.get("type").and_then(Value::as_str) {
        if kind != "Polygon" {
            debug!(id = %fragment.id, kind, "Passing through non-polygon geometry");
        }
    }
    Ok(GeometryRecord {
        id: fragment.id.clone(),
        geometry: feature.geometry,
    })
}

pub fn parse_metadata(fragment: &MetadataFragment) -> Result<MetadataRecord, SkipReason> {
    let area_ha = fragment
        .area
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
        .ok_or_else(|| SkipReason::BadArea(fragment.area.clone()))?;
    Ok(MetadataRecord {
        id: fragment.id.clone(),
        plot_name: fragment.plot_name.clone(),
        crop_label: fragment.crop_label.clone(),
        area_ha,
    })
}

/// Scan the document and parse every fragment. Bad fragments are logged
/// and recorded in `skipped`; nothing here is fatal.
pub fn extract(doc: &str, extractor: &impl FragmentExtractor) -> Extracted {
    let geometry_fragments = extractor.geometry_fragments(doc);
    let metadata_fragments = extractor.metadata_fragments(doc);
    debug!(
        geometry = geometry_fragments.len(),
        metadata = metadata_fragments.len(),
        "Fragments found"
    );

    let mut out = Extracted {
        geometry_fragments: geometry_fragments.len(),
        metadata_fragments: metadata_fragments.len(),
        ..Default::default()
    };

    for fragment in &geometry_fragments {
        match parse_geometry(fragment) {
            Ok(record) => out.geometries.push(record),
            Err(reason) => {
                warn!(id = %fragment.id, %reason, "Skipping geometry fragment");
                out.skipped.push(Skipped {
                    id: fragment.id.clone(),
                    reason,
                });
            }
        }
    }

    for fragment in &metadata_fragments {
        match parse_metadata(fragment) {
            Ok(record) => out.metadata.push(record),
            Err(reason) => {
                warn!(id = %fragment.id, %reason, "Skipping tooltip fragment");
                out.skipped.push(Skipped {
                    id: fragment.id.clone(),
                    reason,
                });
            }
        }
    }

    out
}
