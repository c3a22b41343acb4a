use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::classify::{HighlightRule, JoinedFeature, PlotProperties};
use super::records::{GeometryRecord, MetadataRecord};

#[derive(Debug, Default)]
pub struct Correlation {
    pub joined: Vec<JoinedFeature>,
    /// Geometry ids with no tooltip, in document order.
    pub orphan_geometries: Vec<String>,
    /// Tooltip ids no geometry asked for, sorted.
    pub orphan_metadata: Vec<String>,
    /// Ids seen more than once on either side, sorted.
    pub duplicate_ids: Vec<String>,
}

/// Join geometries to tooltips by identifier.
///
/// Duplicate tooltip ids resolve last-write-wins, with a warning. Geometries
/// without a tooltip are dropped. Output keeps geometry order.
pub fn correlate(
    geometries: Vec<GeometryRecord>,
    metadata: Vec<MetadataRecord>,
    rule: &HighlightRule,
) -> Correlation {
    let mut duplicates: HashSet<String> = HashSet::new();
    let mut by_id: HashMap<String, MetadataRecord> = HashMap::with_capacity(metadata.len());
    for record in metadata {
        if let Some(previous) = by_id.insert(record.id.clone(), record) {
            warn!(
                id = %previous.id,
                dropped = %previous.plot_name,
                "Duplicate tooltip id; keeping the later one"
            );
            duplicates.insert(previous.id);
        }
    }

    let mut out = Correlation::default();
    let mut seen_geometry: HashSet<String> = HashSet::new();
    let mut used: HashSet<&str> = HashSet::new();
    let mut joined = Vec::with_capacity(geometries.len());

    for geometry in geometries {
        if !seen_geometry.insert(geometry.id.clone()) {
            warn!(id = %geometry.id, "Duplicate geometry id");
            duplicates.insert(geometry.id.clone());
        }

        let Some(meta) = by_id.get(&geometry.id) else {
            debug!(id = %geometry.id, "No tooltip for geometry, dropping");
            out.orphan_geometries.push(geometry.id);
            continue;
        };
        used.insert(meta.id.as_str());

        let is_highlighted = rule.is_highlighted(&meta.plot_name, &meta.crop_label);
        if is_highlighted {
            info!("✓ {} {}: {:?} ha", meta.crop_label, meta.plot_name, meta.area_ha);
        } else {
            debug!("  {} {}: {:?} ha", meta.crop_label, meta.plot_name, meta.area_ha);
        }

        joined.push(JoinedFeature {
            id: geometry.id,
            kind: "Feature",
            geometry: geometry.geometry,
            properties: PlotProperties {
                plot_name: meta.plot_name.clone(),
                crop_label: meta.crop_label.clone(),
                area_ha: meta.area_ha,
                is_highlighted,
            },
        });
    }

    let mut orphan_metadata: Vec<String> = by_id
        .keys()
        .filter(|id| !used.contains(id.as_str()))
        .cloned()
        .collect();
    orphan_metadata.sort();

    let mut duplicate_ids: Vec<String> = duplicates.into_iter().collect();
    duplicate_ids.sort();

    out.joined = joined;
    out.orphan_metadata = orphan_metadata;
    out.duplicate_ids = duplicate_ids;
    out
}
