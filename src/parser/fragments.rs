use std::sync::LazyLock;

use regex::Regex;

// geo_json_<hex>_add({"features": ... "type": "FeatureCollection"});
static GEOMETRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)geo_json_([a-f0-9]+)_add\((\{"features":.*?"FeatureCollection"\})\);"#).unwrap()
});
// geo_json_<hex>.bindTooltip(`<table>...Talhão / Cultura / Área (ha) cells...`)
static TOOLTIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)geo_json_([a-f0-9]+)\.bindTooltip.*?Talhão:.*?>(\w+)</td>.*?Cultura:.*?>(\w+)</td>.*?Área \(ha\):.*?>([\d.]+)</td>",
    )
    .unwrap()
});

/// Raw geometry payload as embedded in the page, not yet parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFragment {
    pub id: String,
    pub payload: String,
}

/// Raw tooltip cells as embedded in the page, not yet parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFragment {
    pub id: String,
    pub plot_name: String,
    pub crop_label: String,
    pub area: String,
}

/// Locates geometry and tooltip fragments in an exported map document.
///
/// Everything downstream only sees the fragments, so the matching strategy
/// can change without touching the join or the partitioning.
pub trait FragmentExtractor {
    fn geometry_fragments(&self, doc: &str) -> Vec<GeometryFragment>;
    fn metadata_fragments(&self, doc: &str) -> Vec<MetadataFragment>;
}

/// Regex scanner for the folium/Leaflet HTML export.
#[derive(Debug, Default, Clone, Copy)]
pub struct FoliumExtractor;

impl FragmentExtractor for FoliumExtractor {
    fn geometry_fragments(&self, doc: &str) -> Vec<GeometryFragment> {
        GEOMETRY_RE
            .captures_iter(doc)
            .map(|caps| GeometryFragment {
                id: caps[1].to_string(),
                payload: caps[2].to_string(),
            })
            .collect()
    }

    fn metadata_fragments(&self, doc: &str) -> Vec<MetadataFragment> {
        TOOLTIP_RE
            .captures_iter(doc)
            .map(|caps| MetadataFragment {
                id: caps[1].to_string(),
                plot_name: caps[2].to_string(),
                crop_label: caps[3].to_string(),
                area: caps[4].to_string(),
            })
            .collect()
    }
}
