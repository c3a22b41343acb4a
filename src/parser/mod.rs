pub mod classify;
pub mod correlate;
pub mod fragments;
pub mod records;

use std::collections::BTreeMap;

use crate::error::{SkipReason, Skipped};
use classify::{HighlightRule, JoinedFeature, Partition};
use fragments::FragmentExtractor;

/// Counts and leftovers from one pass, for the console and for `--strict`.
#[derive(Debug, Default)]
pub struct Report {
    pub geometry_fragments: usize,
    pub metadata_fragments: usize,
    pub joined: usize,
    pub skipped: Vec<Skipped>,
    pub orphan_metadata: Vec<String>,
    pub duplicate_ids: Vec<String>,
}

impl Report {
    pub fn skipped_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.skipped {
            *counts.entry(s.reason.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn print(&self) {
        println!("Geometry fragments: {}", self.geometry_fragments);
        println!("Tooltip fragments:  {}", self.metadata_fragments);
        println!("Joined:             {}", self.joined);
        println!("Skipped:            {}", self.skipped.len());
        for (label, n) in self.skipped_by_reason() {
            println!("  {:<18} {}", label, n);
        }
        println!("Orphan tooltips:    {}", self.orphan_metadata.len());
        if self.duplicate_ids.is_empty() {
            println!("Duplicate ids:      0");
        } else {
            println!(
                "Duplicate ids:      {} ({})",
                self.duplicate_ids.len(),
                self.duplicate_ids.join(", ")
            );
        }
    }
}

pub struct Processed {
    pub partition: Partition,
    pub report: Report,
}

/// Extract and join: document → records → joined features.
pub fn correlate_document(
    doc: &str,
    extractor: &impl FragmentExtractor,
    rule: &HighlightRule,
) -> (Vec<JoinedFeature>, Report) {
    let extracted = records::extract(doc, extractor);
    let mut skipped = extracted.skipped;
    let c = correlate::correlate(extracted.geometries, extracted.metadata, rule);

    skipped.extend(c.orphan_geometries.into_iter().map(|id| Skipped {
        id,
        reason: SkipReason::NoMetadata,
    }));

    let report = Report {
        geometry_fragments: extracted.geometry_fragments,
        metadata_fragments: extracted.metadata_fragments,
        joined: c.joined.len(),
        skipped,
        orphan_metadata: c.orphan_metadata,
        duplicate_ids: c.duplicate_ids,
    };
    (c.joined, report)
}

/// Full pipeline: extract, join, then split into highlighted and other.
pub fn process_document(
    doc: &str,
    extractor: &impl FragmentExtractor,
    rule: &HighlightRule,
) -> Processed {
    let (joined, report) = correlate_document(doc, extractor, rule);
    Processed {
        partition: classify::partition(joined),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragments::FoliumExtractor;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/mapa.html").unwrap()
    }

    fn rule() -> HighlightRule {
        HighlightRule::new(["1B", "2B", "3B", "4B", "5B", "2A", "3A", "4A", "5A"], "Algodão")
    }

    fn names<'a>(features: impl IntoIterator<Item = &'a JoinedFeature>) -> Vec<&'a str> {
        features
            .into_iter()
            .map(|f| f.properties.plot_name.as_str())
            .collect()
    }

    #[test]
    fn two_plot_scenario() {
        let doc = r#"
        geo_json_aa01_add({"features": [{"geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}, "properties": {}, "type": "Feature"}], "type": "FeatureCollection"});
        geo_json_bb02_add({"features": [{"geometry": {"type": "Polygon", "coordinates": [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]}, "properties": {}, "type": "Feature"}], "type": "FeatureCollection"});
        geo_json_aa01.bindTooltip(`<table><tr><th>Talhão:</th><td>1B</td></tr><tr><th>Cultura:</th><td>Algodão</td></tr><tr><th>Área (ha):</th><td>12.5</td></tr></table>`);
        geo_json_bb02.bindTooltip(`<table><tr><th>Talhão:</th><td>9Z</td></tr><tr><th>Cultura:</th><td>Soja</td></tr><tr><th>Área (ha):</th><td>30.0</td></tr></table>`);
        "#;
        let out = process_document(doc, &FoliumExtractor, &rule());
        let p = &out.partition;

        assert_eq!(p.highlighted.len(), 1);
        assert_eq!(p.highlighted[0].properties.plot_name, "1B");
        assert_eq!(p.highlighted[0].properties.area_ha, 12.5);
        assert!(p.highlighted[0].properties.is_highlighted);

        assert_eq!(p.other.len(), 1);
        assert_eq!(p.other[0].properties.plot_name, "9Z");
        assert!(!p.other[0].properties.is_highlighted);

        assert_eq!(names(p.all()), vec!["1B", "9Z"]);
    }

    #[test]
    fn fixture_partitions() {
        let out = process_document(&fixture(), &FoliumExtractor, &rule());
        let p = &out.partition;

        // document order inside each side
        assert_eq!(names(&p.highlighted), vec!["1B", "2A"]);
        assert_eq!(names(&p.other), vec!["9Z", "3A"]);
        assert_eq!(names(p.all()), vec!["1B", "2A", "9Z", "3A"]);

        // 3A is in the set but planted with soy
        assert!(!p.other[1].properties.is_highlighted);
        // duplicate tooltip: the later one won
        assert_eq!(p.other[1].properties.area_ha, 338.5);
    }

    #[test]
    fn fixture_report() {
        let out = process_document(&fixture(), &FoliumExtractor, &rule());
        let r = &out.report;
        assert_eq!(r.geometry_fragments, 7);
        assert_eq!(r.metadata_fragments, 8);
        assert_eq!(r.joined, 4);
        assert_eq!(r.duplicate_ids, vec!["dd04"]);
        assert_eq!(r.orphan_metadata, vec!["9f99", "ee05", "ff06"]);

        let by_reason = r.skipped_by_reason();
        assert_eq!(by_reason.get("malformed_json"), Some(&1));
        assert_eq!(by_reason.get("empty_collection"), Some(&1));
        assert_eq!(by_reason.get("no_metadata"), Some(&1));
    }

    #[test]
    fn skipped_ids_never_reach_output() {
        let out = process_document(&fixture(), &FoliumExtractor, &rule());
        let all: Vec<&JoinedFeature> = out.partition.all().collect();
        for s in &out.report.skipped {
            assert!(all.iter().all(|f| f.id != s.id), "{} leaked", s.id);
        }
        for id in &out.report.orphan_metadata {
            assert!(all.iter().all(|f| &f.id != id));
        }
    }

    #[test]
    fn every_output_feature_has_one_geometry_and_one_tooltip() {
        let doc = fixture();
        let geometry = FoliumExtractor.geometry_fragments(&doc);
        let out = process_document(&doc, &FoliumExtractor, &rule());
        for f in out.partition.all() {
            assert_eq!(geometry.iter().filter(|g| g.id == f.id).count(), 1);
            assert!(!f.properties.plot_name.is_empty());
        }
    }

    #[test]
    fn document_without_fragments() {
        let out = process_document("<html></html>", &FoliumExtractor, &rule());
        assert_eq!(out.partition.all().count(), 0);
        assert_eq!(out.report.geometry_fragments, 0);
        assert_eq!(out.report.metadata_fragments, 0);
    }
}
