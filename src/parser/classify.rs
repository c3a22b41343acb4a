use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::settings::Settings;

/// A plot is highlighted when its name is in the set and its crop matches.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    names: BTreeSet<String>,
    target_crop: String,
}

impl HighlightRule {
    pub fn new<I, S>(names: I, target_crop: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HighlightRule {
            names: names.into_iter().map(Into::into).collect(),
            target_crop: target_crop.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        HighlightRule::new(settings.highlight.iter().cloned(), settings.target_crop.clone())
    }

    pub fn is_highlighted(&self, plot_name: &str, crop_label: &str) -> bool {
        self.names.contains(plot_name) && crop_label == self.target_crop
    }

    pub fn target_crop(&self) -> &str {
        &self.target_crop
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotProperties {
    #[serde(rename = "nome")]
    pub plot_name: String,
    #[serde(rename = "cultura")]
    pub crop_label: String,
    #[serde(rename = "area")]
    pub area_ha: f64,
    #[serde(rename = "isCotton")]
    pub is_highlighted: bool,
}

/// One geometry joined with its tooltip metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedFeature {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Value,
    pub properties: PlotProperties,
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: &'a [JoinedFeature],
}

impl<'a> FeatureCollection<'a> {
    pub fn new(features: &'a [JoinedFeature]) -> Self {
        FeatureCollection {
            kind: "FeatureCollection",
            features,
        }
    }
}

#[derive(Debug, Default)]
pub struct Partition {
    pub highlighted: Vec<JoinedFeature>,
    pub other: Vec<JoinedFeature>,
}

/// Stable split on `is_highlighted`; input order is kept inside each side.
pub fn partition(features: Vec<JoinedFeature>) -> Partition {
    let (highlighted, other) = features
        .into_iter()
        .partition(|f| f.properties.is_highlighted);
    Partition { highlighted, other }
}

impl Partition {
    /// Highlighted first, then the rest.
    pub fn all(&self) -> impl Iterator<Item = &JoinedFeature> {
        self.highlighted.iter().chain(self.other.iter())
    }

    /// Highlighted plots ordered by name, for the console listing.
    pub fn highlighted_by_name(&self) -> Vec<&PlotProperties> {
        let mut props: Vec<&PlotProperties> =
            self.highlighted.iter().map(|f| &f.properties).collect();
        props.sort_by(|a, b| a.plot_name.cmp(&b.plot_name));
        props
    }

    /// Console summary: counts, then highlighted plots by name.
    pub fn summary_lines(&self, crop: &str) -> Vec<String> {
        let mut lines = vec![
            format!("Highlighted plots ({}): {}", crop, self.highlighted.len()),
            format!("Other plots: {}", self.other.len()),
            format!("All plots: {}", self.all().count()),
            String::new(),
            format!("=== {} ===", crop.to_uppercase()),
        ];
        // {:?} keeps the fractional part: 30.0, not 30
        lines.extend(
            self.highlighted_by_name()
                .into_iter()
                .map(|p| format!("- {}: {:?} ha", p.plot_name, p.area_ha)),
        );
        lines
    }

    pub fn print_summary(&self, crop: &str) {
        println!();
        for line in self.summary_lines(crop) {
            println!("{}", line);
        }
    }
}
