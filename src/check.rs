//! Quick look at whether each highlighted plot appears in the map at all,
//! and whether its tooltip sits near a geometry and names the target crop.

const BEFORE: usize = 200;
const AFTER: usize = 300;
const GEOMETRY_MARKER: &str = "geo_json_";

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    NotFound,
    Found { has_geometry: bool, has_crop: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckLine {
    pub plot_name: String,
    pub outcome: CheckOutcome,
}

/// Byte range of `before` chars ahead of `at` through `after` chars past it,
/// clamped to the document.
fn char_window(doc: &str, at: usize, before: usize, after: usize) -> (usize, usize) {
    let start = match before {
        0 => at,
        n => doc[..at]
            .char_indices()
            .rev()
            .nth(n - 1)
            .map_or(0, |(i, _)| i),
    };
    let end = doc[at..]
        .char_indices()
        .nth(after)
        .map_or(doc.len(), |(i, _)| at + i);
    (start, end)
}

pub fn check_plot(doc: &str, plot_name: &str, target_crop: &str) -> CheckOutcome {
    let cell = format!(">{}</td>", plot_name);
    let Some(idx) = doc.find(&cell) else {
        return CheckOutcome::NotFound;
    };
    let (start, end) = char_window(doc, idx, BEFORE, AFTER);
    let window = &doc[start..end];
    CheckOutcome::Found {
        has_geometry: window.contains(GEOMETRY_MARKER),
        has_crop: window.contains(target_crop),
    }
}

pub fn check_plots<'a>(
    doc: &str,
    plot_names: impl IntoIterator<Item = &'a str>,
    target_crop: &str,
) -> Vec<CheckLine> {
    plot_names
        .into_iter()
        .map(|name| CheckLine {
            plot_name: name.to_string(),
            outcome: check_plot(doc, name, target_crop),
        })
        .collect()
}

pub fn print(lines: &[CheckLine], target_crop: &str) {
    for line in lines {
        match &line.outcome {
            CheckOutcome::NotFound => println!("{}: NOT FOUND", line.plot_name),
            CheckOutcome::Found {
                has_geometry,
                has_crop,
            } => println!(
                "{}: GeoJSON={}, {}={}",
                line.plot_name, has_geometry, target_crop, has_crop
            ),
        }
    }
}
