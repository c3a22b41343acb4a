use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::parser::classify::{FeatureCollection, Partition};

const HEADER: &str = "\
// GeoJSON dos talhões extraídos do mapa da safra 2025-26
// Gerado automaticamente por talhoes_extract

import { FeatureCollection, Feature, Polygon } from 'geojson';
";

const ALL_TALHOES: &str = "\
// Todas as features combinadas
export const allTalhoes: FeatureCollection<Polygon> = {
  type: \"FeatureCollection\",
  features: [...cottonTalhoes.features, ...otherTalhoes.features]
};
";

/// Render the TypeScript data module. Deterministic for a given partition.
pub fn render_module(partition: &Partition) -> Result<String> {
    let cotton = serde_json::to_string_pretty(&FeatureCollection::new(&partition.highlighted))?;
    let other = serde_json::to_string_pretty(&FeatureCollection::new(&partition.other))?;

    Ok(format!(
        "{HEADER}\n\
         // Talhões de Algodão (destacados)\n\
         export const cottonTalhoes: FeatureCollection<Polygon> = {cotton};\n\
         \n\
         // Outros Talhões (desfocados)\n\
         export const otherTalhoes: FeatureCollection<Polygon> = {other};\n\
         \n\
         {ALL_TALHOES}"
    ))
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| anyhow!("Output path has no file name: {}", path.display()))?
        .to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

/// Write via a sibling temp file and rename, so a failed run leaves the
/// previous output (or nothing) in place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = temp_path(path)?;
    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to write {}", tmp.display()));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    info!(path = %path.display(), bytes = contents.len(), "Output written");
    Ok(())
}
