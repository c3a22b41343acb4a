use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "talhoes.toml";
const ENV_PREFIX: &str = "TALHOES";

const DEFAULT_INPUT: &str = "Mapa Interativo Grupo Progresso - Safra 2025-26.html";
const DEFAULT_OUTPUT: &str = "client/src/data/talhoes-geojson.ts";
const DEFAULT_TARGET_CROP: &str = "Algodão";
const DEFAULT_HIGHLIGHT: &[&str] = &["1B", "2B", "3B", "4B", "5B", "2A", "3A", "4A", "5A"];

/// Everything one run needs. Resolved once in `main`, then passed down.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(deserialize_with = "names_list")]
    pub highlight: Vec<String>,
    pub target_crop: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            highlight: DEFAULT_HIGHLIGHT.iter().map(|s| s.to_string()).collect(),
            target_crop: DEFAULT_TARGET_CROP.to_string(),
        }
    }
}

/// Plot names are opaque strings: a TOML array, or one comma-separated
/// value (`TALHOES_HIGHLIGHT=1B,2B`). Scalars are never read as numbers.
fn names_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NamesVisitor;

    impl<'de> Visitor<'de> for NamesVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of plot names or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut names = Vec::new();
            while let Some(name) = seq.next_element::<String>()? {
                names.push(name);
            }
            Ok(names)
        }
    }

    deserializer.deserialize_any(NamesVisitor)
}

/// Command-line values that win over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub highlight: Vec<String>,
    pub target_crop: Option<String>,
}

impl Settings {
    /// defaults < config file < TALHOES_* env vars
    pub fn load(config_file: Option<&Path>) -> Result<Settings> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        info!(input = ?settings.input, output = ?settings.output, "Settings loaded");
        Ok(settings)
    }

    pub fn apply(mut self, overrides: Overrides) -> Settings {
        if let Some(input) = overrides.input {
            self.input = input;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if !overrides.highlight.is_empty() {
            self.highlight = overrides.highlight;
        }
        if let Some(crop) = overrides.target_crop {
            self.target_crop = crop;
        }
        if self.highlight.is_empty() {
            warn!("Highlight set is empty; every plot will be written as 'other'");
        }
        self
    }
}
