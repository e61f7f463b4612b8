use camino::Utf8PathBuf;
use clap::ValueEnum;

use crate::error::GatherError;

/// How classification defects are handled. Earlier revisions of the gather
/// script aborted on the first unmappable entity; the last revision skipped
/// the row and kept going. Both behaviors are kept selectable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Strictness {
    Strict,
    #[default]
    Lenient,
}

impl Strictness {
    pub fn is_strict(self) -> bool {
        matches!(self, Strictness::Strict)
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strictness::Strict => write!(f, "strict"),
            Strictness::Lenient => write!(f, "lenient"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub api_key: String,
    pub debug: bool,
    pub skips: bool,
    pub missing: bool,
    pub force: bool,
    pub strictness: Strictness,
}

/// On-disk layout of inputs and outputs, rooted at the working directory by
/// default: `data/` for inputs, `cache/` for API payloads, `photos/` for the
/// per-race image tree, `data/districts/` for output files.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub data_dir: Utf8PathBuf,
    pub cache_dir: Utf8PathBuf,
    pub photos_dir: Utf8PathBuf,
    pub districts_dir: Utf8PathBuf,
}

impl DataPaths {
    pub fn new(
        data_dir: Utf8PathBuf,
        cache_dir: Utf8PathBuf,
        photos_dir: Utf8PathBuf,
        districts_dir: Option<Utf8PathBuf>,
    ) -> Self {
        let districts_dir = districts_dir.unwrap_or_else(|| data_dir.join("districts"));
        Self {
            data_dir,
            cache_dir,
            photos_dir,
            districts_dir,
        }
    }

    pub fn endorsements(&self) -> Utf8PathBuf {
        self.data_dir.join("endorsements.csv")
    }

    pub fn house_candidates(&self) -> Utf8PathBuf {
        self.data_dir.join("house_candidates.json")
    }

    pub fn senate_candidates(&self) -> Utf8PathBuf {
        self.data_dir.join("senate_candidates.json")
    }

    pub fn senate_races(&self) -> Utf8PathBuf {
        self.data_dir.join("senate_races.json")
    }

    pub fn house_photos(&self) -> Utf8PathBuf {
        self.photos_dir.join("house")
    }

    pub fn senate_photos(&self) -> Utf8PathBuf {
        self.photos_dir.join("senate")
    }
}

/// The API key comes from the flag or, failing that, the environment.
pub fn resolve_api_key(flag: Option<String>) -> Result<String, GatherError> {
    if let Some(key) = flag {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }
    match std::env::var("TRANSPARENCY_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(GatherError::MissingApiKey),
    }
}
