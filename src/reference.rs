use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use camino::Utf8Path;
use serde::Deserialize;
use tracing::warn;

use crate::config::DataPaths;
use crate::error::GatherError;

/// One entry of the independent per-race candidate name list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceCandidate {
    pub candidate: String,
    pub party: String,
}

pub type HousePool = BTreeMap<String, BTreeMap<String, Vec<ReferenceCandidate>>>;
pub type SenatePool = BTreeMap<String, Vec<ReferenceCandidate>>;

/// Immutable reference context loaded once at startup and handed to the
/// classifier and matcher. The valid House district set and the photo index
/// are built from a listing of the photos tree at load time and held as
/// plain sets afterwards; nothing downstream touches the filesystem.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    house_pool: HousePool,
    senate_pool: SenatePool,
    senate_races: BTreeSet<String>,
    house_races: BTreeSet<String>,
    photos: BTreeMap<String, Vec<String>>,
}

impl ReferenceData {
    pub fn new(
        house_pool: HousePool,
        senate_pool: SenatePool,
        senate_races: BTreeSet<String>,
        house_races: BTreeSet<String>,
        photos: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            house_pool,
            senate_pool,
            senate_races,
            house_races,
            photos,
        }
    }

    pub fn load(paths: &DataPaths) -> Result<Self, GatherError> {
        let house_pool: HousePool = read_json(&paths.house_candidates())?;
        let senate_pool: SenatePool = read_json(&paths.senate_candidates())?;
        let senate_races: BTreeSet<String> = read_json::<Vec<String>>(&paths.senate_races())?
            .into_iter()
            .collect();

        let house_photos = list_race_dirs(&paths.house_photos())?;
        let house_races = house_photos.keys().cloned().collect();

        let senate_photos = if paths.senate_photos().as_std_path().exists() {
            list_race_dirs(&paths.senate_photos())?
        } else {
            warn!("no senate photos at {}", paths.senate_photos());
            BTreeMap::new()
        };

        let mut photos = house_photos;
        photos.extend(senate_photos);

        Ok(Self::new(
            house_pool,
            senate_pool,
            senate_races,
            house_races,
            photos,
        ))
    }

    pub fn house_pool(&self, state: &str, district: &str) -> Option<&[ReferenceCandidate]> {
        self.house_pool
            .get(state)
            .and_then(|districts| districts.get(district))
            .map(Vec::as_slice)
    }

    pub fn senate_pool(&self, state: &str) -> Option<&[ReferenceCandidate]> {
        self.senate_pool.get(state).map(Vec::as_slice)
    }

    pub fn has_senate_race(&self, state: &str) -> bool {
        self.senate_races.contains(state)
    }

    pub fn is_house_race(&self, district_key: &str) -> bool {
        self.house_races.contains(district_key)
    }

    pub fn house_races(&self) -> impl Iterator<Item = &str> {
        self.house_races.iter().map(String::as_str)
    }

    pub fn house_race_count(&self) -> usize {
        self.house_races.len()
    }

    pub fn photo_files(&self, race_key: &str) -> &[String] {
        self.photos
            .get(race_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn state_name(code: &str) -> Option<&'static str> {
        STATE_NAMES
            .iter()
            .find(|(abbrev, _)| *abbrev == code)
            .map(|(_, name)| *name)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, GatherError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|_| GatherError::ReferenceRead(path.as_std_path().to_path_buf()))?;
    serde_json::from_str(&content).map_err(|err| GatherError::ReferenceParse {
        path: path.as_std_path().to_path_buf(),
        message: err.to_string(),
    })
}

/// Lists `root/{RACE}/` subdirectories into race-key → sorted file names.
fn list_race_dirs(root: &Utf8Path) -> Result<BTreeMap<String, Vec<String>>, GatherError> {
    let mut races = BTreeMap::new();
    let entries = fs::read_dir(root.as_std_path())
        .map_err(|_| GatherError::ReferenceRead(root.as_std_path().to_path_buf()))?;
    for entry in entries {
        let entry = entry.map_err(|err| GatherError::Filesystem(err.to_string()))?;
        if !entry.path().is_dir() {
            continue;
        }
        let race_key = entry.file_name().to_string_lossy().to_string();
        if race_key.starts_with('.') {
            continue;
        }
        let mut files = Vec::new();
        let dir = fs::read_dir(entry.path()).map_err(|err| GatherError::Filesystem(err.to_string()))?;
        for file in dir {
            let file = file.map_err(|err| GatherError::Filesystem(err.to_string()))?;
            let name = file.file_name().to_string_lossy().to_string();
            if file.path().is_file() && !name.starts_with('.') {
                files.push(name);
            }
        }
        files.sort();
        races.insert(race_key, files);
    }
    Ok(races)
}

const STATE_NAMES: &[(&str, &str)] = &[
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MP", "Northern Mariana Islands"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VI", "U.S. Virgin Islands"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        assert_eq!(ReferenceData::state_name("WY"), Some("Wyoming"));
        assert_eq!(ReferenceData::state_name("DC"), Some("District of Columbia"));
        assert_eq!(ReferenceData::state_name("ZZ"), None);
    }

    #[test]
    fn load_builds_race_set_from_photo_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let paths = DataPaths::new(
            root.join("data"),
            root.join("cache"),
            root.join("photos"),
            None,
        );

        fs::create_dir_all(paths.data_dir.as_std_path()).unwrap();
        fs::write(
            paths.house_candidates().as_std_path(),
            r#"{"OH": {"3": [{"candidate": "Jane Doe", "party": "D"}]}}"#,
        )
        .unwrap();
        fs::write(
            paths.senate_candidates().as_std_path(),
            r#"{"OH": [{"candidate": "Sam Brown", "party": "R"}]}"#,
        )
        .unwrap();
        fs::write(paths.senate_races().as_std_path(), r#"["OH"]"#).unwrap();

        let oh3 = paths.house_photos().join("OH-3");
        fs::create_dir_all(oh3.as_std_path()).unwrap();
        fs::write(oh3.join("doe.jpg").as_std_path(), b"jpg").unwrap();
        fs::write(oh3.join(".DS_Store").as_std_path(), b"junk").unwrap();
        let oh_senate = paths.senate_photos().join("OH");
        fs::create_dir_all(oh_senate.as_std_path()).unwrap();
        fs::write(oh_senate.join("brown.jpg").as_std_path(), b"jpg").unwrap();

        let reference = ReferenceData::load(&paths).unwrap();
        assert!(reference.is_house_race("OH-3"));
        assert!(!reference.is_house_race("OH-4"));
        assert_eq!(reference.photo_files("OH-3"), ["doe.jpg"]);
        assert_eq!(reference.photo_files("OH"), ["brown.jpg"]);
        assert!(reference.has_senate_race("OH"));
        assert_eq!(
            reference.house_pool("OH", "3").unwrap()[0].candidate,
            "Jane Doe"
        );
        assert!(reference.senate_pool("WY").is_none());
    }
}
