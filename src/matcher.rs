use tracing::{debug, info};

use crate::domain::{Chamber, EntityId, Seat};
use crate::error::GatherError;
use crate::reference::ReferenceData;

/// Generational and honorific tails that are not usable as a last name.
const NAME_SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "v"];

const MAJOR_PARTIES: &[&str] = &["D", "R", "I"];

/// A successful lookup in the reference pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    pub name: String,
    pub party: String,
}

/// Resolves fetched display names against the independent per-race candidate
/// list by last-name substring. The heuristic is kept exactly as the site has
/// always run it, fragility included: common surnames can collide (which is a
/// hard error) and hyphenated or accented names may not match at all.
pub struct NameMatcher<'a> {
    reference: &'a ReferenceData,
}

impl<'a> NameMatcher<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// `Ok(None)` when nothing in the pool matches; ambiguity and a missing
    /// pool are errors no per-row recovery can fix.
    pub fn match_candidate(
        &self,
        entity_id: &EntityId,
        full_name: &str,
        seat: &Seat,
    ) -> Result<Option<NameMatch>, GatherError> {
        let key = seat.district_key();
        let pool = match seat.chamber {
            Chamber::House => {
                let district = seat
                    .district
                    .map(|district| district.to_string())
                    .unwrap_or_default();
                self.reference.house_pool(&seat.state, &district)
            }
            Chamber::Senate => self.reference.senate_pool(&seat.state),
        };
        let Some(pool) = pool else {
            return Err(GatherError::UnknownReferencePool {
                entity_id: entity_id.to_string(),
                key,
            });
        };

        let last = last_name(full_name);
        let matches: Vec<_> = pool
            .iter()
            .filter(|candidate| candidate.candidate.to_lowercase().contains(&last))
            .collect();

        match matches.as_slice() {
            [] => Ok(None),
            [only] => {
                if !MAJOR_PARTIES.contains(&only.party.as_str()) {
                    info!(
                        "[{entity_id}] third-party match in {key}: {} ({})",
                        only.candidate, only.party
                    );
                }
                Ok(Some(NameMatch {
                    name: only.candidate.clone(),
                    party: only.party.clone(),
                }))
            }
            many => Err(GatherError::AmbiguousName {
                entity_id: entity_id.to_string(),
                last_name: last,
                matches: many.iter().map(|c| c.candidate.clone()).collect(),
            }),
        }
    }

    /// Same substring heuristic against the race's photo file list. Zero or
    /// multiple file matches just mean no photo.
    pub fn match_photo(
        &self,
        entity_id: &EntityId,
        full_name: &str,
        seat: &Seat,
    ) -> Option<String> {
        let key = seat.district_key();
        let last = last_name(full_name);
        let matches: Vec<_> = self
            .reference
            .photo_files(&key)
            .iter()
            .filter(|file| file.to_lowercase().contains(&last))
            .collect();

        match matches.as_slice() {
            [only] => Some((*only).clone()),
            [] => {
                debug!("[{entity_id}] no photo for \"{last}\" in {key}");
                None
            }
            many => {
                debug!(
                    "[{entity_id}] {} photos for \"{last}\" in {key}",
                    many.len()
                );
                None
            }
        }
    }
}

/// Last whitespace-delimited token, lowercased; falls back one token when the
/// tail is a generational suffix.
pub fn last_name(full_name: &str) -> String {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    let mut index = match tokens.len() {
        0 => return String::new(),
        n => n - 1,
    };
    if index > 0 && NAME_SUFFIXES.contains(&tokens[index].to_lowercase().as_str()) {
        index -= 1;
    }
    tokens[index].to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use assert_matches::assert_matches;

    use crate::domain::District;
    use crate::reference::ReferenceCandidate;

    use super::*;

    fn pool(entries: &[(&str, &str)]) -> Vec<ReferenceCandidate> {
        entries
            .iter()
            .map(|(candidate, party)| ReferenceCandidate {
                candidate: candidate.to_string(),
                party: party.to_string(),
            })
            .collect()
    }

    fn reference() -> ReferenceData {
        let mut house_pool = BTreeMap::new();
        house_pool.insert(
            "OH".to_string(),
            BTreeMap::from([(
                "3".to_string(),
                pool(&[("John Smith", "D"), ("Jane Smithson", "R")]),
            )]),
        );
        let mut senate_pool = BTreeMap::new();
        senate_pool.insert("OH".to_string(), pool(&[("Pat Green", "G")]));
        let photos = BTreeMap::from([(
            "OH-3".to_string(),
            vec!["smith.jpg".to_string(), "smithson.jpg".to_string()],
        )]);
        ReferenceData::new(
            house_pool,
            senate_pool,
            BTreeSet::new(),
            BTreeSet::new(),
            photos,
        )
    }

    fn house_seat() -> Seat {
        Seat {
            chamber: Chamber::House,
            state: "OH".to_string(),
            district: Some(District::Numbered(3)),
        }
    }

    fn id() -> EntityId {
        "aabb01".parse().unwrap()
    }

    #[test]
    fn last_name_extraction() {
        assert_eq!(last_name("Jane Doe"), "doe");
        assert_eq!(last_name("Martin Heinrich Jr"), "heinrich");
        assert_eq!(last_name("Harold Ford Jr."), "ford");
        assert_eq!(last_name("John Quincy Public III"), "public");
        assert_eq!(last_name("Cher"), "cher");
        assert_eq!(last_name(""), "");
    }

    #[test]
    fn substring_collision_is_ambiguous() {
        let reference = reference();
        let matcher = NameMatcher::new(&reference);
        // "smith" is a substring of both Smith and Smithson.
        let err = matcher
            .match_candidate(&id(), "Will Smith", &house_seat())
            .unwrap_err();
        assert_matches!(err, GatherError::AmbiguousName { matches, .. } if matches.len() == 2);
    }

    #[test]
    fn longer_last_name_matches_uniquely() {
        let reference = reference();
        let matcher = NameMatcher::new(&reference);
        let matched = matcher
            .match_candidate(&id(), "Jane Smithson", &house_seat())
            .unwrap()
            .unwrap();
        assert_eq!(matched.name, "Jane Smithson");
        assert_eq!(matched.party, "R");
    }

    #[test]
    fn zero_matches_is_a_skip_not_an_error() {
        let reference = reference();
        let matcher = NameMatcher::new(&reference);
        let matched = matcher
            .match_candidate(&id(), "Alex Jones", &house_seat())
            .unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn unknown_pool_is_an_error() {
        let reference = reference();
        let matcher = NameMatcher::new(&reference);
        let seat = Seat {
            chamber: Chamber::House,
            state: "WY".to_string(),
            district: Some(District::AtLarge),
        };
        let err = matcher.match_candidate(&id(), "Jane Doe", &seat).unwrap_err();
        assert_matches!(err, GatherError::UnknownReferencePool { key, .. } if key == "WY-at_large");
    }

    #[test]
    fn third_party_senate_match_is_accepted() {
        let reference = reference();
        let matcher = NameMatcher::new(&reference);
        let seat = Seat {
            chamber: Chamber::Senate,
            state: "OH".to_string(),
            district: None,
        };
        let matched = matcher
            .match_candidate(&id(), "Pat Green", &seat)
            .unwrap()
            .unwrap();
        assert_eq!(matched.party, "G");
    }

    #[test]
    fn photo_requires_exactly_one_file_match() {
        let reference = reference();
        let matcher = NameMatcher::new(&reference);
        assert_eq!(
            matcher.match_photo(&id(), "Jane Smithson", &house_seat()),
            Some("smithson.jpg".to_string())
        );
        // "smith" hits both files.
        assert_eq!(matcher.match_photo(&id(), "Will Smith", &house_seat()), None);
        assert_eq!(matcher.match_photo(&id(), "Alex Jones", &house_seat()), None);
    }
}
