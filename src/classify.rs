use regex::Regex;

use crate::config::Strictness;
use crate::domain::{CandidateMetadata, Chamber, District, EntityId, Seat, SkipReason};
use crate::error::GatherError;
use crate::reference::ReferenceData;

/// Entities whose seat string does not follow the `federal:` convention but
/// belong in a chamber anyway: presidential filers who also ran for a House
/// seat this cycle.
const SEAT_OVERRIDES: &[(&str, Chamber)] = &[
    ("140d5b2b98b4451ea3e3b3bcc95aa281", Chamber::House),
    ("af76d80c56ef4f3a9b7f6eba3b14d124", Chamber::House),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Seat(Seat),
    Skip(SkipReason),
}

/// Determines `(chamber, state, district)` from raw entity metadata.
pub struct SeatClassifier<'a> {
    seat_re: Regex,
    reference: &'a ReferenceData,
    strictness: Strictness,
    overrides: &'a [(&'a str, Chamber)],
}

impl<'a> SeatClassifier<'a> {
    pub fn new(reference: &'a ReferenceData, strictness: Strictness) -> Self {
        Self::with_overrides(reference, strictness, SEAT_OVERRIDES)
    }

    pub fn with_overrides(
        reference: &'a ReferenceData,
        strictness: Strictness,
        overrides: &'a [(&'a str, Chamber)],
    ) -> Self {
        Self {
            seat_re: Regex::new(r"^federal:(house|senate)$").unwrap(),
            reference,
            strictness,
            overrides,
        }
    }

    pub fn classify(
        &self,
        entity_id: &EntityId,
        meta: &CandidateMetadata,
    ) -> Result<Classification, GatherError> {
        let chamber = match self.seat_re.captures(&meta.seat) {
            Some(caps) => {
                if &caps[1] == "house" {
                    Chamber::House
                } else {
                    Chamber::Senate
                }
            }
            None => {
                let forced = self
                    .overrides
                    .iter()
                    .find(|(id, _)| *id == entity_id.as_str())
                    .map(|(_, chamber)| *chamber);
                match forced {
                    Some(chamber) => chamber,
                    None => {
                        return self.defect(
                            SkipReason::UnrecognizedSeat(meta.seat.clone()),
                            GatherError::UnrecognizedSeat {
                                entity_id: entity_id.to_string(),
                                seat: meta.seat.clone(),
                            },
                        );
                    }
                }
            }
        };

        match chamber {
            Chamber::Senate => {
                if !self.reference.has_senate_race(&meta.state) {
                    return Ok(Classification::Skip(SkipReason::SenateNotUp(
                        meta.state.clone(),
                    )));
                }
                Ok(Classification::Seat(Seat {
                    chamber: Chamber::Senate,
                    state: meta.state.clone(),
                    district: None,
                }))
            }
            Chamber::House => self.classify_house(entity_id, meta),
        }
    }

    fn classify_house(
        &self,
        entity_id: &EntityId,
        meta: &CandidateMetadata,
    ) -> Result<Classification, GatherError> {
        if meta.district.is_empty() {
            return self.defect(
                SkipReason::MissingDistrict,
                GatherError::MissingDistrict {
                    entity_id: entity_id.to_string(),
                },
            );
        }

        // "OH-03" carries the state before the delimiter; the numeric
        // remainder loses its leading zero through the integer round-trip.
        let raw = meta.district.split('-').next_back().unwrap_or_default();
        let Ok(number) = raw.parse::<u32>() else {
            return self.defect(
                SkipReason::InvalidDistrict(meta.district.clone()),
                GatherError::InvalidDistrict {
                    entity_id: entity_id.to_string(),
                    key: meta.district.clone(),
                },
            );
        };

        let mut district = District::Numbered(number);
        let key = format!("{}-{district}", meta.state);
        if !self.reference.is_house_race(&key) {
            let at_large_key = format!("{}-{}", meta.state, District::AtLarge);
            if number == 1 && self.reference.is_house_race(&at_large_key) {
                district = District::AtLarge;
            } else {
                return self.defect(
                    SkipReason::InvalidDistrict(key.clone()),
                    GatherError::InvalidDistrict {
                        entity_id: entity_id.to_string(),
                        key,
                    },
                );
            }
        }

        Ok(Classification::Seat(Seat {
            chamber: Chamber::House,
            state: meta.state.clone(),
            district: Some(district),
        }))
    }

    fn defect(
        &self,
        skip: SkipReason,
        err: GatherError,
    ) -> Result<Classification, GatherError> {
        if self.strictness.is_strict() {
            Err(err)
        } else {
            Ok(Classification::Skip(skip))
        }
    }
}
