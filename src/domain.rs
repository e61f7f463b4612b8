use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::GatherError;

/// Opaque identifier for a candidate in the campaign-finance data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = GatherError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid =
            !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(GatherError::InvalidEntityId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    House,
    Senate,
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chamber::House => write!(f, "house"),
            Chamber::Senate => write!(f, "senate"),
        }
    }
}

/// Normalized House district token. Numbered districts render without leading
/// zeros; statewide single-seat districts render as the `at_large` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum District {
    Numbered(u32),
    AtLarge,
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            District::Numbered(n) => write!(f, "{n}"),
            District::AtLarge => write!(f, "at_large"),
        }
    }
}

impl Serialize for District {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// A fully classified seat: the canonical `(chamber, state, district)` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub chamber: Chamber,
    pub state: String,
    pub district: Option<District>,
}

impl Seat {
    /// `STATE-district` for House races, bare state code for Senate races.
    pub fn district_key(&self) -> String {
        match (self.chamber, self.district) {
            (Chamber::House, Some(district)) => format!("{}-{district}", self.state),
            _ => self.state.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndorsementKind {
    Endorsement,
    Grade,
    Rating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endorsement {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EndorsementKind,
    pub value: String,
}

/// One line of the endorsements table.
#[derive(Debug, Clone)]
pub struct RawEndorsementRow {
    pub line: usize,
    pub entity_id: EntityId,
    pub name: String,
    pub organization: String,
    pub endorsement: String,
    pub rating: String,
    pub grade: String,
}

impl RawEndorsementRow {
    /// Collapses the three rating columns into one endorsement entry.
    /// A numeric rating wins over a letter grade, which wins over the
    /// yes/no endorsement column.
    pub fn endorsement_entry(&self) -> Endorsement {
        let (kind, value) = if !self.rating.is_empty() {
            (EndorsementKind::Rating, self.rating.clone())
        } else if !self.grade.is_empty() {
            (EndorsementKind::Grade, self.grade.clone())
        } else {
            (EndorsementKind::Endorsement, self.endorsement.clone())
        };
        Endorsement {
            name: self.organization.clone(),
            kind,
            value,
        }
    }
}

/// Biographical metadata as returned by the entity endpoint. The API uses
/// `null` interchangeably with missing fields, so every string field
/// tolerates both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entity: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub seat: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub district: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub party: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub seat_status: String,
    #[serde(default)]
    pub bio_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bioguide_id: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl CandidateMetadata {
    pub fn incumbent(&self) -> bool {
        self.seat_status.eq_ignore_ascii_case("i")
    }
}

/// One contributor-industry aggregate, name-normalized. Counts and amounts
/// pass through untouched.
#[derive(Debug, Clone, Serialize)]
pub struct Industry {
    pub count: Value,
    pub amount: Value,
    pub id: Value,
    pub name: String,
}

/// The canonical output unit: one candidate with fundraising and endorsement
/// data attached, assigned to exactly one race.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCandidate {
    pub entity_id: String,
    pub chamber: Chamber,
    pub state: String,
    pub district: Option<District>,
    pub name: String,
    pub party: String,
    pub incumbent: bool,
    pub seat_status: String,
    pub bio_url: Option<String>,
    pub photo_url: Option<String>,
    pub photo: Option<String>,
    pub bioguide_id: Option<String>,
    pub fec_summary: Value,
    pub industries: Vec<Industry>,
    pub endorsements: Vec<Endorsement>,
}

/// One output file: every race relevant to a House district.
#[derive(Debug, Clone, Serialize)]
pub struct DistrictOutput {
    pub house: Vec<ResolvedCandidate>,
    pub senate: Vec<ResolvedCandidate>,
}

/// Non-fatal reasons a row is excluded from output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MetadataUnavailable,
    FinanceUnavailable,
    UnrecognizedSeat(String),
    MissingDistrict,
    InvalidDistrict(String),
    SenateNotUp(String),
    NoNameMatch { key: String, last_name: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MetadataUnavailable => write!(f, "could not resolve entity metadata"),
            SkipReason::FinanceUnavailable => write!(f, "could not resolve fundraising data"),
            SkipReason::UnrecognizedSeat(seat) => write!(f, "unrecognized seat: {seat}"),
            SkipReason::MissingDistrict => write!(f, "no district in metadata for a House seat"),
            SkipReason::InvalidDistrict(key) => write!(f, "invalid House district: {key}"),
            SkipReason::SenateNotUp(state) => {
                write!(f, "no Senate race in {state} this cycle")
            }
            SkipReason::NoNameMatch { key, last_name } => {
                write!(f, "no name match for \"{last_name}\" in {key}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_entity_id_valid() {
        let id: EntityId = " 4148b26f6f1c437cb50ea9ca4699417a ".parse().unwrap();
        assert_eq!(id.as_str(), "4148b26f6f1c437cb50ea9ca4699417a");
    }

    #[test]
    fn parse_entity_id_invalid() {
        let err = "".parse::<EntityId>().unwrap_err();
        assert_matches!(err, GatherError::InvalidEntityId(_));
        let err = "abc def".parse::<EntityId>().unwrap_err();
        assert_matches!(err, GatherError::InvalidEntityId(_));
    }

    #[test]
    fn district_rendering() {
        assert_eq!(District::Numbered(4).to_string(), "4");
        assert_eq!(District::AtLarge.to_string(), "at_large");
    }

    #[test]
    fn district_keys() {
        let house = Seat {
            chamber: Chamber::House,
            state: "WY".to_string(),
            district: Some(District::AtLarge),
        };
        assert_eq!(house.district_key(), "WY-at_large");

        let senate = Seat {
            chamber: Chamber::Senate,
            state: "OH".to_string(),
            district: None,
        };
        assert_eq!(senate.district_key(), "OH");
    }

    fn row(endorsement: &str, rating: &str, grade: &str) -> RawEndorsementRow {
        RawEndorsementRow {
            line: 2,
            entity_id: "aabb01".parse().unwrap(),
            name: "Jane Doe".to_string(),
            organization: "NRA".to_string(),
            endorsement: endorsement.to_string(),
            rating: rating.to_string(),
            grade: grade.to_string(),
        }
    }

    #[test]
    fn metadata_tolerates_null_fields() {
        let meta: CandidateMetadata = serde_json::from_value(serde_json::json!({
            "entity": "aabb01",
            "name": "Sam Brown",
            "seat": "federal:senate",
            "district": null,
            "state": "OH",
            "party": null,
            "seat_status": null
        }))
        .unwrap();
        assert_eq!(meta.district, "");
        assert_eq!(meta.party, "");
        assert!(!meta.incumbent());
    }

    #[test]
    fn rating_wins_over_grade() {
        let entry = row("Y", "93", "A").endorsement_entry();
        assert_eq!(entry.kind, EndorsementKind::Rating);
        assert_eq!(entry.value, "93");
    }

    #[test]
    fn grade_wins_over_endorsement() {
        let entry = row("Y", "", "A-").endorsement_entry();
        assert_eq!(entry.kind, EndorsementKind::Grade);
        assert_eq!(entry.value, "A-");
    }

    #[test]
    fn endorsement_is_the_fallback() {
        let entry = row("Y", "", "").endorsement_entry();
        assert_eq!(entry.kind, EndorsementKind::Endorsement);
        assert_eq!(entry.value, "Y");
        assert_eq!(entry.name, "NRA");
    }
}
