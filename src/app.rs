use std::collections::HashMap;

use camino::Utf8Path;
use tracing::info;

use crate::aggregate::DistrictAggregator;
use crate::api::ApiClient;
use crate::classify::{Classification, SeatClassifier};
use crate::config::RunOptions;
use crate::domain::{EntityId, RawEndorsementRow, ResolvedCandidate, SkipReason};
use crate::error::GatherError;
use crate::fetch::{EntityFetcher, FetchOutcome};
use crate::matcher::{NameMatcher, last_name};
use crate::reference::ReferenceData;
use crate::store::Store;

// Fixed column positions of the endorsements table.
const COL_ENTITY_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_ORGANIZATION: usize = 3;
const COL_ENDORSEMENT: usize = 4;
const COL_RATING: usize = 5;
const COL_GRADE: usize = 6;

#[derive(Debug, Clone)]
pub struct SkipRecord {
    pub entity_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub skipped_rows: usize,
    pub house_districts: usize,
    pub senate_races: usize,
    pub files_written: usize,
    pub skips: Vec<SkipRecord>,
    pub missing_districts: Vec<(String, usize)>,
}

/// The single-pass pipeline: one sweep over the endorsements table, each
/// row's entity resolved at most once, resolved candidates folded into the
/// district buckets, buckets cross-joined and flushed at the end.
pub struct App<'a, C: ApiClient> {
    client: &'a C,
    store: &'a Store,
    reference: &'a ReferenceData,
    options: RunOptions,
}

impl<'a, C: ApiClient> App<'a, C> {
    pub fn new(
        client: &'a C,
        store: &'a Store,
        reference: &'a ReferenceData,
        options: RunOptions,
    ) -> Self {
        Self {
            client,
            store,
            reference,
            options,
        }
    }

    pub fn run(&self, endorsements_path: &Utf8Path) -> Result<RunSummary, GatherError> {
        let fetcher = EntityFetcher::new(
            self.client,
            self.store,
            self.options.api_key.clone(),
            self.options.force,
            self.options.strictness,
        );
        let classifier = SeatClassifier::new(self.reference, self.options.strictness);
        let matcher = NameMatcher::new(self.reference);
        let mut aggregator = DistrictAggregator::new();

        // Resolution outcome per entity id, for the life of the run. A `None`
        // marks an entity already decided as a skip, so repeated rows for it
        // cost nothing.
        let mut resolutions: HashMap<String, Option<ResolvedCandidate>> = HashMap::new();
        let mut skips = Vec::new();
        let mut rows = 0usize;
        let mut skipped_rows = 0usize;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(endorsements_path.as_std_path())
            .map_err(|_| {
                GatherError::EndorsementsRead(endorsements_path.as_std_path().to_path_buf())
            })?;

        for (index, record) in reader.records().enumerate() {
            let line = index + 2;
            let record = record.map_err(|err| GatherError::EndorsementRow {
                line,
                message: err.to_string(),
            })?;
            let row = parse_row(&record, line)?;
            rows += 1;

            let resolved = match resolutions.get(row.entity_id.as_str()) {
                Some(cached) => cached.clone(),
                None => {
                    let outcome =
                        self.resolve(&fetcher, &classifier, &matcher, &row.entity_id, &mut skips)?;
                    resolutions.insert(row.entity_id.to_string(), outcome.clone());
                    outcome
                }
            };

            match resolved {
                Some(candidate) => {
                    aggregator.accumulate(&candidate, &row.name, row.endorsement_entry())
                }
                None => skipped_rows += 1,
            }
        }

        let outputs = aggregator.build_outputs(self.reference);
        for (key, output) in &outputs {
            Store::write_json(&self.store.district_path(key), output)?;
        }

        Ok(RunSummary {
            rows,
            skipped_rows,
            house_districts: aggregator.house_district_count(),
            senate_races: aggregator.senate_race_count(),
            files_written: outputs.len(),
            skips,
            missing_districts: aggregator.missing_districts(self.reference),
        })
    }

    fn resolve(
        &self,
        fetcher: &EntityFetcher<'_, C>,
        classifier: &SeatClassifier<'_>,
        matcher: &NameMatcher<'_>,
        entity_id: &EntityId,
        skips: &mut Vec<SkipRecord>,
    ) -> Result<Option<ResolvedCandidate>, GatherError> {
        let entity = match fetcher.fetch_entity(entity_id)? {
            FetchOutcome::Fetched(entity) => entity,
            FetchOutcome::Skipped(reason) => return Ok(record_skip(skips, entity_id, reason)),
        };

        let seat = match classifier.classify(entity_id, &entity.metadata)? {
            Classification::Seat(seat) => seat,
            Classification::Skip(reason) => return Ok(record_skip(skips, entity_id, reason)),
        };

        let Some(matched) = matcher.match_candidate(entity_id, &entity.metadata.name, &seat)?
        else {
            let reason = SkipReason::NoNameMatch {
                key: seat.district_key(),
                last_name: last_name(&entity.metadata.name),
            };
            return Ok(record_skip(skips, entity_id, reason));
        };

        let photo = matcher.match_photo(entity_id, &entity.metadata.name, &seat);

        Ok(Some(ResolvedCandidate {
            entity_id: entity_id.to_string(),
            chamber: seat.chamber,
            state: seat.state,
            district: seat.district,
            name: matched.name,
            party: matched.party,
            incumbent: entity.metadata.incumbent(),
            seat_status: entity.metadata.seat_status,
            bio_url: entity.metadata.bio_url,
            photo_url: entity.metadata.photo_url,
            photo,
            bioguide_id: entity.metadata.bioguide_id,
            fec_summary: entity.fec_summary,
            industries: entity.industries,
            endorsements: Vec::new(),
        }))
    }
}

fn record_skip(
    skips: &mut Vec<SkipRecord>,
    entity_id: &EntityId,
    reason: SkipReason,
) -> Option<ResolvedCandidate> {
    info!("[{entity_id}] skipping: {reason}");
    skips.push(SkipRecord {
        entity_id: entity_id.to_string(),
        reason,
    });
    None
}

fn parse_row(record: &csv::StringRecord, line: usize) -> Result<RawEndorsementRow, GatherError> {
    let entity_raw = record
        .get(COL_ENTITY_ID)
        .ok_or_else(|| GatherError::EndorsementRow {
            line,
            message: "missing entity id column".to_string(),
        })?;
    let entity_id = entity_raw
        .parse::<EntityId>()
        .map_err(|_| GatherError::EndorsementRow {
            line,
            message: format!("invalid entity id {entity_raw:?}"),
        })?;
    let field = |index: usize| record.get(index).unwrap_or_default().to_string();

    Ok(RawEndorsementRow {
        line,
        entity_id,
        name: field(COL_NAME),
        organization: field(COL_ORGANIZATION),
        endorsement: field(COL_ENDORSEMENT),
        rating: field(COL_RATING),
        grade: field(COL_GRADE),
    })
}
