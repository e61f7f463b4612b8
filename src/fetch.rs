use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{self, ApiClient};
use crate::config::Strictness;
use crate::domain::{CandidateMetadata, EntityId, Industry, SkipReason};
use crate::error::GatherError;
use crate::industries::process_industries;
use crate::store::{CacheFunction, Store};

/// Everything the API knows about one entity, assembled from the three
/// per-entity endpoints.
#[derive(Debug, Clone)]
pub struct FetchedEntity {
    pub metadata: CandidateMetadata,
    pub fec_summary: Value,
    pub industries: Vec<Industry>,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(FetchedEntity),
    Skipped(SkipReason),
}

/// Cache-or-download retrieval for per-entity records. Payloads land at
/// `cache/{entity}-{function}.json` and are reused on later runs unless
/// `force` is set. A transport failure on any of the three endpoints
/// disqualifies the whole entity.
pub struct EntityFetcher<'a, C: ApiClient> {
    client: &'a C,
    store: &'a Store,
    api_key: String,
    force: bool,
    strictness: Strictness,
}

impl<'a, C: ApiClient> EntityFetcher<'a, C> {
    pub fn new(
        client: &'a C,
        store: &'a Store,
        api_key: String,
        force: bool,
        strictness: Strictness,
    ) -> Self {
        Self {
            client,
            store,
            api_key,
            force,
            strictness,
        }
    }

    /// `Skipped` means the entity could not be resolved and the row should
    /// be dropped; under strict handling an unresolvable metadata payload
    /// aborts instead.
    pub fn fetch_entity(&self, entity_id: &EntityId) -> Result<FetchOutcome, GatherError> {
        let url = api::entity_url(entity_id, &self.api_key);
        let details = self.fetch_function(entity_id, CacheFunction::Details, &url)?;
        let metadata = match details
            .as_ref()
            .and_then(|details| details.get("metadata"))
            .map(|value| serde_json::from_value::<CandidateMetadata>(value.clone()))
        {
            Some(Ok(metadata)) => metadata,
            Some(Err(err)) => {
                if self.strictness.is_strict() {
                    return Err(GatherError::ApiPayload {
                        entity_id: entity_id.to_string(),
                        message: format!("bad metadata object: {err}"),
                    });
                }
                warn!("[{entity_id}] bad metadata object: {err}");
                return Ok(FetchOutcome::Skipped(SkipReason::MetadataUnavailable));
            }
            None => {
                if self.strictness.is_strict() {
                    return Err(GatherError::UnresolvableEntity {
                        entity_id: entity_id.to_string(),
                    });
                }
                return Ok(FetchOutcome::Skipped(SkipReason::MetadataUnavailable));
            }
        };

        let url = api::fec_summary_url(entity_id, &self.api_key);
        let Some(fec_summary) = self.fetch_function(entity_id, CacheFunction::FecSummary, &url)?
        else {
            return Ok(FetchOutcome::Skipped(SkipReason::FinanceUnavailable));
        };

        let url = api::industries_url(entity_id, &self.api_key);
        let Some(raw_industries) =
            self.fetch_function(entity_id, CacheFunction::Industries, &url)?
        else {
            return Ok(FetchOutcome::Skipped(SkipReason::FinanceUnavailable));
        };
        let industries =
            process_industries(&raw_industries).ok_or_else(|| GatherError::ApiPayload {
                entity_id: entity_id.to_string(),
                message: "industries payload is not an array".to_string(),
            })?;

        Ok(FetchOutcome::Fetched(FetchedEntity {
            metadata,
            fec_summary,
            industries,
        }))
    }

    fn fetch_function(
        &self,
        entity_id: &EntityId,
        function: CacheFunction,
        url: &str,
    ) -> Result<Option<Value>, GatherError> {
        let cache_path = self.store.cache_path(entity_id, function);
        if !self.force {
            if let Some(cached) = self.store.read_cached(&cache_path)? {
                debug!("[{entity_id}] cached {function} from {cache_path}, not downloading");
                return Ok(non_null(cached));
            }
        }

        debug!("[{entity_id}] downloading {url} to {cache_path}");
        let Some(body) = self.client.get_json(url)? else {
            return Ok(None);
        };
        let Some(body) = non_null(body) else {
            warn!("[{entity_id}] empty {function} payload from {url}");
            return Ok(None);
        };
        Store::write_json(&cache_path, &body)?;
        self.store.write_cache_record(entity_id, function, url)?;
        Ok(Some(body))
    }
}

fn non_null(value: Value) -> Option<Value> {
    if value.is_null() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use camino::Utf8PathBuf;
    use serde_json::json;

    use super::*;

    struct CannedClient {
        responses: HashMap<String, Value>,
        calls: AtomicUsize,
    }

    impl CannedClient {
        fn new(responses: HashMap<String, Value>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ApiClient for CannedClient {
        fn get_json(&self, url: &str) -> Result<Option<Value>, GatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.get(url).cloned())
        }
    }

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root.join("cache"), root.join("districts"));
        (dir, store)
    }

    fn entity_responses(api_key: &str, id: &EntityId) -> HashMap<String, Value> {
        let mut responses = HashMap::new();
        responses.insert(
            api::entity_url(id, api_key),
            json!({"metadata": {
                "entity": id.as_str(),
                "name": "Jane Doe",
                "seat": "federal:house",
                "district": "OH-03",
                "state": "OH",
                "party": "D",
                "seat_status": "I"
            }}),
        );
        responses.insert(
            api::fec_summary_url(id, api_key),
            json!({"total_raised": "1200.00"}),
        );
        responses.insert(
            api::industries_url(id, api_key),
            json!([{"count": "3", "amount": "900.00", "id": "x1", "name": "real estate"}]),
        );
        responses
    }

    fn fetched(outcome: FetchOutcome) -> FetchedEntity {
        match outcome {
            FetchOutcome::Fetched(entity) => entity,
            FetchOutcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn assembles_all_three_payloads() {
        let id: EntityId = "aabb01".parse().unwrap();
        let client = CannedClient::new(entity_responses("k", &id));
        let (_dir, store) = temp_store();
        let fetcher = EntityFetcher::new(&client, &store, "k".to_string(), false, Strictness::Lenient);

        let entity = fetched(fetcher.fetch_entity(&id).unwrap());
        assert_eq!(entity.metadata.name, "Jane Doe");
        assert!(entity.metadata.incumbent());
        assert_eq!(entity.industries[0].name, "Real Estate");
        assert_eq!(entity.fec_summary, json!({"total_raised": "1200.00"}));
    }

    #[test]
    fn second_fetch_reads_the_cache() {
        let id: EntityId = "aabb01".parse().unwrap();
        let client = CannedClient::new(entity_responses("k", &id));
        let (_dir, store) = temp_store();
        let fetcher = EntityFetcher::new(&client, &store, "k".to_string(), false, Strictness::Lenient);

        fetched(fetcher.fetch_entity(&id).unwrap());
        let calls_after_first = client.calls.load(Ordering::SeqCst);
        fetched(fetcher.fetch_entity(&id).unwrap());
        assert_eq!(client.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[test]
    fn force_bypasses_the_cache() {
        let id: EntityId = "aabb01".parse().unwrap();
        let client = CannedClient::new(entity_responses("k", &id));
        let (_dir, store) = temp_store();
        let fetcher = EntityFetcher::new(&client, &store, "k".to_string(), true, Strictness::Lenient);

        fetched(fetcher.fetch_entity(&id).unwrap());
        let calls_after_first = client.calls.load(Ordering::SeqCst);
        fetched(fetcher.fetch_entity(&id).unwrap());
        assert_eq!(client.calls.load(Ordering::SeqCst), calls_after_first * 2);
    }

    #[test]
    fn missing_metadata_skips_when_lenient() {
        let id: EntityId = "aabb01".parse().unwrap();
        let client = CannedClient::new(HashMap::new());
        let (_dir, store) = temp_store();
        let fetcher = EntityFetcher::new(&client, &store, "k".to_string(), false, Strictness::Lenient);

        assert_matches::assert_matches!(
            fetcher.fetch_entity(&id).unwrap(),
            FetchOutcome::Skipped(SkipReason::MetadataUnavailable)
        );
    }

    #[test]
    fn missing_metadata_aborts_when_strict() {
        let id: EntityId = "aabb01".parse().unwrap();
        let client = CannedClient::new(HashMap::new());
        let (_dir, store) = temp_store();
        let fetcher = EntityFetcher::new(&client, &store, "k".to_string(), false, Strictness::Strict);

        let err = fetcher.fetch_entity(&id).unwrap_err();
        assert_matches::assert_matches!(err, GatherError::UnresolvableEntity { .. });
    }

    #[test]
    fn missing_finance_disqualifies_the_entity() {
        let id: EntityId = "aabb01".parse().unwrap();
        let mut responses = entity_responses("k", &id);
        responses.remove(&api::fec_summary_url(&id, "k"));
        let client = CannedClient::new(responses);
        let (_dir, store) = temp_store();
        let fetcher = EntityFetcher::new(&client, &store, "k".to_string(), false, Strictness::Strict);

        assert_matches::assert_matches!(
            fetcher.fetch_entity(&id).unwrap(),
            FetchOutcome::Skipped(SkipReason::FinanceUnavailable)
        );
    }
}
