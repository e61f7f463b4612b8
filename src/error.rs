use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GatherError {
    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("missing API key (pass --api-key or set TRANSPARENCY_API_KEY)")]
    MissingApiKey,

    #[error("failed to read reference file at {0}")]
    ReferenceRead(PathBuf),

    #[error("failed to parse reference file {path}: {message}")]
    ReferenceParse { path: PathBuf, message: String },

    #[error("failed to read endorsements file at {0}")]
    EndorsementsRead(PathBuf),

    #[error("endorsements row {line}: {message}")]
    EndorsementRow { line: usize, message: String },

    #[error("[{entity_id}] could not resolve entity metadata")]
    UnresolvableEntity { entity_id: String },

    #[error("[{entity_id}] unrecognized seat: {seat}")]
    UnrecognizedSeat { entity_id: String, seat: String },

    #[error("[{entity_id}] no district in metadata for a House seat")]
    MissingDistrict { entity_id: String },

    #[error("[{entity_id}] invalid House district: {key}")]
    InvalidDistrict { entity_id: String, key: String },

    #[error("[{entity_id}] no reference pool for {key}")]
    UnknownReferencePool { entity_id: String, key: String },

    #[error("[{entity_id}] ambiguous name match for \"{last_name}\": {matches:?}")]
    AmbiguousName {
        entity_id: String,
        last_name: String,
        matches: Vec<String>,
    },

    #[error("transparencydata request failed: {0}")]
    ApiHttp(String),

    #[error("invalid JSON from {url}: {message}")]
    ApiJson { url: String, message: String },

    #[error("[{entity_id}] unexpected API payload: {message}")]
    ApiPayload { entity_id: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
