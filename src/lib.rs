//! Backend gatherer for the district endorsements site: joins a CSV of
//! candidate endorsements with campaign-finance API records and static
//! per-race reference data into one JSON file per House district.

pub mod aggregate;
pub mod api;
pub mod app;
pub mod classify;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod industries;
pub mod matcher;
pub mod reference;
pub mod store;
