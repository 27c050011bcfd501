//! COVID-19 statistics: worldwide summary, per-country detail and history,
//! fetched from the disease.sh API.
//!
//! The pure pieces ([`metrics::derive`], [`search::filter`],
//! [`i18n::Catalog::translate`]) are shared by the `tracker` API server and
//! the `tui` dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod i18n;
pub mod metrics;
pub mod search;
pub mod types;
