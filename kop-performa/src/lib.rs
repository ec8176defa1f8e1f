//! # Kopdesk Performa Library (kop-performa)
//!
//! Periodic cooperative performance survey ("performa"): one snapshot per
//! organization per reporting period, holding four headline indicators plus
//! a business and an organization questionnaire.
//!
//! - [`period`]: reporting-period keys (`YYYY-MM` / `YYYY`)
//! - [`normalize`]: loosely-typed backend JSON to canonical form shapes
//! - [`progress`]: questionnaire completion scoring
//! - [`reconciler`]: get-or-create and partial-save routing over HTTP
//! - [`client`]: the HTTP collaborator seam and its reqwest implementation

pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod normalize;
pub mod period;
pub mod progress;
pub mod reconciler;

pub use client::{ApiTransport, HttpTransport, TransportError};
pub use error::{PerformaError, Result};
pub use period::PeriodKey;
pub use progress::{KuesionerProgress, KuesionerStatus};
pub use reconciler::PerformaReconciler;
