//! Per-period parent record

use super::{PerformaBisnis, PerformaOrganisasi};
use crate::error::{PerformaError, Result};
use crate::normalize::{
    lenient, lookup, normalize_bisnis, normalize_organisasi, number, rating, text, unsigned,
};
use crate::period::PeriodKey;
use kop_common::Cadence;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One performa snapshot: an organization's answers for one reporting period
///
/// At most one record exists per (organization, period). The sub-forms are
/// present only when the backend embeds them in the response.
///
/// Decoding goes through [`normalize`](crate::normalize): every key is read
/// snake_case first, then camelCase, so payloads carrying both spellings
/// decode instead of failing on a duplicate field. Only `id` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct PerformaRecord {
    pub id: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    pub periode: String,

    /// Cooperative development index
    pub cdi: Option<f64>,
    /// Business development index
    pub bdi: Option<f64>,
    /// Organization development index
    pub odi: Option<f64>,
    /// Quadrant 1-4 derived from the indices
    pub kuadrant: Option<u8>,

    pub created_at: Option<String>,
    pub updated_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performa_bisnis: Option<PerformaBisnis>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performa_organisasi: Option<PerformaOrganisasi>,
}

impl TryFrom<Value> for PerformaRecord {
    type Error = String;

    fn try_from(raw: Value) -> std::result::Result<Self, Self::Error> {
        if !raw.is_object() {
            return Err(format!("performa record must be an object, got {}", raw));
        }
        let field = |snake: &str| lookup(Some(&raw), snake);
        let optional_text = |snake: &str| Some(text(field(snake))).filter(|s| !s.is_empty());

        let id = unsigned(field("id"))
            .ok_or_else(|| format!("invalid record id: {:?}", field("id")))?;

        Ok(Self {
            id,
            organization_id: optional_text("organization_id")
                .or_else(|| optional_text("koperasi_id")),
            periode: text(field("periode")),
            cdi: number(field("cdi")),
            bdi: number(field("bdi")),
            odi: number(field("odi")),
            kuadrant: rating(field("kuadrant")),
            created_at: optional_text("created_at"),
            updated_at: optional_text("updated_at"),
            performa_bisnis: field("performa_bisnis").map(|v| normalize_bisnis(Some(v))),
            performa_organisasi: field("performa_organisasi")
                .map(|v| normalize_organisasi(Some(v))),
        })
    }
}

impl PerformaRecord {
    /// Period this record belongs to, read leniently from `periode`
    pub fn period_key(&self, cadence: Cadence) -> Result<PeriodKey> {
        PeriodKey::from_backend(&self.periode, cadence)
    }
}

/// Entry of an organization's period list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub periode: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub month_year: Option<String>,
    /// Backend-rendered label, e.g. "Mei 2024"
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub formatted: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub cdi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub bdi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub odi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_u8")]
    pub kuadrant: Option<u8>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub has_data: Option<bool>,
}

impl PeriodSummary {
    /// Period key, trying `periode`, then `month_year`, then `year`
    pub fn period_key(&self, cadence: Cadence) -> Option<PeriodKey> {
        std::iter::once(Some(self.periode.as_str()))
            .chain([self.month_year.as_deref(), self.year.as_deref()])
            .flatten()
            .find_map(|raw| PeriodKey::from_backend(raw, cadence).ok())
    }

    /// Label to show: the backend's, else one derived from the key
    pub fn label(&self, cadence: Cadence) -> String {
        match (&self.formatted, self.period_key(cadence)) {
            (Some(formatted), _) => formatted.clone(),
            (None, Some(key)) => key.label(),
            (None, None) => self.periode.clone(),
        }
    }
}

/// The four headline indicators of a performa record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub cdi: Option<f64>,
    pub bdi: Option<f64>,
    pub odi: Option<f64>,
    pub kuadrant: Option<u8>,
}

impl Indicators {
    pub fn validate(&self) -> Result<()> {
        if let Some(k) = self.kuadrant {
            if !(1..=4).contains(&k) {
                return Err(PerformaError::InvalidInput(format!(
                    "kuadrant must be 1-4, got {}",
                    k
                )));
            }
        }
        for (name, value) in [("cdi", self.cdi), ("bdi", self.bdi), ("odi", self.odi)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(PerformaError::InvalidInput(format!(
                    "{} must be a finite number",
                    name
                )));
            }
        }
        Ok(())
    }
}
