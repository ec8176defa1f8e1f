//! Performa reconciler
//!
//! Keeps at most one performa record per (organization, period) and routes
//! partial saves to the right sub-resource:
//!
//! - [`PerformaReconciler::get_or_create`] fetches the period's record and
//!   creates it only when the backend reports it missing.
//! - [`PerformaReconciler::save_indicators`] upserts the four headline
//!   indicators; the backend creates the record if needed.
//! - [`PerformaReconciler::save_bisnis`] / [`PerformaReconciler::save_organisasi`]
//!   replace one sub-form of an already-resolved record.
//!
//! Every mutation invalidates the cached period list and the affected record.
//! Nothing is retried; remote failures carry the most specific message the
//! backend supplied.

use crate::cache::ViewCache;
use crate::client::ApiTransport;
use crate::error::{PerformaError, Result};
use crate::models::{Indicators, PerformaBisnis, PerformaOrganisasi, PerformaRecord, PeriodSummary};
use crate::normalize::{normalize_bisnis, normalize_organisasi};
use crate::period::PeriodKey;
use crate::progress::KuesionerProgress;
use kop_common::api::ApiResponse;
use kop_common::Cadence;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// How long a resolved (organization, period) -> id mapping is trusted
const RESOLVED_RETENTION: Duration = Duration::from_secs(60 * 60);

const MSG_LOAD: &str = "Gagal memuat data performa";
const MSG_LOAD_PERIODS: &str = "Gagal memuat daftar periode";
const MSG_CREATE: &str = "Gagal membuat performa";
const MSG_SAVE: &str = "Gagal menyimpan performa";
const MSG_SAVE_BISNIS: &str = "Gagal menyimpan performa bisnis";
const MSG_SAVE_ORGANISASI: &str = "Gagal menyimpan performa organisasi";
const MSG_DELETE: &str = "Gagal menghapus performa";

// ========================================
// Endpoint paths
// ========================================

fn collection_path(org: &str) -> String {
    format!("/organizations/{}/performa", org)
}

fn periods_path(org: &str) -> String {
    format!("/organizations/{}/performa/periods", org)
}

fn period_path(org: &str, period: &PeriodKey) -> String {
    format!("/organizations/{}/performa/{}", org, period)
}

fn record_path(org: &str, performa_id: u64) -> String {
    format!("/organizations/{}/performa/{}", org, performa_id)
}

fn bisnis_path(org: &str, performa_id: u64) -> String {
    format!("/organizations/{}/performa/{}/bisnis", org, performa_id)
}

fn organisasi_path(org: &str, performa_id: u64) -> String {
    format!("/organizations/{}/performa/{}/organisasi", org, performa_id)
}

/// Organization ids are opaque, but must be usable as a path segment
fn check_org(org: &str) -> Result<()> {
    if org.trim().is_empty() || org.contains(['/', '?', '#']) {
        return Err(PerformaError::InvalidInput(format!(
            "organization id '{}' is not a valid path segment",
            org
        )));
    }
    Ok(())
}

/// Decode an envelope payload into a record; a missing payload is `None`
fn decode_record(
    envelope: ApiResponse<Value>,
    fallback: &str,
) -> Result<Option<PerformaRecord>> {
    match envelope.data {
        None | Some(Value::Null) => Ok(None),
        Some(data) => serde_json::from_value(data).map(Some).map_err(|e| {
            warn!(error = %e, "Backend returned an unreadable performa record");
            PerformaError::RemoteFailure {
                status: None,
                message: fallback.to_string(),
            }
        }),
    }
}

/// Reconciles performa records of one cadence against the backend
pub struct PerformaReconciler<T: ApiTransport> {
    transport: T,
    cadence: Cadence,
    cache: ViewCache,
    /// Performa id each (organization, period) resolved to, and when
    resolved: RwLock<HashMap<(String, PeriodKey), (u64, Instant)>>,
}

impl<T: ApiTransport> PerformaReconciler<T> {
    pub fn new(transport: T, cadence: Cadence) -> Self {
        Self {
            transport,
            cadence,
            cache: ViewCache::new(DEFAULT_CACHE_TTL),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the view cache with one of the given TTL (zero disables it)
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ViewCache::new(ttl);
        self
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn check_period(&self, period: &PeriodKey) -> Result<()> {
        if period.cadence() != self.cadence {
            return Err(PerformaError::InvalidPeriod(format!(
                "{} is a {} period, expected {}",
                period,
                period.cadence(),
                self.cadence
            )));
        }
        Ok(())
    }

    // ========================================
    // Resolved ids
    // ========================================

    /// Performa id previously resolved for (org, period), if any
    pub async fn resolved_id(&self, org: &str, period: &PeriodKey) -> Option<u64> {
        self.resolved
            .read()
            .await
            .get(&(org.to_string(), *period))
            .filter(|(_, at)| at.elapsed() < RESOLVED_RETENTION)
            .map(|(id, _)| *id)
    }

    async fn remember(&self, org: &str, period: &PeriodKey, performa_id: u64) {
        let mut resolved = self.resolved.write().await;
        resolved.retain(|_, (_, at)| at.elapsed() < RESOLVED_RETENTION);
        resolved.insert((org.to_string(), *period), (performa_id, Instant::now()));
    }

    async fn period_of(&self, org: &str, performa_id: u64) -> Option<PeriodKey> {
        self.resolved
            .read()
            .await
            .iter()
            .find(|((owner, _), (id, _))| owner == org && *id == performa_id)
            .map(|((_, period), _)| *period)
    }

    async fn forget(&self, org: &str, performa_id: u64) {
        self.resolved
            .write()
            .await
            .retain(|(owner, _), (id, _)| !(owner == org && *id == performa_id));
    }

    async fn forget_period(&self, org: &str, period: &PeriodKey) {
        self.resolved.write().await.remove(&(org.to_string(), *period));
    }

    /// Drop cached views a write to `performa_id` may have changed
    async fn invalidate_record_id(&self, org: &str, performa_id: u64) {
        self.cache.invalidate_periods(org).await;
        match self.period_of(org, performa_id).await {
            Some(period) => self.cache.invalidate_record(org, &period).await,
            None => self.cache.invalidate_org_records(org).await,
        }
    }

    async fn invalidate_period(&self, org: &str, period: &PeriodKey) {
        self.cache.invalidate_periods(org).await;
        self.cache.invalidate_record(org, period).await;
    }

    // ========================================
    // Reads
    // ========================================

    /// Fetch the record for (org, period) from the backend, bypassing the cache
    ///
    /// Fails with [`PerformaError::NotFound`] when no record exists.
    pub async fn fetch_performa(&self, org: &str, period: &PeriodKey) -> Result<PerformaRecord> {
        check_org(org)?;
        self.check_period(period)?;

        let not_found = || PerformaError::NotFound(format!("organization {} period {}", org, period));

        let envelope = match self.transport.get(&period_path(org, period)).await {
            Ok(envelope) => envelope,
            Err(e) if e.is_not_found() => {
                self.forget_period(org, period).await;
                return Err(not_found());
            }
            Err(e) => return Err(e.into_remote_failure(MSG_LOAD)),
        };

        let Some(record) = decode_record(envelope, MSG_LOAD)? else {
            self.forget_period(org, period).await;
            return Err(not_found());
        };
        self.remember(org, period, record.id).await;
        Ok(record)
    }

    /// Cached read of the record for (org, period); `None` when absent
    pub async fn performa(&self, org: &str, period: &PeriodKey) -> Result<Option<PerformaRecord>> {
        check_org(org)?;
        self.check_period(period)?;

        if let Some(record) = self.cache.record(org, period).await {
            debug!(org, period = %period, "Performa served from cache");
            return Ok(Some(record));
        }

        let generation = self.cache.generation(org).await;
        match self.fetch_performa(org, period).await {
            Ok(record) => {
                self.cache
                    .store_record(org, period, generation, record.clone())
                    .await;
                Ok(Some(record))
            }
            Err(PerformaError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cached read of the organization's period list
    pub async fn list_periods(&self, org: &str) -> Result<Vec<PeriodSummary>> {
        check_org(org)?;

        if let Some(periods) = self.cache.periods(org).await {
            debug!(org, count = periods.len(), "Period list served from cache");
            return Ok(periods);
        }

        let generation = self.cache.generation(org).await;
        let envelope = self
            .transport
            .get(&periods_path(org))
            .await
            .map_err(|e| e.into_remote_failure(MSG_LOAD_PERIODS))?;

        let periods: Vec<PeriodSummary> = match envelope.data {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rows)) => rows
                .into_iter()
                .filter_map(|row| match serde_json::from_value::<PeriodSummary>(row) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        warn!(org, error = %e, "Skipping unreadable period row");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                warn!(org, kind = ?other, "Period list payload is not an array");
                return Err(PerformaError::RemoteFailure {
                    status: None,
                    message: MSG_LOAD_PERIODS.to_string(),
                });
            }
        };

        self.cache.store_periods(org, generation, periods.clone()).await;
        Ok(periods)
    }

    /// Business sub-form of a record, normalized; unanswered when absent
    pub async fn load_bisnis(&self, org: &str, performa_id: u64) -> Result<PerformaBisnis> {
        check_org(org)?;
        let data = self.load_sub_form(&bisnis_path(org, performa_id)).await?;
        Ok(normalize_bisnis(data.as_ref()))
    }

    /// Organization sub-form of a record, normalized; unanswered when absent
    pub async fn load_organisasi(&self, org: &str, performa_id: u64) -> Result<PerformaOrganisasi> {
        check_org(org)?;
        let data = self.load_sub_form(&organisasi_path(org, performa_id)).await?;
        Ok(normalize_organisasi(data.as_ref()))
    }

    async fn load_sub_form(&self, path: &str) -> Result<Option<Value>> {
        match self.transport.get(path).await {
            Ok(envelope) => Ok(envelope.data),
            // A fresh record has no sub-form yet
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into_remote_failure(MSG_LOAD)),
        }
    }

    // ========================================
    // Writes
    // ========================================

    /// Record for (org, period), creating it if the backend has none
    ///
    /// Only a not-found answer triggers the create call; any other failure
    /// propagates unchanged.
    pub async fn get_or_create(&self, org: &str, period: &PeriodKey) -> Result<PerformaRecord> {
        match self.fetch_performa(org, period).await {
            Ok(record) => Ok(record),
            Err(PerformaError::NotFound(_)) => self.create(org, period).await,
            Err(e) => Err(e),
        }
    }

    async fn create(&self, org: &str, period: &PeriodKey) -> Result<PerformaRecord> {
        info!(org, period = %period, "Creating performa record");

        let envelope = self
            .transport
            .post(&collection_path(org), json!({ "periode": period.to_string() }))
            .await
            .map_err(|e| e.into_remote_failure(MSG_CREATE))?;

        let record = match decode_record(envelope, MSG_CREATE)? {
            Some(record) => record,
            None => self.fetch_performa(org, period).await?,
        };

        self.remember(org, period, record.id).await;
        self.invalidate_period(org, period).await;
        info!(org, period = %period, performa_id = record.id, "Performa record created");
        Ok(record)
    }

    /// Upsert the four headline indicators for (org, period)
    pub async fn save_indicators(
        &self,
        org: &str,
        period: &PeriodKey,
        indicators: Indicators,
    ) -> Result<PerformaRecord> {
        check_org(org)?;
        self.check_period(period)?;
        indicators.validate()?;

        let body = json!({
            "periode": period.to_string(),
            "cdi": indicators.cdi,
            "bdi": indicators.bdi,
            "odi": indicators.odi,
            "kuadrant": indicators.kuadrant,
        });

        let envelope = self
            .transport
            .post(&collection_path(org), body)
            .await
            .map_err(|e| e.into_remote_failure(MSG_SAVE))?;

        self.invalidate_period(org, period).await;

        let record = match decode_record(envelope, MSG_SAVE)? {
            Some(record) => record,
            None => self.fetch_performa(org, period).await?,
        };
        self.remember(org, period, record.id).await;

        info!(
            org,
            period = %period,
            performa_id = record.id,
            kuadrant = ?indicators.kuadrant,
            "Performa indicators saved"
        );
        Ok(record)
    }

    /// Replace the business sub-form of record `performa_id`
    pub async fn save_bisnis(
        &self,
        org: &str,
        performa_id: Option<u64>,
        data: &PerformaBisnis,
    ) -> Result<()> {
        check_org(org)?;
        let performa_id = performa_id.ok_or_else(|| {
            PerformaError::MissingParent(format!("business form of organization {}", org))
        })?;
        data.validate()?;

        let body = serde_json::to_value(data).map_err(|e| {
            PerformaError::InvalidInput(format!("business form is not serializable: {}", e))
        })?;
        self.transport
            .put(&bisnis_path(org, performa_id), body)
            .await
            .map_err(|e| e.into_remote_failure(MSG_SAVE_BISNIS))?;

        self.invalidate_record_id(org, performa_id).await;
        info!(org, performa_id, "Performa bisnis saved");
        Ok(())
    }

    /// Replace the organization sub-form of record `performa_id`
    pub async fn save_organisasi(
        &self,
        org: &str,
        performa_id: Option<u64>,
        data: &PerformaOrganisasi,
    ) -> Result<()> {
        check_org(org)?;
        let performa_id = performa_id.ok_or_else(|| {
            PerformaError::MissingParent(format!("organization form of organization {}", org))
        })?;
        data.validate()?;

        let body = serde_json::to_value(data).map_err(|e| {
            PerformaError::InvalidInput(format!("organization form is not serializable: {}", e))
        })?;
        self.transport
            .put(&organisasi_path(org, performa_id), body)
            .await
            .map_err(|e| e.into_remote_failure(MSG_SAVE_ORGANISASI))?;

        self.invalidate_record_id(org, performa_id).await;
        info!(org, performa_id, "Performa organisasi saved");
        Ok(())
    }

    /// [`Self::save_bisnis`] against the id resolved earlier for (org, period)
    pub async fn save_bisnis_for_period(
        &self,
        org: &str,
        period: &PeriodKey,
        data: &PerformaBisnis,
    ) -> Result<()> {
        let performa_id = self.resolved_id(org, period).await;
        self.save_bisnis(org, performa_id, data).await
    }

    /// [`Self::save_organisasi`] against the id resolved earlier for (org, period)
    pub async fn save_organisasi_for_period(
        &self,
        org: &str,
        period: &PeriodKey,
        data: &PerformaOrganisasi,
    ) -> Result<()> {
        let performa_id = self.resolved_id(org, period).await;
        self.save_organisasi(org, performa_id, data).await
    }

    /// Delete record `performa_id` and forget any period that resolved to it
    pub async fn delete_performa(&self, org: &str, performa_id: u64) -> Result<()> {
        check_org(org)?;

        self.transport
            .delete(&record_path(org, performa_id))
            .await
            .map_err(|e| e.into_remote_failure(MSG_DELETE))?;

        self.invalidate_record_id(org, performa_id).await;
        self.forget(org, performa_id).await;
        info!(org, performa_id, "Performa deleted");
        Ok(())
    }

    // ========================================
    // Progress
    // ========================================

    /// Completion of both questionnaires for (org, period)
    ///
    /// Creates the period's record when missing, then loads both sub-forms
    /// concurrently.
    pub async fn kuesioner_progress(
        &self,
        org: &str,
        period: &PeriodKey,
    ) -> Result<KuesionerProgress> {
        let record = self.get_or_create(org, period).await?;
        let (organisasi, bisnis) = tokio::try_join!(
            self.load_organisasi(org, record.id),
            self.load_bisnis(org, record.id)
        )?;
        Ok(KuesionerProgress::from_forms(&organisasi, &bisnis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let period = PeriodKey::parse("2024-05", Cadence::Monthly).unwrap();
        assert_eq!(collection_path("7"), "/organizations/7/performa");
        assert_eq!(periods_path("7"), "/organizations/7/performa/periods");
        assert_eq!(period_path("7", &period), "/organizations/7/performa/2024-05");
        assert_eq!(bisnis_path("7", 12), "/organizations/7/performa/12/bisnis");
        assert_eq!(
            organisasi_path("7", 12),
            "/organizations/7/performa/12/organisasi"
        );
        assert_eq!(record_path("7", 12), "/organizations/7/performa/12");
    }

    #[test]
    fn test_check_org() {
        assert!(check_org("kop-7").is_ok());
        assert!(check_org("").is_err());
        assert!(check_org("  ").is_err());
        assert!(check_org("7/performa").is_err());
    }

    #[test]
    fn test_decode_record_missing_payload() {
        let envelope = ApiResponse::<Value>::failure("");
        assert!(decode_record(envelope, MSG_LOAD).unwrap().is_none());

        let envelope = ApiResponse::ok("OK", json!({"periode": "2024-05"}));
        assert!(matches!(
            decode_record(envelope, MSG_LOAD),
            Err(PerformaError::RemoteFailure { .. })
        ));
    }
}
