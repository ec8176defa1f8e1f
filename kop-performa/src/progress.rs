//! Questionnaire completion scoring
//!
//! Each sub-form is scored against a fixed point inventory and reported as an
//! integer percentage. Weights:
//!
//! | Sub-form   | Denominator | Contributions                                              |
//! |------------|-------------|------------------------------------------------------------|
//! | organisasi | 20          | 12 scalars if answered, 5 plans if ticked, 7 ratings if set |
//! | bisnis     | 25          | 2 projections, 2 per non-empty table, 21 finance fields, 1 if any problem ticked |
//!
//! The organisasi inventory holds 24 points against a denominator of 20, so a
//! form reaches 100% before every answer is given. Percentages are capped at 100.

use crate::models::{PerformaBisnis, PerformaOrganisasi};
use serde::{Deserialize, Serialize};

pub const ORGANISASI_DENOMINATOR: u32 = 20;
pub const BISNIS_DENOMINATOR: u32 = 25;

/// Completion state shown next to a questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KuesionerStatus {
    BelumMulai,
    SedangMengisi,
    Selesai,
}

impl KuesionerStatus {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0 => KuesionerStatus::BelumMulai,
            100..=u8::MAX => KuesionerStatus::Selesai,
            _ => KuesionerStatus::SedangMengisi,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KuesionerStatus::BelumMulai => "Belum Mulai",
            KuesionerStatus::SedangMengisi => "Sedang Mengisi",
            KuesionerStatus::Selesai => "Selesai",
        }
    }
}

/// Completion of both sub-forms of one performa record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KuesionerProgress {
    pub organisasi: u8,
    pub bisnis: u8,
    pub total: u8,
    pub status: KuesionerStatus,
}

impl KuesionerProgress {
    pub fn from_forms(organisasi: &PerformaOrganisasi, bisnis: &PerformaBisnis) -> Self {
        let org = organisasi_progress(organisasi);
        let biz = bisnis_progress(bisnis);
        let total = mean_percent(org, biz);
        Self {
            organisasi: org,
            bisnis: biz,
            total,
            status: KuesionerStatus::from_percent(total),
        }
    }
}

/// Raw organisasi points, before division (may exceed the denominator)
pub fn organisasi_points(form: &PerformaOrganisasi) -> u32 {
    let scalars = form.scalar_answers().iter().filter(|answered| **answered).count();
    let plans = form.rencana_strategis.fields().iter().filter(|ticked| **ticked).count();
    let ratings = form
        .prinsip_koperasi
        .fields()
        .iter()
        .filter(|(_, value)| value.is_some())
        .count();
    (scalars + plans + ratings) as u32
}

/// Raw bisnis points, before division (may exceed the denominator)
pub fn bisnis_points(form: &PerformaBisnis) -> u32 {
    let projections = [form.proyeksi_rugi_laba, form.proyeksi_arus_kas]
        .iter()
        .filter(|p| p.is_some())
        .count();
    let tables = [form.hubungan_lembaga.is_empty(), form.unit_usaha.is_empty()]
        .iter()
        .filter(|empty| !**empty)
        .count()
        * 2;
    let finance = form
        .keuangan
        .fields()
        .iter()
        .chain(form.neraca_aktiva.fields().iter())
        .chain(form.neraca_passiva.fields().iter())
        .filter(|v| v.is_some())
        .count();
    let problems = usize::from(form.masalah_keuangan.any());
    (projections + tables + finance + problems) as u32
}

pub fn organisasi_progress(form: &PerformaOrganisasi) -> u8 {
    percent(organisasi_points(form), ORGANISASI_DENOMINATOR)
}

pub fn bisnis_progress(form: &PerformaBisnis) -> u8 {
    percent(bisnis_points(form), BISNIS_DENOMINATOR)
}

/// Rounded mean of both sub-form percentages
pub fn total_progress(organisasi: &PerformaOrganisasi, bisnis: &PerformaBisnis) -> u8 {
    mean_percent(organisasi_progress(organisasi), bisnis_progress(bisnis))
}

/// `round(points / denominator * 100)`, half rounding up, capped at 100
fn percent(points: u32, denominator: u32) -> u8 {
    let rounded = (points * 200 + denominator) / (denominator * 2);
    rounded.min(100) as u8
}

fn mean_percent(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) / 2) as u8
}
