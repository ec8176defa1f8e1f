//! Business-performance sub-form

use crate::error::{PerformaError, Result};
use serde::{Deserialize, Serialize};

/// Institution categories offered for the partner-relationship table
pub const LEMBAGA_OPTIONS: &[&str] = &[
    "Perbankan Pemerintah",
    "Perbankan Swasta",
    "Keuangan Non-Bank",
    "BUMN",
    "Pemerintah Daerah",
    "Swasta",
    "Masyarakat",
];

/// Business-unit categories offered for the unit table
pub const UNIT_OPTIONS: &[&str] = &[
    "Gerai Sembako",
    "Klinik Desa",
    "Gerai Obat",
    "Jasa Logistik",
    "Gudang",
    "Simpan Pinjam",
    "Unit Lain",
];

/// Business-performance answers for one performa record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformaBisnis {
    /// Has a projected profit-and-loss statement
    pub proyeksi_rugi_laba: Option<bool>,
    /// Has a projected cash-flow statement
    pub proyeksi_arus_kas: Option<bool>,
    pub hubungan_lembaga: Vec<HubunganLembaga>,
    pub unit_usaha: Vec<UnitUsaha>,
    pub keuangan: Keuangan,
    pub neraca_aktiva: NeracaAktiva,
    pub neraca_passiva: NeracaPassiva,
    pub masalah_keuangan: MasalahKeuangan,
}

/// Relationship with one partner institution, rated 1-4 on each axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubunganLembaga {
    pub lembaga: String,
    pub kemudahan: Option<u8>,
    pub intensitas: Option<u8>,
    pub dampak: Option<u8>,
}

/// One business unit run by the cooperative
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitUsaha {
    pub unit: String,
    pub volume_usaha: Option<f64>,
    pub investasi: Option<f64>,
    pub model_kerja: Option<f64>,
    pub surplus: Option<f64>,
    pub jumlah_sdm: Option<u32>,
    pub jumlah_anggota: Option<u32>,
}

/// Funding sources and operating results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keuangan {
    pub pinjaman_bank: Option<f64>,
    pub investasi: Option<f64>,
    pub modal_kerja: Option<f64>,
    pub simpanan_anggota: Option<f64>,
    pub hibah: Option<f64>,
    pub omset: Option<f64>,
    pub operasional: Option<f64>,
    pub surplus: Option<f64>,
}

impl Keuangan {
    pub fn fields(&self) -> [Option<f64>; 8] {
        [
            self.pinjaman_bank,
            self.investasi,
            self.modal_kerja,
            self.simpanan_anggota,
            self.hibah,
            self.omset,
            self.operasional,
            self.surplus,
        ]
    }
}

/// Balance sheet, assets side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeracaAktiva {
    pub kas: Option<f64>,
    pub piutang: Option<f64>,
    pub aktiva_lancar: Option<f64>,
    pub tanah: Option<f64>,
    pub bangunan: Option<f64>,
    pub kendaraan: Option<f64>,
    pub aktiva_tetap: Option<f64>,
    pub total_aktiva: Option<f64>,
}

impl NeracaAktiva {
    pub fn fields(&self) -> [Option<f64>; 8] {
        [
            self.kas,
            self.piutang,
            self.aktiva_lancar,
            self.tanah,
            self.bangunan,
            self.kendaraan,
            self.aktiva_tetap,
            self.total_aktiva,
        ]
    }
}

/// Balance sheet, liabilities and equity side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeracaPassiva {
    pub hutang_lancar: Option<f64>,
    pub hutang_jangka_panjang: Option<f64>,
    pub total_hutang: Option<f64>,
    pub modal: Option<f64>,
    pub total_passiva: Option<f64>,
}

impl NeracaPassiva {
    pub fn fields(&self) -> [Option<f64>; 5] {
        [
            self.hutang_lancar,
            self.hutang_jangka_panjang,
            self.total_hutang,
            self.modal,
            self.total_passiva,
        ]
    }
}

/// Financial problems checklist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasalahKeuangan {
    pub rugi_keseluruhan: bool,
    pub rugi_sebagian: bool,
    pub arus_kas: bool,
    pub piutang: bool,
    pub jatuh_tempo: bool,
    pub kredit: bool,
    pub penggelapan: bool,
}

impl MasalahKeuangan {
    pub fn any(&self) -> bool {
        self.rugi_keseluruhan
            || self.rugi_sebagian
            || self.arus_kas
            || self.piutang
            || self.jatuh_tempo
            || self.kredit
            || self.penggelapan
    }
}

impl PerformaBisnis {
    /// Check rating ranges before the form is sent
    pub fn validate(&self) -> Result<()> {
        for (index, row) in self.hubungan_lembaga.iter().enumerate() {
            for (axis, value) in [
                ("kemudahan", row.kemudahan),
                ("intensitas", row.intensitas),
                ("dampak", row.dampak),
            ] {
                if let Some(v) = value {
                    if !(1..=4).contains(&v) {
                        return Err(PerformaError::InvalidInput(format!(
                            "hubungan_lembaga[{}].{} must be 1-4, got {}",
                            index, axis, v
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unanswered() {
        let form = PerformaBisnis::default();
        assert!(form.hubungan_lembaga.is_empty());
        assert!(form.keuangan.fields().iter().all(Option::is_none));
        assert!(!form.masalah_keuangan.any());
    }

    #[test]
    fn test_validate_rating_range() {
        let mut form = PerformaBisnis::default();
        form.hubungan_lembaga.push(HubunganLembaga {
            lembaga: "BUMN".to_string(),
            kemudahan: Some(4),
            intensitas: Some(1),
            dampak: None,
        });
        assert!(form.validate().is_ok());

        form.hubungan_lembaga[0].dampak = Some(5);
        assert!(matches!(
            form.validate(),
            Err(PerformaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serializes_nulls_for_unanswered() {
        let json = serde_json::to_value(PerformaBisnis::default()).unwrap();
        assert!(json["keuangan"]["omset"].is_null());
        assert_eq!(json["masalah_keuangan"]["kredit"], false);
        assert_eq!(json["unit_usaha"], serde_json::json!([]));
    }
}
