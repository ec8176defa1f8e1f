//! Organization-performance sub-form

use super::{empty_as_none, WireEnum};
use crate::error::{PerformaError, Result};
use serde::{Deserialize, Serialize};

/// Training categories offered for the training table
pub const PELATIHAN_OPTIONS: &[&str] = &[
    "Pengurus",
    "Pengawas",
    "GeneralManager",
    "Karyawan",
    "Anggota",
    "NonAnggota",
];

/// Legal/operational status of the cooperative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKoperasi {
    Aktif,
    TidakAktif,
    Pembentukan,
}

impl WireEnum for StatusKoperasi {
    const ALL: &'static [Self] = &[
        StatusKoperasi::Aktif,
        StatusKoperasi::TidakAktif,
        StatusKoperasi::Pembentukan,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            StatusKoperasi::Aktif => "Aktif",
            StatusKoperasi::TidakAktif => "TidakAktif",
            StatusKoperasi::Pembentukan => "Pembentukan",
        }
    }
}

/// How often a coordination meeting is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrekuensiRapat {
    SatuMinggu,
    DuaMinggu,
    SatuBulan,
    DuaBulan,
    TigaBulanLebih,
}

impl WireEnum for FrekuensiRapat {
    const ALL: &'static [Self] = &[
        FrekuensiRapat::SatuMinggu,
        FrekuensiRapat::DuaMinggu,
        FrekuensiRapat::SatuBulan,
        FrekuensiRapat::DuaBulan,
        FrekuensiRapat::TigaBulanLebih,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            FrekuensiRapat::SatuMinggu => "satu_minggu",
            FrekuensiRapat::DuaMinggu => "dua_minggu",
            FrekuensiRapat::SatuBulan => "satu_bulan",
            FrekuensiRapat::DuaBulan => "dua_bulan",
            FrekuensiRapat::TigaBulanLebih => "tiga_bulan_lebih",
        }
    }
}

impl FrekuensiRapat {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            FrekuensiRapat::SatuMinggu => "1 Minggu",
            FrekuensiRapat::DuaMinggu => "2 Minggu",
            FrekuensiRapat::SatuBulan => "1 Bulan",
            FrekuensiRapat::DuaBulan => "2 Bulan",
            FrekuensiRapat::TigaBulanLebih => "3 Bulan Lebih",
        }
    }
}

/// Organization-performance answers for one performa record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformaOrganisasi {
    pub jumlah_pengurus: Option<u32>,
    pub jumlah_pengawas: Option<u32>,
    pub jumlah_karyawan: Option<u32>,
    #[serde(with = "empty_as_none")]
    pub status: Option<StatusKoperasi>,
    pub total_anggota: Option<u32>,
    pub anggota_aktif: Option<u32>,
    pub anggota_tidak_aktif: Option<u32>,
    pub general_manager: Option<bool>,
    pub rapat_tepat_waktu: Option<bool>,
    pub rapat_luar_biasa: Option<bool>,
    pub pergantian_pengurus: Option<bool>,
    pub pergantian_pengawas: Option<bool>,
    pub rencana_strategis: RencanaStrategis,
    pub prinsip_koperasi: PrinsipKoperasi,
    pub pelatihan: Vec<Pelatihan>,
    pub rapat_koordinasi: RapatKoordinasi,
}

/// Planning documents the cooperative has in place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RencanaStrategis {
    pub visi: bool,
    pub misi: bool,
    pub rencana_strategis: bool,
    pub sasaran_operasional: bool,
    pub art: bool,
}

impl RencanaStrategis {
    pub fn fields(&self) -> [bool; 5] {
        [
            self.visi,
            self.misi,
            self.rencana_strategis,
            self.sasaran_operasional,
            self.art,
        ]
    }
}

/// Self-assessment against the seven cooperative principles, rated 1-5
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinsipKoperasi {
    pub sukarela_terbuka: Option<u8>,
    pub demokratis: Option<u8>,
    pub ekonomi: Option<u8>,
    pub kemandirian: Option<u8>,
    pub pendidikan: Option<u8>,
    pub kerja_sama: Option<u8>,
    pub kepedulian: Option<u8>,
}

impl PrinsipKoperasi {
    pub fn fields(&self) -> [(&'static str, Option<u8>); 7] {
        [
            ("sukarela_terbuka", self.sukarela_terbuka),
            ("demokratis", self.demokratis),
            ("ekonomi", self.ekonomi),
            ("kemandirian", self.kemandirian),
            ("pendidikan", self.pendidikan),
            ("kerja_sama", self.kerja_sama),
            ("kepedulian", self.kepedulian),
        ]
    }
}

/// Accumulated training participants for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pelatihan {
    pub pelatihan: String,
    pub akumulasi: Option<u32>,
}

/// Meeting cadence for each coordination forum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RapatKoordinasi {
    #[serde(with = "empty_as_none")]
    pub rapat_pengurus: Option<FrekuensiRapat>,
    #[serde(with = "empty_as_none")]
    pub rapat_pengawas: Option<FrekuensiRapat>,
    #[serde(with = "empty_as_none")]
    pub rapat_gabungan: Option<FrekuensiRapat>,
    #[serde(with = "empty_as_none")]
    pub rapat_pengurus_karyawan: Option<FrekuensiRapat>,
    #[serde(with = "empty_as_none")]
    pub rapat_pengurus_anggota: Option<FrekuensiRapat>,
}

impl PerformaOrganisasi {
    /// The twelve scalar answers, as "answered or not"
    pub fn scalar_answers(&self) -> [bool; 12] {
        [
            self.jumlah_pengurus.is_some(),
            self.jumlah_pengawas.is_some(),
            self.jumlah_karyawan.is_some(),
            self.status.is_some(),
            self.total_anggota.is_some(),
            self.anggota_aktif.is_some(),
            self.anggota_tidak_aktif.is_some(),
            self.general_manager.is_some(),
            self.rapat_tepat_waktu.is_some(),
            self.rapat_luar_biasa.is_some(),
            self.pergantian_pengurus.is_some(),
            self.pergantian_pengawas.is_some(),
        ]
    }

    /// Check rating ranges before the form is sent
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.prinsip_koperasi.fields() {
            if let Some(v) = value {
                if !(1..=5).contains(&v) {
                    return Err(PerformaError::InvalidInput(format!(
                        "prinsip_koperasi.{} must be 1-5, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_enum_serializes_as_empty_string() {
        let json = serde_json::to_value(PerformaOrganisasi::default()).unwrap();
        assert_eq!(json["status"], "");
        assert_eq!(json["rapat_koordinasi"]["rapat_gabungan"], "");
    }

    #[test]
    fn test_enum_wire_values() {
        let form = PerformaOrganisasi {
            status: Some(StatusKoperasi::TidakAktif),
            rapat_koordinasi: RapatKoordinasi {
                rapat_pengurus: Some(FrekuensiRapat::TigaBulanLebih),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["status"], "TidakAktif");
        assert_eq!(json["rapat_koordinasi"]["rapat_pengurus"], "tiga_bulan_lebih");

        let back: PerformaOrganisasi = serde_json::from_value(json).unwrap();
        assert_eq!(back, form);
    }

    #[test]
    fn test_deserialize_null_and_empty_status() {
        let form: PerformaOrganisasi = serde_json::from_value(json!({"status": null})).unwrap();
        assert_eq!(form.status, None);
        let form: PerformaOrganisasi = serde_json::from_value(json!({"status": ""})).unwrap();
        assert_eq!(form.status, None);
    }

    #[test]
    fn test_validate_prinsip_range() {
        let mut form = PerformaOrganisasi::default();
        form.prinsip_koperasi.demokratis = Some(5);
        assert!(form.validate().is_ok());

        form.prinsip_koperasi.kepedulian = Some(0);
        assert!(matches!(
            form.validate(),
            Err(PerformaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_frekuensi_from_wire() {
        assert_eq!(
            FrekuensiRapat::from_wire("dua_minggu"),
            Some(FrekuensiRapat::DuaMinggu)
        );
        assert_eq!(FrekuensiRapat::from_wire(""), None);
        assert_eq!(FrekuensiRapat::SatuBulan.label(), "1 Bulan");
    }
}
