//! Survey record normalization
//!
//! Turns loosely-typed backend JSON into the canonical form shapes of
//! [`PerformaBisnis`] and [`PerformaOrganisasi`].
//!
//! Rules:
//! - Every key is looked up snake_case first, then camelCase (one API version
//!   serializes nested groups as `neracaAktiva` etc.). A `null` under the
//!   snake key counts as absent.
//! - Every field is defaulted on its own: unanswered numbers are `None`,
//!   checklist booleans are `false`, enum strings are empty, lists are empty.
//! - Numbers may arrive as JSON numbers or numeric strings (`"1500.00"`);
//!   booleans may arrive as `true/false` or `1/0`. Anything else is unanswered.
//!
//! Normalization is total: it never fails, whatever the input.

use crate::models::{
    FrekuensiRapat, HubunganLembaga, Keuangan, MasalahKeuangan, NeracaAktiva, NeracaPassiva,
    Pelatihan, PerformaBisnis, PerformaOrganisasi, PrinsipKoperasi, RapatKoordinasi,
    RencanaStrategis, StatusKoperasi, UnitUsaha, WireEnum,
};
use serde_json::Value;

// ========================================
// Key lookup
// ========================================

/// First non-null value under any of `keys`, tried in order
///
/// # Examples
///
/// ```
/// use kop_performa::normalize::first_present;
/// use serde_json::json;
///
/// let raw = json!({"neraca_aktiva": null, "neracaAktiva": {"kas": 200}});
/// let block = first_present(&raw, &["neraca_aktiva", "neracaAktiva"]).unwrap();
/// assert_eq!(block["kas"], 200);
/// ```
pub fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// camelCase spelling of a snake_case key (`neraca_aktiva` -> `neracaAktiva`)
pub fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Look up `snake_key` on `obj`, falling back to its camelCase spelling
pub(crate) fn lookup<'a>(obj: Option<&'a Value>, snake_key: &str) -> Option<&'a Value> {
    let obj = obj?;
    let camel = camel_case(snake_key);
    if camel == snake_key {
        return first_present(obj, &[snake_key]);
    }
    first_present(obj, &[snake_key, camel.as_str()])
}

/// Elements of the list under `snake_key` (or its camelCase spelling)
fn list<'a>(obj: Option<&'a Value>, snake_key: &str) -> &'a [Value] {
    lookup(obj, snake_key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// ========================================
// Scalar decoding
// ========================================

/// Nullable number; numeric strings are accepted, empty strings are `None`
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Nullable non-negative integer
pub(crate) fn unsigned(value: Option<&Value>) -> Option<u64> {
    let n = number(value)?;
    if n < 0.0 || n.fract() != 0.0 || n > u64::MAX as f64 {
        return None;
    }
    Some(n as u64)
}

/// Nullable headcount / membership count
pub(crate) fn count(value: Option<&Value>) -> Option<u32> {
    unsigned(value).and_then(|n| u32::try_from(n).ok())
}

/// Nullable small rating (1-4 or 1-5 scale; range is checked on save)
pub(crate) fn rating(value: Option<&Value>) -> Option<u8> {
    unsigned(value).and_then(|n| u8::try_from(n).ok())
}

/// Nullable yes/no answer
pub(crate) fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "ya" => Some(true),
            "false" | "0" | "tidak" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Checklist tick: unanswered means not ticked
fn tick(value: Option<&Value>) -> bool {
    flag(value).unwrap_or(false)
}

/// Free text / category name; non-strings other than numbers become empty
pub(crate) fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Enum stored as a string; unknown or empty values are `None`
fn choice<T: WireEnum>(value: Option<&Value>) -> Option<T> {
    value.and_then(Value::as_str).and_then(T::from_wire)
}

// ========================================
// Business sub-form
// ========================================

/// Normalize a raw business-performance record
pub fn normalize_bisnis(raw: Option<&Value>) -> PerformaBisnis {
    PerformaBisnis {
        proyeksi_rugi_laba: flag(lookup(raw, "proyeksi_rugi_laba")),
        proyeksi_arus_kas: flag(lookup(raw, "proyeksi_arus_kas")),
        hubungan_lembaga: list(raw, "hubungan_lembaga")
            .iter()
            .map(|item| hubungan_lembaga(Some(item)))
            .collect(),
        unit_usaha: list(raw, "unit_usaha")
            .iter()
            .map(|item| unit_usaha(Some(item)))
            .collect(),
        keuangan: keuangan(lookup(raw, "keuangan")),
        neraca_aktiva: neraca_aktiva(lookup(raw, "neraca_aktiva")),
        neraca_passiva: neraca_passiva(lookup(raw, "neraca_passiva")),
        masalah_keuangan: masalah_keuangan(lookup(raw, "masalah_keuangan")),
    }
}

fn hubungan_lembaga(item: Option<&Value>) -> HubunganLembaga {
    HubunganLembaga {
        lembaga: text(lookup(item, "lembaga")),
        kemudahan: rating(lookup(item, "kemudahan")),
        intensitas: rating(lookup(item, "intensitas")),
        dampak: rating(lookup(item, "dampak")),
    }
}

fn unit_usaha(item: Option<&Value>) -> UnitUsaha {
    UnitUsaha {
        unit: text(lookup(item, "unit")),
        volume_usaha: number(lookup(item, "volume_usaha")),
        investasi: number(lookup(item, "investasi")),
        model_kerja: number(lookup(item, "model_kerja")),
        surplus: number(lookup(item, "surplus")),
        jumlah_sdm: count(lookup(item, "jumlah_sdm")),
        jumlah_anggota: count(lookup(item, "jumlah_anggota")),
    }
}

fn keuangan(block: Option<&Value>) -> Keuangan {
    Keuangan {
        pinjaman_bank: number(lookup(block, "pinjaman_bank")),
        investasi: number(lookup(block, "investasi")),
        modal_kerja: number(lookup(block, "modal_kerja")),
        simpanan_anggota: number(lookup(block, "simpanan_anggota")),
        hibah: number(lookup(block, "hibah")),
        omset: number(lookup(block, "omset")),
        operasional: number(lookup(block, "operasional")),
        surplus: number(lookup(block, "surplus")),
    }
}

fn neraca_aktiva(block: Option<&Value>) -> NeracaAktiva {
    NeracaAktiva {
        kas: number(lookup(block, "kas")),
        piutang: number(lookup(block, "piutang")),
        aktiva_lancar: number(lookup(block, "aktiva_lancar")),
        tanah: number(lookup(block, "tanah")),
        bangunan: number(lookup(block, "bangunan")),
        kendaraan: number(lookup(block, "kendaraan")),
        aktiva_tetap: number(lookup(block, "aktiva_tetap")),
        total_aktiva: number(lookup(block, "total_aktiva")),
    }
}

fn neraca_passiva(block: Option<&Value>) -> NeracaPassiva {
    NeracaPassiva {
        hutang_lancar: number(lookup(block, "hutang_lancar")),
        hutang_jangka_panjang: number(lookup(block, "hutang_jangka_panjang")),
        total_hutang: number(lookup(block, "total_hutang")),
        modal: number(lookup(block, "modal")),
        total_passiva: number(lookup(block, "total_passiva")),
    }
}

fn masalah_keuangan(block: Option<&Value>) -> MasalahKeuangan {
    MasalahKeuangan {
        rugi_keseluruhan: tick(lookup(block, "rugi_keseluruhan")),
        rugi_sebagian: tick(lookup(block, "rugi_sebagian")),
        arus_kas: tick(lookup(block, "arus_kas")),
        piutang: tick(lookup(block, "piutang")),
        jatuh_tempo: tick(lookup(block, "jatuh_tempo")),
        kredit: tick(lookup(block, "kredit")),
        penggelapan: tick(lookup(block, "penggelapan")),
    }
}

// ========================================
// Organization sub-form
// ========================================

/// Normalize a raw organization-performance record
pub fn normalize_organisasi(raw: Option<&Value>) -> PerformaOrganisasi {
    PerformaOrganisasi {
        jumlah_pengurus: count(lookup(raw, "jumlah_pengurus")),
        jumlah_pengawas: count(lookup(raw, "jumlah_pengawas")),
        jumlah_karyawan: count(lookup(raw, "jumlah_karyawan")),
        status: choice::<StatusKoperasi>(lookup(raw, "status")),
        total_anggota: count(lookup(raw, "total_anggota")),
        anggota_aktif: count(lookup(raw, "anggota_aktif")),
        anggota_tidak_aktif: count(lookup(raw, "anggota_tidak_aktif")),
        general_manager: flag(lookup(raw, "general_manager")),
        rapat_tepat_waktu: flag(lookup(raw, "rapat_tepat_waktu")),
        rapat_luar_biasa: flag(lookup(raw, "rapat_luar_biasa")),
        pergantian_pengurus: flag(lookup(raw, "pergantian_pengurus")),
        pergantian_pengawas: flag(lookup(raw, "pergantian_pengawas")),
        rencana_strategis: rencana_strategis(lookup(raw, "rencana_strategis")),
        prinsip_koperasi: prinsip_koperasi(lookup(raw, "prinsip_koperasi")),
        pelatihan: list(raw, "pelatihan")
            .iter()
            .map(|item| pelatihan(Some(item)))
            .collect(),
        rapat_koordinasi: rapat_koordinasi(lookup(raw, "rapat_koordinasi")),
    }
}

fn rencana_strategis(block: Option<&Value>) -> RencanaStrategis {
    RencanaStrategis {
        visi: tick(lookup(block, "visi")),
        misi: tick(lookup(block, "misi")),
        rencana_strategis: tick(lookup(block, "rencana_strategis")),
        sasaran_operasional: tick(lookup(block, "sasaran_operasional")),
        art: tick(lookup(block, "art")),
    }
}

fn prinsip_koperasi(block: Option<&Value>) -> PrinsipKoperasi {
    PrinsipKoperasi {
        sukarela_terbuka: rating(lookup(block, "sukarela_terbuka")),
        demokratis: rating(lookup(block, "demokratis")),
        ekonomi: rating(lookup(block, "ekonomi")),
        kemandirian: rating(lookup(block, "kemandirian")),
        pendidikan: rating(lookup(block, "pendidikan")),
        kerja_sama: rating(lookup(block, "kerja_sama")),
        kepedulian: rating(lookup(block, "kepedulian")),
    }
}

fn pelatihan(item: Option<&Value>) -> Pelatihan {
    Pelatihan {
        pelatihan: text(lookup(item, "pelatihan")),
        akumulasi: count(lookup(item, "akumulasi")),
    }
}

fn rapat_koordinasi(block: Option<&Value>) -> RapatKoordinasi {
    RapatKoordinasi {
        rapat_pengurus: choice::<FrekuensiRapat>(lookup(block, "rapat_pengurus")),
        rapat_pengawas: choice::<FrekuensiRapat>(lookup(block, "rapat_pengawas")),
        rapat_gabungan: choice::<FrekuensiRapat>(lookup(block, "rapat_gabungan")),
        rapat_pengurus_karyawan: choice::<FrekuensiRapat>(lookup(block, "rapat_pengurus_karyawan")),
        rapat_pengurus_anggota: choice::<FrekuensiRapat>(lookup(block, "rapat_pengurus_anggota")),
    }
}

// ========================================
// Serde adapters for lenient record fields
// ========================================

/// `deserialize_with` adapters that decode through the lenient scalar rules
pub(crate) mod lenient {
    use super::*;
    use serde::{Deserialize, Deserializer};

    fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
        Option::<Value>::deserialize(deserializer)
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(unsigned(raw(deserializer)?.as_ref()))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(number(raw(deserializer)?.as_ref()))
    }

    pub fn opt_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
        Ok(rating(raw(deserializer)?.as_ref()))
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(flag(raw(deserializer)?.as_ref()))
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(text(raw(deserializer)?.as_ref()))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Some(text(raw(deserializer)?.as_ref())).filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("neraca_aktiva"), "neracaAktiva");
        assert_eq!(camel_case("rapat_pengurus_karyawan"), "rapatPengurusKaryawan");
        assert_eq!(camel_case("keuangan"), "keuangan");
    }

    #[test]
    fn test_first_present_skips_null_and_missing() {
        let raw = json!({"a": null, "b": 2, "c": 3});
        assert_eq!(first_present(&raw, &["a", "b", "c"]), Some(&json!(2)));
        assert_eq!(first_present(&raw, &["x", "a"]), None);
        assert_eq!(first_present(&json!([1, 2]), &["a"]), None);
    }

    #[test]
    fn test_number_decoding() {
        assert_eq!(number(Some(&json!(0))), Some(0.0));
        assert_eq!(number(Some(&json!(12.5))), Some(12.5));
        assert_eq!(number(Some(&json!("1500.00"))), Some(1500.0));
        assert_eq!(number(Some(&json!(""))), None);
        assert_eq!(number(Some(&json!("n/a"))), None);
        assert_eq!(number(Some(&json!(true))), None);
        assert_eq!(number(None), None);
    }

    #[test]
    fn test_count_rejects_negative_and_fractional() {
        assert_eq!(count(Some(&json!(7))), Some(7));
        assert_eq!(count(Some(&json!("7"))), Some(7));
        assert_eq!(count(Some(&json!(-1))), None);
        assert_eq!(count(Some(&json!(2.5))), None);
    }

    #[test]
    fn test_flag_decoding() {
        assert_eq!(flag(Some(&json!(false))), Some(false));
        assert_eq!(flag(Some(&json!(1))), Some(true));
        assert_eq!(flag(Some(&json!(0))), Some(false));
        assert_eq!(flag(Some(&json!("ya"))), Some(true));
        assert_eq!(flag(Some(&json!(2))), None);
        assert_eq!(flag(Some(&Value::Null)), None);
    }

    #[test]
    fn test_zero_is_an_answer() {
        let raw = json!({"keuangan": {"hibah": 0}});
        let form = normalize_bisnis(Some(&raw));
        assert_eq!(form.keuangan.hibah, Some(0.0));
        assert_eq!(form.keuangan.omset, None);
    }

    #[test]
    fn test_unknown_enum_values_become_empty() {
        let raw = json!({
            "status": "Bangkrut",
            "rapat_koordinasi": {"rapat_pengurus": "satu_bulan", "rapat_pengawas": "setiap_hari"}
        });
        let form = normalize_organisasi(Some(&raw));

        assert_eq!(form.status, None);
        assert_eq!(form.rapat_koordinasi.rapat_pengurus, Some(FrekuensiRapat::SatuBulan));
        assert_eq!(form.rapat_koordinasi.rapat_pengawas, None);
    }

    #[test]
    fn test_absent_record_normalizes_to_unanswered() {
        assert_eq!(normalize_bisnis(None), PerformaBisnis::default());
        assert_eq!(normalize_organisasi(None), PerformaOrganisasi::default());
        assert_eq!(normalize_bisnis(Some(&Value::Null)), PerformaBisnis::default());
        assert_eq!(normalize_organisasi(Some(&json!("x"))), PerformaOrganisasi::default());
    }

    #[test]
    fn test_snake_case_wins_over_camel_case_sibling() {
        let raw = json!({
            "neraca_aktiva": {"kas": 100},
            "neracaAktiva": {"kas": 999, "piutang": 5},
            "proyeksi_arus_kas": false,
            "proyeksiArusKas": true
        });
        let form = normalize_bisnis(Some(&raw));

        assert_eq!(form.neraca_aktiva.kas, Some(100.0));
        assert_eq!(form.neraca_aktiva.piutang, None);
        assert_eq!(form.proyeksi_arus_kas, Some(false));
    }

    #[test]
    fn test_partial_block_defaults_missing_fields() {
        let raw = json!({"neraca_aktiva": {"kas": 100}});
        let form = normalize_bisnis(Some(&raw));

        assert_eq!(form.neraca_aktiva.kas, Some(100.0));
        assert_eq!(form.neraca_aktiva.piutang, None);
        assert_eq!(form.neraca_aktiva.total_aktiva, None);
        assert_eq!(form.neraca_passiva, NeracaPassiva::default());
        assert!(form.unit_usaha.is_empty());
    }
}
