//! Performa data model
//!
//! - [`bisnis`]: business sub-form (projections, partners, units, finances)
//! - [`organisasi`]: organization sub-form (governance, membership, principles)
//! - [`performa`]: the per-period parent record and period summaries

pub mod bisnis;
pub mod organisasi;
pub mod performa;

pub use bisnis::{
    HubunganLembaga, Keuangan, MasalahKeuangan, NeracaAktiva, NeracaPassiva, PerformaBisnis,
    UnitUsaha, LEMBAGA_OPTIONS, UNIT_OPTIONS,
};
pub use organisasi::{
    FrekuensiRapat, Pelatihan, PerformaOrganisasi, PrinsipKoperasi, RapatKoordinasi,
    RencanaStrategis, StatusKoperasi, PELATIHAN_OPTIONS,
};
pub use performa::{Indicators, PerformaRecord, PeriodSummary};

/// Closed set of string values stored in a form field
///
/// The backend stores "not chosen" as an empty string, so these enums travel
/// as `Option<T>` with `None` on the wire as `""`.
pub trait WireEnum: Sized + Copy + 'static {
    /// Every variant, in display order
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_wire(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.iter().copied().find(|v| v.as_str() == raw)
    }
}

/// Serde adapter: `Option<WireEnum>` <-> string, with `None` as `""`
pub(crate) mod empty_as_none {
    use super::WireEnum;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: WireEnum, S: Serializer>(
        value: &Option<T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_ref().map(T::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, T: WireEnum, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<T>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(T::from_wire))
    }
}
