//! Rate tables: the authoritative (possibly partial) table and the built-in fallback.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::estimation::request::{ElectricalTier, MaterialQuality, PlumbingTier};

/// Per-square-foot material rates keyed by quality tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRates {
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub economy: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub standard: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub premium: Option<Decimal>,
}

/// Per-square-foot electrical rates keyed by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricalRates {
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub basic: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub standard: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub smart: Option<Decimal>,
}

/// Per-square-foot plumbing rates keyed by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlumbingRates {
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub standard: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub premium: Option<Decimal>,
}

/// Immutable snapshot of unit economics.
///
/// An authoritative table may leave any field (or any single tier key) out;
/// [`FALLBACK_RATES`] always has every field populated, so resolution against
/// it cannot fail.
///
/// `transport_per_km` is a flat amount despite its name. It is never
/// multiplied by a distance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    #[serde(default, alias = "materialPerUnitArea")]
    pub material_per_sqft: MaterialRates,
    #[serde(
        default,
        alias = "laborPerUnitArea",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub labor_per_sqft: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub supervision_percent: Option<Decimal>,
    #[serde(default, alias = "electricalPerUnitArea")]
    pub electrical: ElectricalRates,
    #[serde(default, alias = "plumbingPerUnitArea")]
    pub plumbing: PlumbingRates,
    #[serde(
        default,
        alias = "falseCeilingPerUnitArea",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub false_ceiling_per_sqft: Option<Decimal>,
    #[serde(
        default,
        alias = "transportDefault",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport_per_km: Option<Decimal>,
    #[serde(
        default,
        alias = "taxPercent",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub gst_percent: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub contingency_percent: Option<Decimal>,
}

/// Built-in table used whenever the authoritative one is unavailable or
/// lacks a field.
pub const FALLBACK_RATES: RateTable = RateTable {
    material_per_sqft: MaterialRates {
        economy: Some(dec!(900)),
        standard: Some(dec!(1500)),
        premium: Some(dec!(2200)),
    },
    labor_per_sqft: Some(dec!(300)),
    supervision_percent: Some(dec!(6)),
    electrical: ElectricalRates {
        basic: Some(dec!(50)),
        standard: Some(dec!(100)),
        smart: Some(dec!(200)),
    },
    plumbing: PlumbingRates {
        standard: Some(dec!(60)),
        premium: Some(dec!(120)),
    },
    false_ceiling_per_sqft: Some(dec!(60)),
    transport_per_km: Some(dec!(1000)),
    gst_percent: Some(dec!(18)),
    contingency_percent: Some(dec!(7)),
};

impl RateTable {
    /// Material rate for a quality tier, if this table defines it.
    pub fn material(&self, quality: MaterialQuality) -> Option<Decimal> {
        match quality {
            MaterialQuality::Economy => self.material_per_sqft.economy,
            MaterialQuality::Standard => self.material_per_sqft.standard,
            MaterialQuality::Premium => self.material_per_sqft.premium,
        }
    }

    /// Electrical rate for a tier, if this table defines it.
    pub fn electrical(&self, tier: ElectricalTier) -> Option<Decimal> {
        match tier {
            ElectricalTier::Basic => self.electrical.basic,
            ElectricalTier::Standard => self.electrical.standard,
            ElectricalTier::Smart => self.electrical.smart,
        }
    }

    /// Plumbing rate for a tier, if this table defines it.
    pub fn plumbing(&self, tier: PlumbingTier) -> Option<Decimal> {
        match tier {
            PlumbingTier::Standard => self.plumbing.standard,
            PlumbingTier::Premium => self.plumbing.premium,
        }
    }

    /// Returns true if every field and every tier key is present.
    pub fn is_complete(&self) -> bool {
        let tiers_complete = MaterialQuality::ALL.iter().all(|q| self.material(*q).is_some())
            && ElectricalTier::ALL.iter().all(|t| self.electrical(*t).is_some())
            && PlumbingTier::ALL.iter().all(|t| self.plumbing(*t).is_some());

        tiers_complete
            && self.labor_per_sqft.is_some()
            && self.supervision_percent.is_some()
            && self.false_ceiling_per_sqft.is_some()
            && self.transport_per_km.is_some()
            && self.gst_percent.is_some()
            && self.contingency_percent.is_some()
    }

    /// Load a (possibly partial) table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::RatesFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&raw).map_err(|e| ConfigError::RatesFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Where the rates in a [`RateSnapshot`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSource {
    Authoritative,
    /// The authoritative table could not be fetched; the built-in table is in use.
    Fallback { reason: String },
}

/// The rate table in effect for a session, with its provenance.
///
/// The source is informational only. It never changes calculation semantics
/// beyond supplying different numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub source: RateSource,
}

impl RateSnapshot {
    pub fn authoritative(table: RateTable) -> Self {
        Self {
            table,
            source: RateSource::Authoritative,
        }
    }

    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            table: FALLBACK_RATES,
            source: RateSource::Fallback {
                reason: reason.into(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, RateSource::Fallback { .. })
    }
}
