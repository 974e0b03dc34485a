//! Project requests: the lenient wire form and the normalized, fully typed form.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EstimateError;

/// Square feet per square metre.
pub const SQFT_PER_SQM: Decimal = dec!(10.7639);

/// Unit the request's `area` is expressed in. Square feet is the base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    #[default]
    Sqft,
    Sqm,
}

impl AreaUnit {
    /// Convert an area in this unit to square feet.
    pub fn to_sqft(self, area: Decimal) -> Decimal {
        match self {
            AreaUnit::Sqft => area,
            AreaUnit::Sqm => area * SQFT_PER_SQM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialQuality {
    Economy,
    Standard,
    Premium,
}

impl MaterialQuality {
    pub const ALL: [MaterialQuality; 3] = [
        MaterialQuality::Economy,
        MaterialQuality::Standard,
        MaterialQuality::Premium,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectricalTier {
    Basic,
    Standard,
    Smart,
}

impl ElectricalTier {
    pub const ALL: [ElectricalTier; 3] = [
        ElectricalTier::Basic,
        ElectricalTier::Standard,
        ElectricalTier::Smart,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlumbingTier {
    Standard,
    Premium,
}

impl PlumbingTier {
    pub const ALL: [PlumbingTier; 2] = [PlumbingTier::Standard, PlumbingTier::Premium];
}

// Parse through serde so the accepted spellings match the wire format exactly.
macro_rules! impl_from_str {
    ($ty:ty, $label:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
                    .map_err(|_| format!("invalid {} '{}'", $label, s))
            }
        }
    };
}

impl_from_str!(AreaUnit, "area unit");
impl_from_str!(MaterialQuality, "material quality");
impl_from_str!(ElectricalTier, "electrical tier");
impl_from_str!(PlumbingTier, "plumbing tier");

/// Request body submitted for calculation.
///
/// Numeric fields accept numbers, numeric strings, blank strings and null;
/// blank and null mean "absent". A numeric `0` is a real value. Unrecognized
/// enum values are rejected during deserialization. Numbers are serialized as
/// decimal strings so a submitted request prices exactly as it does locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub area: Option<Decimal>,
    #[serde(default)]
    pub unit: AreaUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_quality: Option<MaterialQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrical: Option<ElectricalTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plumbing: Option<PlumbingTier>,
    #[serde(default)]
    pub false_ceiling: bool,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub false_ceiling_area: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub labor_rate: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub supervision_percent: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport_charges: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub contingency_percent: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::str_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub gst_percent: Option<Decimal>,
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_decimal(s.trim())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid number '{}'", s))),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("number out of range: {}", n))),
        Some(other) => Err(D::Error::custom(format!(
            "expected a number, found {}",
            other
        ))),
    }
}

/// Explicit per-field overrides. `None` means "use the rate table".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateOverrides {
    pub labor_rate: Option<Decimal>,
    pub supervision_percent: Option<Decimal>,
    pub transport: Option<Decimal>,
    pub contingency_percent: Option<Decimal>,
    pub gst_percent: Option<Decimal>,
}

/// A validated request, immutable once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRequest {
    /// Built-up area in `unit`. Always positive after normalization.
    pub area: Decimal,
    pub unit: AreaUnit,
    pub material_quality: MaterialQuality,
    pub electrical: ElectricalTier,
    pub plumbing: PlumbingTier,
    pub false_ceiling: bool,
    /// False-ceiling area in square feet, independent of `area`.
    pub false_ceiling_area: Decimal,
    pub overrides: RateOverrides,
}

impl ProjectRequest {
    /// Area converted to square feet.
    pub fn area_sqft(&self) -> Decimal {
        self.unit.to_sqft(self.area)
    }

    /// The wire form of this request, as submitted to the authoritative service.
    pub fn to_wire(&self) -> CalculateRequest {
        CalculateRequest {
            area: Some(self.area),
            unit: self.unit,
            material_quality: Some(self.material_quality),
            electrical: Some(self.electrical),
            plumbing: Some(self.plumbing),
            false_ceiling: self.false_ceiling,
            false_ceiling_area: Some(self.false_ceiling_area),
            labor_rate: self.overrides.labor_rate,
            supervision_percent: self.overrides.supervision_percent,
            transport_charges: self.overrides.transport,
            contingency_percent: self.overrides.contingency_percent,
            gst_percent: self.overrides.gst_percent,
        }
    }
}

fn non_negative(value: Option<Decimal>) -> Option<Decimal> {
    value.map(|v| v.max(Decimal::ZERO))
}

impl CalculateRequest {
    /// Validate and normalize into a [`ProjectRequest`].
    ///
    /// Negative overrides and false-ceiling areas coerce to zero.
    pub fn normalize(&self) -> Result<ProjectRequest, EstimateError> {
        let area = self
            .area
            .ok_or_else(|| EstimateError::invalid("area is required"))?;
        if area <= Decimal::ZERO {
            return Err(EstimateError::invalid(format!(
                "area must be greater than zero, got {}",
                area
            )));
        }

        let material_quality = self
            .material_quality
            .ok_or_else(|| EstimateError::invalid("materialQuality is required"))?;
        let electrical = self
            .electrical
            .ok_or_else(|| EstimateError::invalid("electrical tier is required"))?;
        let plumbing = self
            .plumbing
            .ok_or_else(|| EstimateError::invalid("plumbing tier is required"))?;

        Ok(ProjectRequest {
            area,
            unit: self.unit,
            material_quality,
            electrical,
            plumbing,
            false_ceiling: self.false_ceiling,
            false_ceiling_area: non_negative(self.false_ceiling_area).unwrap_or(Decimal::ZERO),
            overrides: RateOverrides {
                labor_rate: non_negative(self.labor_rate),
                supervision_percent: non_negative(self.supervision_percent),
                transport: non_negative(self.transport_charges),
                contingency_percent: non_negative(self.contingency_percent),
                gst_percent: non_negative(self.gst_percent),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CalculateRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_blank_and_null_overrides_are_absent() {
        let req = parse(
            r#"{ "area": 1200, "unit": "sqft", "materialQuality": "standard",
                 "electrical": "basic", "plumbing": "premium",
                 "laborRate": "", "supervisionPercent": null, "gstPercent": "  " }"#,
        );

        assert_eq!(req.labor_rate, None);
        assert_eq!(req.supervision_percent, None);
        assert_eq!(req.gst_percent, None);
        assert_eq!(req.transport_charges, None);
    }

    #[test]
    fn test_zero_override_is_a_value() {
        let req = parse(r#"{ "area": 10, "transportCharges": 0, "laborRate": "0" }"#);
        assert_eq!(req.transport_charges, Some(Decimal::ZERO));
        assert_eq!(req.labor_rate, Some(Decimal::ZERO));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let req = parse(r#"{ "area": "139.35", "unit": "sqm" }"#);
        assert_eq!(req.area, Some(dec!(139.35)));
        assert_eq!(req.unit, AreaUnit::Sqm);
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        let err = serde_json::from_str::<CalculateRequest>(r#"{ "area": 10, "electrical": "nuclear" }"#);
        assert!(err.is_err());

        let err = serde_json::from_str::<CalculateRequest>(r#"{ "area": 10, "unit": "acre" }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_non_numeric_area_rejected() {
        assert!(serde_json::from_str::<CalculateRequest>(r#"{ "area": "big" }"#).is_err());
        assert!(serde_json::from_str::<CalculateRequest>(r#"{ "area": true }"#).is_err());
    }

    #[test]
    fn test_normalize_rejects_bad_area() {
        let mut req = CalculateRequest {
            material_quality: Some(MaterialQuality::Standard),
            electrical: Some(ElectricalTier::Standard),
            plumbing: Some(PlumbingTier::Standard),
            ..Default::default()
        };
        assert!(matches!(req.normalize(), Err(EstimateError::InvalidRequest { .. })));

        req.area = Some(Decimal::ZERO);
        assert!(matches!(req.normalize(), Err(EstimateError::InvalidRequest { .. })));

        req.area = Some(dec!(-5));
        assert!(matches!(req.normalize(), Err(EstimateError::InvalidRequest { .. })));

        req.area = Some(dec!(5));
        assert!(req.normalize().is_ok());
    }

    #[test]
    fn test_normalize_requires_tiers() {
        let req = CalculateRequest {
            area: Some(dec!(100)),
            material_quality: Some(MaterialQuality::Premium),
            electrical: Some(ElectricalTier::Smart),
            ..Default::default()
        };
        let err = req.normalize().unwrap_err();
        assert_eq!(err, EstimateError::invalid("plumbing tier is required"));
    }

    #[test]
    fn test_normalize_clamps_negatives() {
        let req = CalculateRequest {
            area: Some(dec!(100)),
            material_quality: Some(MaterialQuality::Economy),
            electrical: Some(ElectricalTier::Basic),
            plumbing: Some(PlumbingTier::Standard),
            false_ceiling: true,
            false_ceiling_area: Some(dec!(-20)),
            labor_rate: Some(dec!(-1)),
            ..Default::default()
        };
        let project = req.normalize().unwrap();
        assert_eq!(project.false_ceiling_area, Decimal::ZERO);
        assert_eq!(project.overrides.labor_rate, Some(Decimal::ZERO));
        assert_eq!(project.overrides.gst_percent, None);
    }

    #[test]
    fn test_wire_form_round_trips_through_normalize() {
        let req = parse(
            r#"{ "area": 850, "unit": "sqft", "materialQuality": "premium",
                 "electrical": "smart", "plumbing": "premium",
                 "falseCeiling": true, "falseCeilingArea": 200, "contingencyPercent": 0 }"#,
        );
        let project = req.normalize().unwrap();
        let wire = serde_json::to_string(&project.to_wire()).unwrap();
        let again: CalculateRequest = serde_json::from_str(&wire).unwrap();
        assert_eq!(again.normalize().unwrap(), project);
    }

    #[test]
    fn test_wire_form_keeps_decimals_exact() {
        use crate::estimation::{FALLBACK_RATES, estimate};

        // Just under a rounding midpoint: 1500 * area is 37.4999..., not 37.5.
        let project = CalculateRequest {
            area: Some(dec!(0.0249999999999999999)),
            material_quality: Some(MaterialQuality::Standard),
            electrical: Some(ElectricalTier::Standard),
            plumbing: Some(PlumbingTier::Standard),
            labor_rate: Some(dec!(300.0000000000000001)),
            ..Default::default()
        }
        .normalize()
        .unwrap();

        let wire = serde_json::to_string(&project.to_wire()).unwrap();
        assert!(wire.contains(r#""area":"0.0249999999999999999""#));

        let again = serde_json::from_str::<CalculateRequest>(&wire)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(again, project);

        let local = estimate(&project, &FALLBACK_RATES).unwrap();
        assert_eq!(local.material_cost, 37);
        assert_eq!(estimate(&again, &FALLBACK_RATES).unwrap(), local);
    }

    #[test]
    fn test_from_str_matches_wire_spelling() {
        assert_eq!("SQM".parse::<AreaUnit>().unwrap(), AreaUnit::Sqm);
        assert_eq!("smart".parse::<ElectricalTier>().unwrap(), ElectricalTier::Smart);
        assert!("deluxe".parse::<MaterialQuality>().is_err());
    }
}
