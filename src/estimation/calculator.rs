//! The cost pipeline shared by the authoritative service and the local fallback.
//!
//! Every product is rounded to a whole currency unit as soon as it is
//! computed; later steps work on the rounded amounts. Supervision is charged
//! on material + labor + extras (no transport), contingency on the full
//! subtotal, and tax on subtotal + contingency.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::EstimateError;
use crate::estimation::breakdown::CostBreakdown;
use crate::estimation::rates::{FALLBACK_RATES, RateTable};
use crate::estimation::request::ProjectRequest;
use crate::estimation::resolver::{EffectiveRates, resolve_rates};

fn out_of_range() -> EstimateError {
    EstimateError::invalid("amounts exceed the supported range")
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn priced(rate: Decimal, quantity: Decimal) -> Result<Decimal, EstimateError> {
    rate.checked_mul(quantity)
        .map(round_whole)
        .ok_or_else(out_of_range)
}

fn percent_of(base: Decimal, percent: Decimal) -> Result<Decimal, EstimateError> {
    base.checked_mul(percent)
        .and_then(|v| v.checked_div(dec!(100)))
        .map(round_whole)
        .ok_or_else(out_of_range)
}

fn sum(parts: &[Decimal]) -> Result<Decimal, EstimateError> {
    parts
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or_else(out_of_range)
}

fn whole(amount: Decimal) -> Result<u64, EstimateError> {
    amount.to_u64().ok_or_else(out_of_range)
}

/// Run the pipeline for an already-resolved set of rates.
///
/// Fails with [`EstimateError::InvalidRequest`] when the area is not
/// positive, or when an amount overflows.
pub fn calculate(
    request: &ProjectRequest,
    rates: &EffectiveRates,
) -> Result<CostBreakdown, EstimateError> {
    if request.area <= Decimal::ZERO {
        return Err(EstimateError::invalid(format!(
            "area must be greater than zero, got {}",
            request.area
        )));
    }

    let area = request
        .area
        .checked_mul(request.unit.to_sqft(Decimal::ONE))
        .ok_or_else(out_of_range)?;

    let material_cost = priced(rates.material, area)?;
    let labor_cost = priced(rates.labor, area)?;
    let electrical_cost = priced(rates.electrical, area)?;
    let plumbing_cost = priced(rates.plumbing, area)?;
    let false_ceiling_cost = if request.false_ceiling {
        priced(rates.false_ceiling, request.false_ceiling_area)?
    } else {
        Decimal::ZERO
    };
    let extras = sum(&[electrical_cost, plumbing_cost, false_ceiling_cost])?;

    let supervision_base = sum(&[material_cost, labor_cost, extras])?;
    let supervision_cost = percent_of(supervision_base, rates.supervision_percent)?;
    let transport = round_whole(rates.transport);

    let subtotal = sum(&[
        material_cost,
        labor_cost,
        extras,
        supervision_cost,
        transport,
    ])?;
    let contingency = percent_of(subtotal, rates.contingency_percent)?;
    let tax = percent_of(sum(&[subtotal, contingency])?, rates.gst_percent)?;
    let total = sum(&[subtotal, contingency, tax])?;

    Ok(CostBreakdown {
        material_cost: whole(material_cost)?,
        labor_cost: whole(labor_cost)?,
        electrical_cost: whole(electrical_cost)?,
        plumbing_cost: whole(plumbing_cost)?,
        false_ceiling_cost: whole(false_ceiling_cost)?,
        supervision_cost: whole(supervision_cost)?,
        transport: whole(transport)?,
        contingency: whole(contingency)?,
        tax: whole(tax)?,
        subtotal: whole(subtotal)?,
        total: whole(total)?,
    })
}

/// Resolve rates against `table` (backed by [`FALLBACK_RATES`]) and calculate.
///
/// This is the single entry point both execution sites use.
pub fn estimate(
    request: &ProjectRequest,
    table: &RateTable,
) -> Result<CostBreakdown, EstimateError> {
    let rates = resolve_rates(request, table, &FALLBACK_RATES);
    calculate(request, &rates)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::estimation::request::{
        AreaUnit, ElectricalTier, MaterialQuality, PlumbingTier, RateOverrides, SQFT_PER_SQM,
    };

    fn standard_request(area: Decimal, unit: AreaUnit) -> ProjectRequest {
        ProjectRequest {
            area,
            unit,
            material_quality: MaterialQuality::Standard,
            electrical: ElectricalTier::Standard,
            plumbing: PlumbingTier::Standard,
            false_ceiling: false,
            false_ceiling_area: Decimal::ZERO,
            overrides: RateOverrides::default(),
        }
    }

    fn reference_breakdown() -> CostBreakdown {
        CostBreakdown {
            material_cost: 2_250_000,
            labor_cost: 450_000,
            electrical_cost: 150_000,
            plumbing_cost: 90_000,
            false_ceiling_cost: 0,
            supervision_cost: 176_400,
            transport: 1_000,
            contingency: 218_218,
            tax: 600_411,
            subtotal: 3_117_400,
            total: 3_936_029,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let breakdown = estimate(
            &standard_request(dec!(1500), AreaUnit::Sqft),
            &FALLBACK_RATES,
        )
        .unwrap();

        assert_eq!(breakdown, reference_breakdown());
        assert_eq!(breakdown.extras(), 240_000);
        assert!(breakdown.verify().is_ok());
    }

    #[test]
    fn test_square_metres_convert_to_the_same_breakdown() {
        let area = dec!(1500) / SQFT_PER_SQM;
        let breakdown = estimate(&standard_request(area, AreaUnit::Sqm), &FALLBACK_RATES).unwrap();

        assert_eq!(breakdown, reference_breakdown());
    }

    #[test]
    fn test_false_ceiling_uses_its_own_area() {
        let mut req = standard_request(dec!(1000), AreaUnit::Sqm);
        req.false_ceiling_area = dec!(250);

        let off = estimate(&req, &FALLBACK_RATES).unwrap();
        assert_eq!(off.false_ceiling_cost, 0);

        req.false_ceiling = true;
        let on = estimate(&req, &FALLBACK_RATES).unwrap();
        assert_eq!(on.false_ceiling_cost, 15_000);
        assert_eq!(on.material_cost, off.material_cost);
        assert!(on.total > off.total);
        assert!(on.verify().is_ok());
    }

    #[test]
    fn test_supervision_excludes_transport() {
        let mut req = standard_request(dec!(100), AreaUnit::Sqft);
        req.overrides.transport = Some(dec!(1000000));

        let breakdown = estimate(&req, &FALLBACK_RATES).unwrap();
        // (150000 + 30000 + 10000 + 6000) * 6%
        assert_eq!(breakdown.supervision_cost, 11_760);
        assert_eq!(breakdown.transport, 1_000_000);
    }

    #[test]
    fn test_zero_overrides_zero_the_charges() {
        let mut req = standard_request(dec!(1500), AreaUnit::Sqft);
        req.overrides = RateOverrides {
            labor_rate: Some(Decimal::ZERO),
            supervision_percent: Some(Decimal::ZERO),
            transport: Some(Decimal::ZERO),
            contingency_percent: Some(Decimal::ZERO),
            gst_percent: Some(Decimal::ZERO),
        };

        let breakdown = estimate(&req, &FALLBACK_RATES).unwrap();
        assert_eq!(breakdown.labor_cost, 0);
        assert_eq!(breakdown.supervision_cost, 0);
        assert_eq!(breakdown.transport, 0);
        assert_eq!(breakdown.contingency, 0);
        assert_eq!(breakdown.tax, 0);
        assert_eq!(breakdown.total, 2_250_000 + 240_000);
    }

    #[test]
    fn test_rounding_happens_per_step() {
        // 0.5 sqft at 1/sqft for each line: every product rounds up to 1
        // before it is summed.
        let table = RateTable {
            material_per_sqft: crate::estimation::rates::MaterialRates {
                standard: Some(dec!(1)),
                ..Default::default()
            },
            labor_per_sqft: Some(dec!(1)),
            electrical: crate::estimation::rates::ElectricalRates {
                standard: Some(dec!(1)),
                ..Default::default()
            },
            plumbing: crate::estimation::rates::PlumbingRates {
                standard: Some(dec!(1)),
                ..Default::default()
            },
            supervision_percent: Some(Decimal::ZERO),
            transport_per_km: Some(Decimal::ZERO),
            contingency_percent: Some(Decimal::ZERO),
            gst_percent: Some(Decimal::ZERO),
            ..Default::default()
        };

        let breakdown = estimate(&standard_request(dec!(0.5), AreaUnit::Sqft), &table).unwrap();
        assert_eq!(breakdown.material_cost, 1);
        assert_eq!(breakdown.labor_cost, 1);
        assert_eq!(breakdown.electrical_cost, 1);
        assert_eq!(breakdown.plumbing_cost, 1);
        assert_eq!(breakdown.total, 4);
    }

    #[test]
    fn test_rejects_non_positive_area() {
        for area in [Decimal::ZERO, dec!(-1), dec!(-1500)] {
            let result = estimate(&standard_request(area, AreaUnit::Sqft), &FALLBACK_RATES);
            assert!(matches!(result, Err(EstimateError::InvalidRequest { .. })));
        }
    }

    #[test]
    fn test_overflow_is_an_error_not_a_panic() {
        let result = estimate(&standard_request(Decimal::MAX, AreaUnit::Sqm), &FALLBACK_RATES);
        assert!(matches!(result, Err(EstimateError::InvalidRequest { .. })));
    }

    #[test]
    fn test_monotonic_in_area() {
        let mut previous: Option<CostBreakdown> = None;
        for step in 1..=60u32 {
            let area = Decimal::from(step * 37);
            let current = estimate(&standard_request(area, AreaUnit::Sqft), &FALLBACK_RATES).unwrap();
            assert!(current.verify().is_ok());

            if let Some(prev) = previous {
                assert!(current.material_cost > prev.material_cost);
                assert!(current.labor_cost > prev.labor_cost);
                assert!(current.electrical_cost > prev.electrical_cost);
                assert!(current.plumbing_cost > prev.plumbing_cost);
                assert!(current.total >= prev.total);
            }
            previous = Some(current);
        }
    }

    #[test]
    fn test_tax_includes_contingency() {
        let breakdown = estimate(
            &standard_request(dec!(1500), AreaUnit::Sqft),
            &FALLBACK_RATES,
        )
        .unwrap();
        let without_contingency = (breakdown.subtotal as f64 * 0.18).round() as u64;
        assert!(breakdown.tax > without_contingency);
    }
}
