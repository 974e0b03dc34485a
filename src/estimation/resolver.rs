//! Effective rate resolution.
//!
//! Each field is resolved on its own: request override, then the active rate
//! table, then the fallback table. A table missing one tier key only sends
//! that key to the fallback.

use rust_decimal::Decimal;

use crate::estimation::rates::RateTable;
use crate::estimation::request::ProjectRequest;

/// Rates actually used by the calculator for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveRates {
    /// Material rate for the requested quality, per sqft.
    pub material: Decimal,
    /// Labor rate per sqft.
    pub labor: Decimal,
    /// Electrical rate for the requested tier, per sqft.
    pub electrical: Decimal,
    /// Plumbing rate for the requested tier, per sqft.
    pub plumbing: Decimal,
    /// False-ceiling rate per sqft of ceiling.
    pub false_ceiling: Decimal,
    /// Flat transport amount.
    pub transport: Decimal,
    pub supervision_percent: Decimal,
    pub contingency_percent: Decimal,
    pub gst_percent: Decimal,
}

fn pick(
    override_value: Option<Decimal>,
    table: Option<Decimal>,
    fallback: Option<Decimal>,
) -> Decimal {
    override_value
        .or(table)
        .or(fallback)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

/// Resolve effective rates for `request`.
///
/// `fallback` is expected to be complete (normally [`FALLBACK_RATES`]); a
/// field missing from all three sources resolves to zero.
///
/// [`FALLBACK_RATES`]: crate::estimation::FALLBACK_RATES
pub fn resolve_rates(
    request: &ProjectRequest,
    table: &RateTable,
    fallback: &RateTable,
) -> EffectiveRates {
    let overrides = &request.overrides;

    EffectiveRates {
        material: pick(
            None,
            table.material(request.material_quality),
            fallback.material(request.material_quality),
        ),
        labor: pick(
            overrides.labor_rate,
            table.labor_per_sqft,
            fallback.labor_per_sqft,
        ),
        electrical: pick(
            None,
            table.electrical(request.electrical),
            fallback.electrical(request.electrical),
        ),
        plumbing: pick(
            None,
            table.plumbing(request.plumbing),
            fallback.plumbing(request.plumbing),
        ),
        false_ceiling: pick(
            None,
            table.false_ceiling_per_sqft,
            fallback.false_ceiling_per_sqft,
        ),
        transport: pick(
            overrides.transport,
            table.transport_per_km,
            fallback.transport_per_km,
        ),
        supervision_percent: pick(
            overrides.supervision_percent,
            table.supervision_percent,
            fallback.supervision_percent,
        ),
        contingency_percent: pick(
            overrides.contingency_percent,
            table.contingency_percent,
            fallback.contingency_percent,
        ),
        gst_percent: pick(
            overrides.gst_percent,
            table.gst_percent,
            fallback.gst_percent,
        ),
    }
}
