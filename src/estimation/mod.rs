//! Construction cost estimation.
//!
//! A request is normalized, its rates are resolved against a rate table
//! (falling back field-by-field to the built-in table), and the fixed
//! calculation pipeline produces an itemized [`CostBreakdown`].
//! Everything here is pure: no I/O, no shared state.

mod breakdown;
mod calculator;
mod format;
mod rates;
mod request;
mod resolver;

pub use breakdown::{CalculateResponse, CostBreakdown, ExtrasBreakdown};
pub use calculator::{calculate, estimate};
pub use format::{format_inr, group_indian, render_breakdown};
pub use rates::{
    ElectricalRates, FALLBACK_RATES, MaterialRates, PlumbingRates, RateSnapshot, RateSource,
    RateTable,
};
pub use request::{
    AreaUnit, CalculateRequest, ElectricalTier, MaterialQuality, PlumbingTier, ProjectRequest,
    RateOverrides, SQFT_PER_SQM,
};
pub use resolver::{EffectiveRates, resolve_rates};
