//! Itemized cost breakdown and its wire form.

use serde::{Deserialize, Serialize};

/// Itemized result of one calculation. All amounts are whole currency units.
///
/// On the wire the extras are nested under `extras`; see [`CalculateResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "CalculateResponse", from = "CalculateResponse")]
pub struct CostBreakdown {
    pub material_cost: u64,
    pub labor_cost: u64,
    pub electrical_cost: u64,
    pub plumbing_cost: u64,
    pub false_ceiling_cost: u64,
    pub supervision_cost: u64,
    pub transport: u64,
    pub contingency: u64,
    pub tax: u64,
    pub subtotal: u64,
    pub total: u64,
}

/// Electrical, plumbing and false-ceiling costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrasBreakdown {
    pub electrical_cost: u64,
    pub plumbing_cost: u64,
    pub false_ceiling_cost: u64,
}

/// Response body of the calculation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub material_cost: u64,
    pub labor_cost: u64,
    pub extras: ExtrasBreakdown,
    pub supervision_cost: u64,
    pub transport: u64,
    pub contingency: u64,
    pub tax: u64,
    pub subtotal: u64,
    pub total: u64,
}

impl From<CostBreakdown> for CalculateResponse {
    fn from(b: CostBreakdown) -> Self {
        Self {
            material_cost: b.material_cost,
            labor_cost: b.labor_cost,
            extras: ExtrasBreakdown {
                electrical_cost: b.electrical_cost,
                plumbing_cost: b.plumbing_cost,
                false_ceiling_cost: b.false_ceiling_cost,
            },
            supervision_cost: b.supervision_cost,
            transport: b.transport,
            contingency: b.contingency,
            tax: b.tax,
            subtotal: b.subtotal,
            total: b.total,
        }
    }
}

impl From<CalculateResponse> for CostBreakdown {
    fn from(r: CalculateResponse) -> Self {
        Self {
            material_cost: r.material_cost,
            labor_cost: r.labor_cost,
            electrical_cost: r.extras.electrical_cost,
            plumbing_cost: r.extras.plumbing_cost,
            false_ceiling_cost: r.extras.false_ceiling_cost,
            supervision_cost: r.supervision_cost,
            transport: r.transport,
            contingency: r.contingency,
            tax: r.tax,
            subtotal: r.subtotal,
            total: r.total,
        }
    }
}

fn sum(parts: &[u64]) -> Option<u64> {
    parts.iter().try_fold(0u64, |acc, p| acc.checked_add(*p))
}

impl CostBreakdown {
    /// `electrical_cost + plumbing_cost + false_ceiling_cost`.
    pub fn extras(&self) -> u64 {
        self.electrical_cost + self.plumbing_cost + self.false_ceiling_cost
    }

    /// Check the additivity invariants. Used to reject breakdowns received
    /// from outside the process.
    pub fn verify(&self) -> Result<(), String> {
        let extras = sum(&[
            self.electrical_cost,
            self.plumbing_cost,
            self.false_ceiling_cost,
        ])
        .ok_or("extras overflow")?;

        let subtotal = sum(&[
            self.material_cost,
            self.labor_cost,
            extras,
            self.supervision_cost,
            self.transport,
        ])
        .ok_or("subtotal overflow")?;
        if subtotal != self.subtotal {
            return Err(format!(
                "subtotal {} does not equal the sum of its parts {}",
                self.subtotal, subtotal
            ));
        }

        let total = sum(&[self.subtotal, self.contingency, self.tax]).ok_or("total overflow")?;
        if total != self.total {
            return Err(format!(
                "total {} does not equal subtotal + contingency + tax {}",
                self.total, total
            ));
        }

        Ok(())
    }
}
