//! Human-readable rendering of breakdowns in rupees with Indian digit grouping.

use std::fmt::Write;

use crate::estimation::breakdown::CostBreakdown;

/// Group digits the Indian way: the last three, then pairs (`39,36,029`).
pub fn group_indian(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}

/// Format an amount as rupees, e.g. `₹ 39,36,029`.
pub fn format_inr(amount: u64) -> String {
    format!("₹ {}", group_indian(amount))
}

/// Render a breakdown as an aligned two-column table.
pub fn render_breakdown(breakdown: &CostBreakdown) -> String {
    let rows = [
        ("Material", breakdown.material_cost),
        ("Labor", breakdown.labor_cost),
        ("Electrical", breakdown.electrical_cost),
        ("Plumbing", breakdown.plumbing_cost),
        ("False ceiling", breakdown.false_ceiling_cost),
        ("Supervision", breakdown.supervision_cost),
        ("Transport", breakdown.transport),
        ("Subtotal", breakdown.subtotal),
        ("Contingency", breakdown.contingency),
        ("GST", breakdown.tax),
        ("Total", breakdown.total),
    ];

    let amounts: Vec<String> = rows.iter().map(|(_, v)| format_inr(*v)).collect();
    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let amount_width = amounts.iter().map(|a| a.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for ((label, _), amount) in rows.iter().zip(&amounts) {
        if *label == "Subtotal" || *label == "Total" {
            let _ = writeln!(out, "  {}", "-".repeat(label_width + amount_width + 2));
        }
        let _ = writeln!(
            out,
            "  {:<lw$}  {:>aw$}",
            label,
            amount,
            lw = label_width,
            aw = amount_width
        );
    }
    out
}
