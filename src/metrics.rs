use crate::types::{DerivedPercentages, GlobalSummary};

/// Pie-chart percentages for a worldwide summary.
///
/// Deaths and recovered are rounded independently; active takes the remainder
/// so the three always sum to 100. Active is left unclamped and goes negative
/// when the two rounded shares add up to more than 100.
pub fn derive(summary: &GlobalSummary) -> DerivedPercentages {
    if summary.cases == 0 {
        return DerivedPercentages::default();
    }

    let deaths_pct = rounded_pct(summary.deaths, summary.cases);
    let recovered_pct = rounded_pct(summary.recovered, summary.cases);
    let active_pct = 100 - deaths_pct - recovered_pct;

    DerivedPercentages {
        active_pct,
        recovered_pct,
        deaths_pct,
    }
}

/// Active (still sick) count. Signed so that `deaths + recovered > cases`
/// yields a negative number instead of an underflow.
pub fn active_count(summary: &GlobalSummary) -> i64 {
    summary.cases as i64 - summary.recovered as i64 - summary.deaths as i64
}

/// `part / whole * 100`, or 0 when there is no whole. Scaled before the
/// division so exact halves stay exact.
pub fn ratio_pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

fn rounded_pct(part: u64, whole: u64) -> i64 {
    // f64::round rounds half away from zero, same as Math.round for non-negative input
    ratio_pct(part, whole).round() as i64
}
