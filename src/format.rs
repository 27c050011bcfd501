use crate::config::{CASES_GRID_SMALL_STEP, CASES_GRID_THRESHOLD, DEATHS_GRID_STEP};
use crate::types::ChartSeries;

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed variant of [`thousands`].
pub fn thousands_signed(n: i64) -> String {
    if n < 0 {
        format!("-{}", thousands(n.unsigned_abs()))
    } else {
        thousands(n as u64)
    }
}

/// One decimal place, e.g. `"2.1 %"`.
pub fn percent_1dp(v: f64) -> String {
    format!("{v:.1} %")
}

/// Epoch milliseconds → `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_epoch_millis(ms: i64) -> String {
    let secs = ms.div_euclid(1000);
    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);
    let (y, m, d) = civil_from_days(days);
    format!(
        "{y:04}-{m:02}-{d:02} {:02}:{:02}:{:02} UTC",
        rem / 3600,
        (rem / 60) % 60,
        rem % 60
    )
}

/// Epoch milliseconds → `HH:MM:SS` (UTC).
pub fn format_time_millis(ms: i64) -> String {
    let rem = ms.div_euclid(1000).rem_euclid(86_400);
    format!("{:02}:{:02}:{:02}", rem / 3600, (rem / 60) % 60, rem % 60)
}

/// Days since 1970-01-01 → (year, month, day), proleptic Gregorian.
fn civil_from_days(z: i64) -> (i64, i64, i64) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

/// Y-axis grid step for a historical chart.
///
/// Cases scale with the newest value: `round(newest / 10000) * 1000` once it
/// passes the threshold, never below the small step. Deaths use a fixed step.
pub fn chart_step_size(series: ChartSeries, newest: Option<u64>) -> u64 {
    match series {
        ChartSeries::Deaths => DEATHS_GRID_STEP,
        ChartSeries::Cases => match newest {
            Some(v) if v > CASES_GRID_THRESHOLD => {
                let step = ((v as f64 / 10_000.0).round() as u64) * 1000;
                step.max(CASES_GRID_SMALL_STEP)
            }
            _ => CASES_GRID_SMALL_STEP,
        },
    }
}

/// Truncate to `max` characters, adding an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(12_345_678_901), "12,345,678,901");
        assert_eq!(thousands_signed(-1_500), "-1,500");
        assert_eq!(thousands_signed(42), "42");
    }

    #[test]
    fn epoch_formatting() {
        assert_eq!(format_epoch_millis(0), "1970-01-01 00:00:00 UTC");
        // 2020-03-11 12:34:56 UTC
        assert_eq!(format_epoch_millis(1_583_930_096_000), "2020-03-11 12:34:56 UTC");
        // leap day
        assert_eq!(format_epoch_millis(1_582_934_400_000), "2020-02-29 00:00:00 UTC");
        assert_eq!(format_time_millis(1_583_930_096_789), "12:34:56");
    }

    #[test]
    fn cases_step_scales_with_newest_value() {
        assert_eq!(chart_step_size(ChartSeries::Cases, None), 100);
        assert_eq!(chart_step_size(ChartSeries::Cases, Some(900)), 100);
        assert_eq!(chart_step_size(ChartSeries::Cases, Some(1_000)), 100);
        assert_eq!(chart_step_size(ChartSeries::Cases, Some(250_000)), 25_000);
        assert_eq!(chart_step_size(ChartSeries::Cases, Some(14_999)), 1_000);
        assert_eq!(chart_step_size(ChartSeries::Cases, Some(15_000)), 2_000);
    }

    #[test]
    fn step_never_rounds_to_zero() {
        // 1001..4999 / 10000 rounds to 0
        assert_eq!(chart_step_size(ChartSeries::Cases, Some(4_000)), 100);
    }

    #[test]
    fn deaths_step_is_fixed() {
        assert_eq!(chart_step_size(ChartSeries::Deaths, Some(1)), 2_500);
        assert_eq!(chart_step_size(ChartSeries::Deaths, Some(10_000_000)), 2_500);
    }

    #[test]
    fn truncate_is_char_aware() {
        assert_eq!(truncate("Vietnam", 10), "Vietnam");
        assert_eq!(truncate("British Virgin Islands", 8), "British…");
        assert_eq!(truncate("Côte d'Ivoire", 4), "Côt…");
    }
}
