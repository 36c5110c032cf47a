use std::time::Duration;

/// Upper bound of the bar chart: the peak sample rounded up to a multiple of 10
pub fn compute_chart_max(history: &[u32]) -> u64 {
    let peak = history.iter().copied().max().unwrap_or(0) as u64;
    peak.div_ceil(10).max(1) * 10
}

/// One label per sample: the second at which it was measured
pub fn bar_labels(sample_times: &[Duration]) -> Vec<String> {
    sample_times
        .iter()
        .map(|t| format_label(t.as_secs_f64().round() as u64))
        .collect()
}

pub fn format_label(secs: u64) -> String {
    format!("{secs}s")
}

/// Share of the paragraph typed so far, in 0.0..=1.0
pub fn progress_ratio(typed: usize, target: usize) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (typed as f64 / target as f64).clamp(0.0, 1.0)
}
