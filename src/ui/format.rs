/// Shown for values that have not been measured.
pub const PLACEHOLDER: &str = "-";

/// Rates below 1 Mbps are shown in Kbps; both with two decimals.
pub fn format_rate(mbps: Option<f64>) -> String {
    match mbps {
        None => PLACEHOLDER.to_string(),
        Some(rate) if rate < 1.0 => format!("{:.2} Kbps", rate * 1000.0),
        Some(rate) => format!("{:.2} Mbps", rate),
    }
}

pub fn format_latency(ms: Option<u64>) -> String {
    match ms {
        Some(ms) if ms > 0 => format!("{} ms", ms),
        _ => PLACEHOLDER.to_string(),
    }
}
