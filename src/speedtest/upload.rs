//! Upload figure reported alongside the download rate.
//!
//! No upload is performed. The value is a fixed fraction of the measured
//! download rate and must always be presented as simulated.

/// Ratio of the simulated upload rate to the measured download rate.
pub const SIMULATED_UPLOAD_RATIO: f64 = 0.7;

/// Simulated upload rate in Mbps. Not a measurement.
pub fn simulated_upload_mbps(download_mbps: f64) -> f64 {
    download_mbps * SIMULATED_UPLOAD_RATIO
}
