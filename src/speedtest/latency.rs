use tokio::time::Instant;

use super::ProbeTransport;
use crate::error::ProbeError;

/// Times a HEAD request against `url` and returns the round trip in whole
/// milliseconds.
pub async fn measure_latency<T>(transport: &T, url: &str) -> Result<u64, ProbeError>
where
    T: ProbeTransport + ?Sized,
{
    let start = Instant::now();
    transport.head(url).await?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok(elapsed_ms.round() as u64)
}
