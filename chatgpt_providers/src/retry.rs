use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry an async operation following a fixed delay schedule.
///
/// # Arguments
/// * `operation` - The async operation to retry
/// * `delays` - Wait before each retry; `delays.len() + 1` attempts at most
/// * `should_retry` - Errors it rejects are returned immediately
///
/// # Returns
/// The first success, or the error of the last attempt made
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    delays: &[Duration],
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let total = delays.len() + 1;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let Some(delay) = delays.get(attempt - 1) else {
                    return Err(e);
                };
                if !should_retry(&e) {
                    return Err(e);
                }
                warn!(
                    "Request failed (attempt {attempt}/{total}): {e}. Retrying after {}s...",
                    delay.as_secs_f32()
                );
                sleep(*delay).await;
            }
        }
    }
}
