//! Retry for SQLite calls that fail because another process holds the file.
//!
//! Overlapping `newsrelay run` invocations (cron plus a manual run, say) can
//! briefly lock the cursor database. Those errors are retried; anything else
//! is returned at once.

use std::future::Future;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 4;

const BASE_DELAY_MS: u64 = 100;

/// Primary result codes worth another attempt: BUSY (5), LOCKED (6), IOERR (10).
/// Extended codes carry the primary code in their low byte.
pub fn is_transient_error(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    db_err
        .code()
        .and_then(|code| code.parse::<u32>().ok())
        .map(|code| matches!(code & 0xff, 5 | 6 | 10))
        .unwrap_or(false)
}

fn delay_for(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt.min(6))
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts
pub async fn with_retry<F, Fut, T>(what: &str, operation: F) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Err(e) if attempt + 1 < MAX_ATTEMPTS && is_transient_error(&e) => {
                let delay = delay_for(attempt);
                tracing::debug!(
                    error = %e,
                    operation = what,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Transient database error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
