//! Timeout enforcement.
//!
//! Every configured deadline in the server goes through [`with_timeout`],
//! so an expired deadline always surfaces as [`HandlerError::Timeout`].

use std::future::Future;
use std::time::Duration;

use crate::error::HandlerError;

/// Run `fut` under an optional deadline. `None` waits indefinitely.
pub async fn with_timeout<F, T>(limit: Option<Duration>, fut: F) -> Result<T, HandlerError>
where
    F: Future<Output = Result<T, HandlerError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| HandlerError::Timeout(limit))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expiry_maps_to_timeout_error() {
        let limit = Duration::from_millis(10);
        let res = with_timeout(Some(limit), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, HandlerError>(())
        })
        .await;

        assert!(matches!(res, Err(HandlerError::Timeout(d)) if d == limit));
    }

    #[tokio::test]
    async fn none_passes_result_through() {
        let res = with_timeout(None, async { Ok::<_, HandlerError>(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }
}
