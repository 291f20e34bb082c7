use std::{future::Future, time::Duration};

use futures_util::future::try_join_all;
use thiserror::Error;
use tokio::{
    task::{JoinError, JoinHandle},
    time::Instant,
};

#[derive(Error, Debug)]
pub enum DispatchError<E> {
    #[error("{0}")]
    Failed(E),
    #[error("dispatched request did not complete: {0}")]
    Aborted(JoinError),
}

/// Fixed interval pacing: at most one `wait` returns per interval.
pub struct RateControl {
    interval: Duration,
    last_timestamp: Option<Instant>,
}

impl RateControl {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_timestamp: None,
        }
    }

    pub async fn wait(&mut self) {
        // the first caller goes through right away
        if let Some(last) = self.last_timestamp {
            log::debug!("rate control: waiting {}ms!", self.interval.as_millis());
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last_timestamp = Some(Instant::now());
    }

    /// Spawns `request(id)` for every id, one per interval.
    ///
    /// Returns as soon as the last request has been issued, the handles are still pending.
    pub async fn dispatch<I, F, Fut>(&mut self, ids: I, mut request: F) -> Vec<JoinHandle<Fut::Output>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let mut handles = Vec::new();
        for id in ids {
            self.wait().await;
            log::debug!("dispatching request #{}", handles.len() + 1);
            handles.push(tokio::spawn(request(id)));
        }
        handles
    }
}

/// Waits for every dispatched request, failing as soon as one of them fails.
///
/// Results keep the dispatch order.
pub async fn join<T, E>(handles: Vec<JoinHandle<Result<T, E>>>) -> Result<Vec<T>, DispatchError<E>> {
    try_join_all(handles.into_iter().map(|handle| async move {
        match handle.await {
            Ok(result) => result.map_err(DispatchError::Failed),
            Err(err) => Err(DispatchError::Aborted(err)),
        }
    }))
    .await
}
