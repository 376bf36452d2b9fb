//! Sequential, chunked delivery of bulk rejections.

use std::collections::HashSet;
use std::future::Future;

use tracing::warn;

use super::api::ApiError;
use super::optimistic::Speculation;
use super::store::{Entity, Store};

/// Ids per remote request.
pub const BULK_CHUNK_SIZE: usize = 10;

/// What came back from a chunked run.
pub(crate) struct ChunkReport<T: Entity> {
    pub(crate) confirmed: HashSet<T::Id>,
    pub(crate) rows: Vec<T>,
    pub(crate) requests: usize,
    pub(crate) failure: Option<ApiError>,
}

/// Send `ids` in chunks of [`BULK_CHUNK_SIZE`], each awaited before the next is issued. The
/// first failing chunk stops the run; later chunks are never sent.
pub(crate) async fn send_in_chunks<T, F, Fut>(ids: &[T::Id], mut send: F) -> ChunkReport<T>
where
    T: Entity,
    F: FnMut(Vec<T::Id>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    let mut report = ChunkReport {
        confirmed: HashSet::with_capacity(ids.len()),
        rows: Vec::with_capacity(ids.len()),
        requests: 0,
        failure: None,
    };

    for chunk in ids.chunks(BULK_CHUNK_SIZE) {
        report.requests += 1;
        match send(chunk.to_vec()).await {
            Ok(rows) => {
                report.confirmed.extend(chunk.iter().cloned());
                report.rows.extend(rows);
            }
            Err(err) => {
                warn!(
                    chunk = report.requests,
                    size = chunk.len(),
                    error = %err,
                    "bulk chunk failed"
                );
                report.failure = Some(err);
                break;
            }
        }
    }

    report
}

impl<T: Entity> ChunkReport<T> {
    /// Keep confirmed rows (with the server's values) and roll everything else back.
    /// Returns how many ids the server confirmed, or that count plus the failure.
    pub(crate) fn settle(
        self,
        speculation: Speculation<T>,
        store: &Store<T>,
    ) -> Result<usize, (usize, ApiError)> {
        let confirmed = self.confirmed.len();
        match self.failure {
            None => {
                speculation.commit();
                store.merge(self.rows);
                Ok(confirmed)
            }
            Some(err) => {
                let (kept, unconfirmed) =
                    speculation.partition(|id| self.confirmed.contains(id));
                kept.commit();
                unconfirmed.revert(store);
                store.merge(self.rows);
                Err((confirmed, err))
            }
        }
    }
}
