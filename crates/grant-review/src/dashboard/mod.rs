//! Client side of the review workflow: a shared store of fetched rows, bulk selection, paging
//! and the optimistic mutation layer that talks to the review API.

pub mod api;
pub mod bulk;
pub mod http;
pub mod inflight;
pub mod notify;
pub mod optimistic;
pub mod pagination;
pub mod selection;
pub mod session;
pub mod store;
pub mod submissions;

#[cfg(test)]
mod tests;

pub use api::{ApiError, InProcessReviewApi, ReviewApi};
pub use bulk::BULK_CHUNK_SIZE;
pub use http::HttpReviewApi;
pub use inflight::ReviewAction;
pub use notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use optimistic::Speculation;
pub use pagination::{PageWindow, DEFAULT_PAGE_LENGTH, SEARCH_PAGE_LENGTH};
pub use selection::{ReviewFocus, Reviewable, SelectionSet, MAX_SELECTION};
pub use session::{ReviewSession, SessionError};
pub use store::{Entity, Store};
pub use submissions::SubmissionBoard;
