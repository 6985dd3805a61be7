//! Client-side core of a contact book backed by a remote contacts collection.
//!
//! - [`api`]: the wire model, the [`api::Remote`] seam and its HTTP client.
//! - [`validation`]: field rules applied before any write is sent.
//! - [`store`]: the [`store::ContactStore`] owning the local list.
//! - [`view`] and [`export`]: filtered, sorted and CSV projections of it.

pub mod api;
pub mod app;
pub mod error;
pub mod export;
pub mod store;
pub mod utils;
pub mod validation;
pub mod view;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use api::client::ApiClient;
pub use api::models::{Category, Contact, ContactDraft};
pub use error::{ContactError, Result};
pub use store::ContactStore;
