pub mod client;
pub mod events;
pub mod models;

use crate::error::Result;
use async_trait::async_trait;
use models::{Contact, ContactDraft};

/// CRUD access to the remote contacts collection.
///
/// Every call is a single request/response with no retry. Failures come back as
/// `ContactError::Network`, or `ContactError::NotFound` when an `update` or
/// `delete` targets an id the remote does not know.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn list(&self) -> Result<Vec<Contact>>;
    async fn create(&self, draft: &ContactDraft) -> Result<Contact>;
    async fn update(&self, id: &str, draft: &ContactDraft) -> Result<Contact>;
    async fn delete(&self, id: &str) -> Result<()>;
}
