use crate::api::Remote;
use crate::api::models::{Contact, ContactDraft};
use crate::error::{ContactError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// In-memory stand-in for the remote collection.
///
/// Assigns ids `c1`, `c2`, ... on create and keeps newest first, like the
/// real service. `set_fail_status` makes every following call fail as if the
/// server had answered with that status.
pub struct MemRemote {
    contacts: Mutex<Vec<Contact>>,
    next_id: AtomicU64,
    fail_status: Mutex<Option<u16>>,
    calls: AtomicUsize,
}

impl Default for MemRemote {
    fn default() -> Self {
        Self::with_contacts(Vec::new())
    }
}

impl MemRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: Mutex::new(contacts),
            next_id: AtomicU64::new(1),
            fail_status: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_status(&self, status: Option<u16>) {
        *self.fail_status.lock().expect("fail_status lock") = status;
    }

    /// Current server-side contents.
    pub fn stored(&self) -> Vec<Contact> {
        self.contacts.lock().expect("contacts lock").clone()
    }

    /// Number of calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.fail_status.lock().expect("fail_status lock") {
            Some(status) => Err(ContactError::Network(format!("HTTP {}", status))),
            None => Ok(()),
        }
    }

    fn materialize(id: String, draft: &ContactDraft) -> Contact {
        Contact {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            message: draft.message.clone(),
            category: draft.category.clone(),
            created_at: Some(Utc::now()),
        }
    }
}

#[async_trait]
impl Remote for MemRemote {
    async fn list(&self) -> Result<Vec<Contact>> {
        self.enter()?;
        Ok(self.stored())
    }

    async fn create(&self, draft: &ContactDraft) -> Result<Contact> {
        self.enter()?;
        let id = format!("c{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let contact = Self::materialize(id, draft);
        self.contacts.lock().expect("contacts lock").insert(0, contact.clone());
        Ok(contact)
    }

    async fn update(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
        self.enter()?;
        let mut contacts = self.contacts.lock().expect("contacts lock");
        let slot = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))?;
        let created_at = slot.created_at;
        *slot = Contact { created_at, ..Self::materialize(id.to_string(), draft) };
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.enter()?;
        let mut contacts = self.contacts.lock().expect("contacts lock");
        let pos = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ContactError::NotFound(id.to_string()))?;
        contacts.remove(pos);
        Ok(())
    }
}

/// A stored contact with fixed fields, for seeding fakes.
pub fn contact(id: &str, name: &str, category: &str) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: "5551234567".to_string(),
        message: String::new(),
        category: category.to_string(),
        created_at: None,
    }
}
