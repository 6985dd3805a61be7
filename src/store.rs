//! The contact store: the one owner of the local copy of the remote
//! collection.
//!
//! Every mutation goes to the [`Remote`] first and is reconciled into the local
//! list only from that call's own response. A failed call leaves the list as it
//! was. Operations are not serialized against each other: when two are in
//! flight, whichever response resolves last is applied last. Each operation is
//! tagged with an [`OpId`] so observers can tell interleaved outcomes apart.

use crate::api::Remote;
use crate::api::events::{OpId, OpKind, StoreEvent};
use crate::api::models::{Contact, ContactDraft};
use crate::error::{ContactError, Result};
use crate::view;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

pub struct ContactStore<R: Remote> {
    remote: R,
    contacts: watch::Sender<Vec<Contact>>,
    last_error: watch::Sender<Option<String>>,
    events: broadcast::Sender<StoreEvent>,
    in_flight: AtomicUsize,
    next_op: AtomicU64,
}

/// Keeps the in-flight count accurate even if the operation's future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<R: Remote> ContactStore<R> {
    /// An empty store; call [`refresh`](Self::refresh) to populate it.
    pub fn new(remote: R) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            remote,
            contacts: watch::Sender::new(Vec::new()),
            last_error: watch::Sender::new(None),
            events,
            in_flight: AtomicUsize::new(0),
            next_op: AtomicU64::new(0),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Observer handle on the list: the current snapshot plus change notification.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Contact>> {
        self.contacts.subscribe()
    }

    /// Outcome events for every operation issued after this call.
    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Vec<Contact> {
        self.contacts.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.contacts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.borrow().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Contact> {
        self.contacts.borrow().iter().find(|c| c.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message of the last failed refresh, cleared when a new refresh starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Contacts matching `query` and `category`, in list order.
    pub fn view(&self, query: &str, category: &str) -> Vec<Contact> {
        view::filter(&self.contacts.borrow(), query, category)
    }

    pub fn categories(&self) -> BTreeSet<String> {
        view::categories(&self.contacts.borrow())
    }

    /// Replaces the local list with the remote one. On failure the previous
    /// list stays and the error is kept in [`last_error`](Self::last_error).
    pub async fn refresh(&self) -> Result<()> {
        let (op, _guard) = self.begin(OpKind::Refresh);
        self.last_error.send_replace(None);
        match self.remote.list().await {
            Ok(list) => {
                log::debug!("{}: refreshed {} contact(s)", op, list.len());
                self.contacts.send_replace(list);
                self.succeed(op, OpKind::Refresh, None);
                Ok(())
            }
            Err(err) => {
                self.last_error.send_replace(Some(err.to_string()));
                Err(self.fail(op, OpKind::Refresh, err))
            }
        }
    }

    /// Creates a contact remotely and puts the confirmed copy at the front of
    /// the list. The draft is expected to have passed validation already.
    pub async fn add(&self, draft: &ContactDraft) -> Result<Contact> {
        let (op, _guard) = self.begin(OpKind::Add);
        match self.remote.create(draft).await {
            Ok(created) => {
                self.contacts.send_modify(|list| {
                    match list.iter_mut().find(|c| c.id == created.id) {
                        // A refresh that resolved first may already carry it.
                        Some(slot) => *slot = created.clone(),
                        None => list.insert(0, created.clone()),
                    }
                });
                log::debug!("{}: added {}", op, created.id);
                self.succeed(op, OpKind::Add, Some(created.id.clone()));
                Ok(created)
            }
            Err(err) => Err(self.fail(op, OpKind::Add, err)),
        }
    }

    /// Updates a contact remotely and swaps the confirmed copy in at the same
    /// position. An id that has meanwhile left the local list is not re-added.
    pub async fn modify(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
        let (op, _guard) = self.begin(OpKind::Modify);
        match self.remote.update(id, draft).await {
            Ok(updated) => {
                let replaced = self.contacts.send_if_modified(|list| {
                    match list.iter_mut().find(|c| c.id == id) {
                        Some(slot) => {
                            *slot = updated.clone();
                            true
                        }
                        None => false,
                    }
                });
                if !replaced {
                    log::debug!("{}: {} no longer listed locally", op, id);
                }
                self.succeed(op, OpKind::Modify, Some(id.to_string()));
                Ok(updated)
            }
            Err(err) => Err(self.fail(op, OpKind::Modify, err)),
        }
    }

    /// Deletes a contact remotely, then drops it from the list.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let (op, _guard) = self.begin(OpKind::Remove);
        match self.remote.delete(id).await {
            Ok(()) => {
                self.contacts.send_if_modified(|list| {
                    let before = list.len();
                    list.retain(|c| c.id != id);
                    list.len() != before
                });
                log::debug!("{}: removed {}", op, id);
                self.succeed(op, OpKind::Remove, Some(id.to_string()));
                Ok(())
            }
            Err(err) => Err(self.fail(op, OpKind::Remove, err)),
        }
    }

    fn begin(&self, kind: OpKind) -> (OpId, InFlight<'_>) {
        let op = OpId(self.next_op.fetch_add(1, Ordering::SeqCst) + 1);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.emit(StoreEvent::Started { op, kind });
        (op, InFlight(&self.in_flight))
    }

    fn succeed(&self, op: OpId, kind: OpKind, id: Option<String>) {
        self.emit(StoreEvent::Succeeded { op, kind, id });
    }

    fn fail(&self, op: OpId, kind: OpKind, err: ContactError) -> ContactError {
        log::warn!("{}: {:?} failed: {}", op, kind, err);
        self.emit(StoreEvent::Failed {
            op,
            kind,
            error: err.to_string(),
            not_found: err.is_not_found(),
        });
        err
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemRemote, contact};
    use tokio::sync::broadcast::error::TryRecvError;

    fn draft(name: &str) -> ContactDraft {
        ContactDraft::new(name, format!("{}@x.com", name.to_lowercase()), "5551234567")
    }

    fn ids(list: &[Contact]) -> Vec<String> {
        list.iter().map(|c| c.id.clone()).collect()
    }

    fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) => out.push(ev),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        out
    }

    #[tokio::test]
    async fn refresh_takes_server_order() {
        let a = contact("a", "Alice", "work");
        let b = contact("b", "Bob", "personal");
        let store = ContactStore::new(MemRemote::with_contacts(vec![a.clone(), b.clone()]));
        assert!(store.is_empty());

        store.refresh().await.unwrap();

        assert_eq!(store.snapshot(), vec![a, b.clone()]);
        assert_eq!(store.view("", "personal"), vec![b]);
        assert!(!store.is_loading());
        assert_eq!(store.last_error(), None);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let store = ContactStore::new(MemRemote::with_contacts(vec![contact("a", "Alice", "")]));
        store.refresh().await.unwrap();

        store.remote().set_fail_status(Some(503));
        let err = store.refresh().await.unwrap_err();

        assert!(matches!(err, ContactError::Network(_)));
        assert_eq!(ids(&store.snapshot()), vec!["a"]);
        assert_eq!(store.last_error().as_deref(), Some("Network error: HTTP 503"));

        store.remote().set_fail_status(None);
        store.refresh().await.unwrap();
        assert_eq!(store.last_error(), None);
    }

    #[tokio::test]
    async fn add_prepends_confirmed_contact() {
        let store = ContactStore::new(MemRemote::with_contacts(vec![contact("a", "Alice", "")]));
        store.refresh().await.unwrap();

        let d = ContactDraft::new("Jo", "jo@x.com", "5551234567");
        let created = store.add(&d).await.unwrap();

        assert_eq!(created.id, "c1");
        assert!(created.created_at.is_some());
        assert_eq!(ids(&store.snapshot()), vec!["c1", "a"]);
        let listed = &store.view("", "")[0];
        assert_eq!(listed.to_draft(), d);
    }

    #[tokio::test]
    async fn failed_add_leaves_list_and_reports_failure() {
        let store = ContactStore::new(MemRemote::with_contacts(vec![contact("a", "Alice", "")]));
        store.refresh().await.unwrap();
        let before = store.snapshot();
        let mut events = store.events();

        store.remote().set_fail_status(Some(500));
        let err = store.add(&draft("Jo")).await.unwrap_err();

        assert!(matches!(err, ContactError::Network(_)));
        assert_eq!(store.snapshot(), before);
        let events = drain(&mut events);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StoreEvent::Started { kind: OpKind::Add, .. }));
        let note = events[1].notification().unwrap();
        assert_eq!(note.title, "Error");
        assert!(note.destructive);
    }

    #[tokio::test]
    async fn modify_replaces_in_place() {
        let store = ContactStore::new(MemRemote::new());
        store.add(&draft("Jo")).await.unwrap();
        store.add(&draft("Kim")).await.unwrap();
        assert_eq!(ids(&store.snapshot()), vec!["c2", "c1"]);

        let mut edit = store.get("c1").unwrap().to_draft();
        edit.name = "Jo2".into();
        let updated = store.modify("c1", &edit).await.unwrap();

        assert_eq!(updated.name, "Jo2");
        let list = store.snapshot();
        assert_eq!(ids(&list), vec!["c2", "c1"]);
        assert_eq!(list[1].name, "Jo2");
    }

    #[tokio::test]
    async fn modify_unknown_id_is_not_found_and_changes_nothing() {
        let store = ContactStore::new(MemRemote::with_contacts(vec![contact("a", "Alice", "")]));
        store.refresh().await.unwrap();

        let err = store.modify("zzz", &draft("Ghost")).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(ids(&store.snapshot()), vec!["a"]);
    }

    #[tokio::test]
    async fn second_remove_is_not_found_and_harmless() {
        let store = ContactStore::new(MemRemote::with_contacts(vec![
            contact("a", "Alice", ""),
            contact("b", "Bob", ""),
        ]));
        store.refresh().await.unwrap();
        let mut events = store.events();

        store.remove("a").await.unwrap();
        assert_eq!(ids(&store.snapshot()), vec!["b"]);

        let err = store.remove("a").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ids(&store.snapshot()), vec!["b"]);

        let events = drain(&mut events);
        assert!(matches!(&events[1], StoreEvent::Succeeded { kind: OpKind::Remove, id: Some(id), .. } if id == "a"));
        assert!(matches!(events[3], StoreEvent::Failed { not_found: true, .. }));
        assert_eq!(events[1].notification().unwrap().title, "Deleted");
    }

    #[tokio::test]
    async fn op_ids_increase_per_operation() {
        let store = ContactStore::new(MemRemote::new());
        let mut events = store.events();
        store.refresh().await.unwrap();
        store.add(&draft("Jo")).await.unwrap();

        let ops: Vec<u64> = drain(&mut events).iter().map(|e| e.op().0).collect();
        assert_eq!(ops, vec![1, 1, 2, 2]);
    }

    /// Delays each `update` by the time configured for the draft's name, so
    /// responses can resolve in a different order than they were issued.
    struct SlowRemote {
        inner: MemRemote,
        delays: Vec<(&'static str, u64)>,
    }

    #[async_trait::async_trait]
    impl Remote for SlowRemote {
        async fn list(&self) -> Result<Vec<Contact>> {
            self.inner.list().await
        }

        async fn create(&self, draft: &ContactDraft) -> Result<Contact> {
            self.inner.create(draft).await
        }

        async fn update(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
            let delay = self
                .delays
                .iter()
                .find(|(name, _)| *name == draft.name)
                .map(|(_, ms)| *ms)
                .unwrap_or(0);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            self.inner.update(id, draft).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn concurrent_modifications_on_different_ids_both_apply() {
        let store = ContactStore::new(MemRemote::new());
        store.add(&draft("Jo")).await.unwrap();
        store.add(&draft("Kim")).await.unwrap();

        let jo2 = draft("Jo2");
        let kim2 = draft("Kim2");
        let (r1, r2) = tokio::join!(store.modify("c1", &jo2), store.modify("c2", &kim2));
        r1.unwrap();
        r2.unwrap();

        let names: Vec<String> = store.snapshot().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Kim2", "Jo2"]);
    }

    #[tokio::test]
    async fn last_resolved_modification_wins() {
        let store = ContactStore::new(MemRemote::new());
        store.add(&draft("Jo")).await.unwrap();

        let first = draft("First");
        let second = draft("Second");
        let (r1, r2) = tokio::join!(store.modify("c1", &first), store.modify("c1", &second));
        r1.unwrap();
        r2.unwrap();

        assert_eq!(store.get("c1").unwrap().name, "Second");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn slower_response_is_applied_last_even_if_issued_first() {
        let store = ContactStore::new(SlowRemote {
            inner: MemRemote::new(),
            delays: vec![("First", 50), ("Second", 5)],
        });
        store.add(&draft("Jo")).await.unwrap();
        let mut events = store.events();

        let first = draft("First");
        let second = draft("Second");
        let (r1, r2) = tokio::join!(store.modify("c1", &first), store.modify("c1", &second));
        r1.unwrap();
        r2.unwrap();

        assert_eq!(store.get("c1").unwrap().name, "First");
        assert_eq!(store.len(), 1);
        assert!(!store.is_loading());

        let finished: Vec<OpId> = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, StoreEvent::Succeeded { .. }))
            .map(|e| e.op())
            .collect();
        // The second-issued operation resolves first.
        assert_eq!(finished.len(), 2);
        assert!(finished[0] > finished[1]);
    }

    #[tokio::test]
    async fn loading_while_a_call_is_in_flight() {
        let store = ContactStore::new(SlowRemote {
            inner: MemRemote::new(),
            delays: vec![("Slow", 30)],
        });
        store.add(&draft("Jo")).await.unwrap();

        let slow = draft("Slow");
        let loading_midway = async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            store.is_loading()
        };
        let (result, loading) = tokio::join!(store.modify("c1", &slow), loading_midway);
        result.unwrap();

        assert!(loading);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn observers_see_updated_snapshots() {
        let store = ContactStore::new(MemRemote::new());
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        store.add(&draft("Jo")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(ids(&rx.borrow_and_update()), vec!["c1"]);
    }

    #[tokio::test]
    async fn categories_follow_the_list() {
        let store = ContactStore::new(MemRemote::with_contacts(vec![
            contact("a", "Alice", "work"),
            contact("b", "Bob", "work"),
            contact("c", "Cy", ""),
        ]));
        store.refresh().await.unwrap();
        assert_eq!(store.categories().into_iter().collect::<Vec<_>>(), vec!["work"]);

        store.remove("a").await.unwrap();
        store.remove("b").await.unwrap();
        assert!(store.categories().is_empty());
    }
}
