//! Read-only projections over the contact list: text/category filtering, the
//! set of categories in use, and display sorting. None of these mutate or
//! cache; callers recompute them on every change.

use crate::api::models::Contact;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Text predicate: empty query matches everything; otherwise the lowercased
/// query must occur in the lowercased name or email, or in the phone as stored.
pub fn matches_query(contact: &Contact, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    contact.name.to_lowercase().contains(&query)
        || contact.email.to_lowercase().contains(&query)
        || contact.phone.contains(&query)
}

pub fn matches_category(contact: &Contact, category: &str) -> bool {
    category.is_empty() || contact.category == category
}

/// Contacts passing both predicates, in list order.
pub fn filter(contacts: &[Contact], query: &str, category: &str) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|c| matches_query(c, query) && matches_category(c, category))
        .cloned()
        .collect()
}

/// Distinct non-empty categories present in `contacts`.
pub fn categories(contacts: &[Contact]) -> BTreeSet<String> {
    contacts
        .iter()
        .filter(|c| !c.category.is_empty())
        .map(|c| c.category.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Email,
    Category,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self { field: SortField::CreatedAt, order: SortOrder::Desc }
    }
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Column-header behaviour: the active field flips direction, a new field
    /// starts ascending.
    pub fn toggle(self, field: SortField) -> Self {
        if self.field == field {
            let order = match self.order {
                SortOrder::Asc => SortOrder::Desc,
                SortOrder::Desc => SortOrder::Asc,
            };
            Self { field, order }
        } else {
            Self { field, order: SortOrder::Asc }
        }
    }

    fn compare(&self, a: &Contact, b: &Contact) -> Ordering {
        let ord = match self.field {
            SortField::Name => compare_text(&a.name, &b.name),
            SortField::Email => compare_text(&a.email, &b.email),
            SortField::Category => compare_text(&a.category, &b.category),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// A sorted copy for display. Ties keep list order.
pub fn sorted(contacts: &[Contact], sort: Sort) -> Vec<Contact> {
    let mut out = contacts.to_vec();
    out.sort_by(|a, b| sort.compare(a, b));
    out
}
