use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A contact as persisted by the remote collection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contact {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// The editable fields of this contact, as used to prefill an edit.
    pub fn to_draft(&self) -> ContactDraft {
        ContactDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            message: self.message.clone(),
            category: self.category.clone(),
        }
    }

    pub fn category_label(&self) -> Option<&'static str> {
        Category::from_value(&self.category).map(Category::label)
    }
}

/// Unvalidated payload submitted for create and update calls.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub category: String,
}

impl ContactDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category.value().to_string();
        self
    }

    /// Trims the free-text fields the way a form submission does. Category is a
    /// closed-set value and passes through untouched.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            message: self.message.trim().to_string(),
            category: self.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Uncategorized,
    Work,
    Personal,
    Family,
    Friends,
    Business,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Uncategorized,
        Category::Work,
        Category::Personal,
        Category::Family,
        Category::Friends,
        Category::Business,
        Category::Other,
    ];

    /// Wire value. The uncategorized tag is the empty string.
    pub fn value(self) -> &'static str {
        match self {
            Category::Uncategorized => "",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Family => "family",
            Category::Friends => "friends",
            Category::Business => "business",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Uncategorized => "No Category",
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Family => "Family",
            Category::Friends => "Friends",
            Category::Business => "Business",
            Category::Other => "Other",
        }
    }

    pub fn from_value(value: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.value() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "none" {
            return Ok(Category::Uncategorized);
        }
        Category::from_value(&wanted).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL[1..].iter().map(|c| c.value()).collect();
            format!("unknown category '{}' (expected one of: none, {})", s, known.join(", "))
        })
    }
}
