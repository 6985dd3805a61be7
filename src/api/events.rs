use std::fmt;

/// Identifier handed out to each store operation, increasing in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Refresh,
    Add,
    Modify,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Started {
        op: OpId,
        kind: OpKind,
    },
    Succeeded {
        op: OpId,
        kind: OpKind,
        /// Contact the operation touched; `None` for a refresh.
        id: Option<String>,
    },
    Failed {
        op: OpId,
        kind: OpKind,
        error: String,
        not_found: bool,
    },
}

/// User feedback for a finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: &'static str,
    pub description: String,
    pub destructive: bool,
}

impl StoreEvent {
    pub fn op(&self) -> OpId {
        match self {
            StoreEvent::Started { op, .. }
            | StoreEvent::Succeeded { op, .. }
            | StoreEvent::Failed { op, .. } => *op,
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            StoreEvent::Started { kind, .. }
            | StoreEvent::Succeeded { kind, .. }
            | StoreEvent::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StoreEvent::Failed { .. })
    }

    /// Notification to surface for this event. Starts and successful refreshes
    /// are silent.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            StoreEvent::Started { .. } => None,
            StoreEvent::Succeeded { kind, .. } => {
                let (title, description) = match kind {
                    OpKind::Refresh => return None,
                    OpKind::Add => ("Success", "Contact added successfully!"),
                    OpKind::Modify => ("Updated", "Contact updated successfully!"),
                    OpKind::Remove => ("Deleted", "Contact removed successfully."),
                };
                Some(Notification {
                    title,
                    description: description.to_string(),
                    destructive: false,
                })
            }
            StoreEvent::Failed { error, .. } => Some(Notification {
                title: "Error",
                description: error.clone(),
                destructive: true,
            }),
        }
    }
}
