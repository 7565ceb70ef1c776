//! Two-way reconciliation between provider events and local records.
//!
//! Planning is pure: it only compares two snapshots. Remote-driven
//! operations (create/update local) come first in the plan, followed by the
//! local-driven ones (re-create remote, then link), and the local-driven
//! check always looks at the original remote snapshot.

use crate::components::event_store::CalendarEvent;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One step of a synchronization plan
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOperation {
    /// Store a provider event locally, linked by its external id
    CreateLocal(CalendarEvent),
    /// Overwrite a local record with the provider's content
    UpdateLocal {
        internal_id: String,
        remote: CalendarEvent,
    },
    /// Re-create on the provider an event the provider no longer has
    CreateRemote(CalendarEvent),
    /// Point a local record at the event created by the preceding `CreateRemote`
    LinkLocal { internal_id: String },
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::CreateLocal(remote) => write!(f, "create local copy of {}", remote.label()),
            SyncOperation::UpdateLocal { internal_id, remote } => {
                write!(f, "update {} from {}", internal_id, remote.label())
            }
            SyncOperation::CreateRemote(local) => write!(f, "re-create {} remotely", local.label()),
            SyncOperation::LinkLocal { internal_id } => write!(f, "link {}", internal_id),
        }
    }
}

/// Ordered operations that make both sides converge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub operations: Vec<SyncOperation>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

/// Compare the provider snapshot with the local snapshot
pub fn synchronize(remote_events: &[CalendarEvent], local_events: &[CalendarEvent]) -> SyncPlan {
    let mut operations = Vec::new();

    let local_by_external: HashMap<&str, &CalendarEvent> = local_events
        .iter()
        .filter_map(|local| local.external_id.as_deref().map(|id| (id, local)))
        .collect();

    // Remote -> local
    for remote in remote_events {
        let Some(remote_id) = remote.external_id.as_deref() else {
            continue;
        };

        match local_by_external.get(remote_id) {
            None => operations.push(SyncOperation::CreateLocal(remote.clone())),
            Some(local) => {
                if let Some(internal_id) = &local.internal_id {
                    if local.content_differs(remote) {
                        operations.push(SyncOperation::UpdateLocal {
                            internal_id: internal_id.clone(),
                            remote: remote.clone(),
                        });
                    }
                }
            }
        }
    }

    // Local -> remote, against the original remote snapshot
    let remote_ids: HashSet<&str> = remote_events
        .iter()
        .filter_map(|remote| remote.external_id.as_deref())
        .collect();

    for local in local_events {
        let (Some(internal_id), Some(external_id)) = (&local.internal_id, &local.external_id) else {
            continue;
        };

        if !remote_ids.contains(external_id.as_str()) {
            operations.push(SyncOperation::CreateRemote(local.clone()));
            operations.push(SyncOperation::LinkLocal {
                internal_id: internal_id.clone(),
            });
        }
    }

    SyncPlan { operations }
}
