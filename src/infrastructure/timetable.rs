//! Pending-operation timetable
//!
//! Every intercepted promise or fetch registers here under a display name.
//! Duplicate base names are disambiguated with `[2]`, `[3]`, ... suffixes in
//! registration order, and lookups by base name always land on the earliest
//! entry that has not been settled yet.

use crate::domain::deferred::{Deferred, DeferredId, Payload, Settler};
use crate::domain::resolution::{NormalizedResolution, ResolutionKind};
use crate::domain::types::suffixed;
use crate::error::{Error, Result};
use crate::infrastructure::log_messages::timetable as messages;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a primitive hands to the timetable when it creates a deferred value
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub deferred: Deferred,
    pub settler: Settler,
    pub aux: Payload,
}

/// Read-only view of a timetable entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub name: String,
    pub deferred: DeferredId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Payload,
    pub called: bool,
}

#[derive(Debug)]
struct TimetableEntry {
    name: String,
    deferred: Deferred,
    settler: Settler,
    aux: Payload,
    called: bool,
}

impl TimetableEntry {
    fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            name: self.name.clone(),
            deferred: self.deferred.id(),
            aux: self.aux.clone(),
            called: self.called,
        }
    }
}

/// Shared handle to the ordered collection of pending entries
///
/// Cloning the handle does not copy entries; all clones see the same table.
/// Tests isolate themselves with [`Timetable::reset_all`] or a fresh table.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    entries: Arc<Mutex<Vec<TimetableEntry>>>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new entry and return the display name it was given
    pub fn register(&self, registration: Registration) -> String {
        let mut entries = self.entries.lock();

        let mut index = 1;
        while entries
            .iter()
            .any(|entry| entry.name == suffixed(&registration.name, index))
        {
            index += 1;
        }
        let name = suffixed(&registration.name, index);

        debug!(
            name = %name,
            deferred = %registration.deferred.id(),
            "{}",
            messages::REGISTERED
        );

        entries.push(TimetableEntry {
            name: name.clone(),
            deferred: registration.deferred,
            settler: registration.settler,
            aux: registration.aux,
            called: false,
        });
        name
    }

    /// Earliest entry addressed by `name` that has not been settled yet
    pub fn find(&self, name: &str) -> Option<EntrySnapshot> {
        let entries = self.entries.lock();
        let target = target_name(&entries, name);
        entries
            .iter()
            .find(|entry| entry.name == target)
            .map(TimetableEntry::snapshot)
    }

    /// Oldest registered entry that has not been settled yet
    pub fn find_next_pending(&self) -> Option<EntrySnapshot> {
        self.entries
            .lock()
            .iter()
            .find(|entry| !entry.called)
            .map(TimetableEntry::snapshot)
    }

    /// Settle the entry a directive addresses
    ///
    /// Completes once the entry's deferred value has settled and the current
    /// task has yielded once, so continuations waiting on that value run
    /// before the caller moves on.
    pub async fn settle(&self, resolution: &NormalizedResolution) -> Result<()> {
        let deferred = {
            let mut entries = self.entries.lock();
            let target = target_name(&entries, resolution.name.as_ref());

            let Some(entry) = entries.iter_mut().find(|entry| entry.name == target) else {
                warn!(name = %target, "{}", messages::ENTRY_NOT_FOUND);
                return Err(Error::entry_not_found(target));
            };

            match resolution.kind {
                ResolutionKind::Settle => entry.settler.fulfil(resolution.payload.clone()),
                ResolutionKind::Abort => entry.settler.fail(resolution.payload.clone()),
            };
            entry.called = true;

            debug!(
                name = %entry.name,
                kind = %resolution.kind,
                "{}",
                messages::SETTLED
            );
            entry.deferred.clone()
        };

        // Fulfilment and failure both count as settled here
        let _settlement = deferred.settled().await;
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Drop every entry backed by `deferred`; returns whether any were removed
    pub fn remove(&self, deferred: &Deferred) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.deferred.id() != deferred.id());

        let removed = before != entries.len();
        if removed {
            debug!(deferred = %deferred.id(), "{}", messages::REMOVED);
        }
        removed
    }

    pub fn reset_all(&self) {
        self.entries.lock().clear();
        debug!("{}", messages::RESET);
    }

    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.entries
            .lock()
            .iter()
            .map(TimetableEntry::snapshot)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| !entry.called)
            .count()
    }
}

/// Display name a lookup of `base` resolves to
///
/// Skips suffixes whose entry has already been settled, so repeated lookups
/// of one base name walk through its duplicates in registration order.
fn target_name(entries: &[TimetableEntry], base: &str) -> String {
    let mut index = 1;
    while entries
        .iter()
        .any(|entry| entry.called && entry.name == suffixed(base, index))
    {
        index += 1;
    }
    suffixed(base, index)
}
