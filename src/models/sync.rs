//! Pending-sync buffer: locally staged state awaiting backend acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Buffer categories. One entry per category; staging overwrites, so a
/// retried flush can never append duplicate server-side records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCategory {
    TrialTimer,
    ExamResults,
    RecentActivity,
    UserProfile,
}

/// A staged payload and its acknowledgment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEntry {
    pub payload: serde_json::Value,
    pub last_updated_at: DateTime<Utc>,
    pub synced: bool,
    /// Server acknowledgment time; None until the first successful flush.
    pub acked_at: Option<DateTime<Utc>>,
}

/// Category-keyed staging area, persisted as one cache record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncBuffer {
    pub entries: HashMap<SyncCategory, SyncEntry>,
}

impl SyncBuffer {
    /// Stage a payload, replacing any previous one for the category.
    pub fn stage(&mut self, category: SyncCategory, payload: serde_json::Value, now: DateTime<Utc>) {
        self.entries.insert(
            category,
            SyncEntry {
                payload,
                last_updated_at: now,
                synced: false,
                acked_at: None,
            },
        );
    }

    /// Snapshot of everything not yet acknowledged.
    pub fn unsynced(&self) -> Vec<(SyncCategory, SyncEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.synced)
            .map(|(c, e)| (*c, e.clone()))
            .collect()
    }

    pub fn unsynced_count(&self) -> usize {
        self.entries.values().filter(|e| !e.synced).count()
    }

    /// Mark flushed entries as acknowledged.
    ///
    /// `flushed` carries the `last_updated_at` each payload had when it was
    /// sent; an entry restaged during the round trip no longer matches and
    /// stays unsynced, so the newer payload is not silently dropped.
    pub fn mark_synced(
        &mut self,
        flushed: &[(SyncCategory, DateTime<Utc>)],
        acked_at: DateTime<Utc>,
    ) {
        for (category, sent_at) in flushed {
            if let Some(entry) = self.entries.get_mut(category) {
                if entry.last_updated_at == *sent_at {
                    entry.synced = true;
                    entry.acked_at = Some(acked_at);
                }
            }
        }
    }
}
