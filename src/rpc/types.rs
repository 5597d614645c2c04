//! Composite result shapes returned by typed methods.

use crate::primitives::Quantity;
use serde::{Deserialize, Serialize};

/// Result of `eth_syncing`: the literal `false` when the node is caught up,
/// otherwise an object with the sync window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSyncStatus")]
pub enum SyncStatus {
    NotSyncing,
    Syncing(SyncProgress),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub starting_block: Quantity,
    pub current_block: Quantity,
    pub highest_block: Quantity,
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing(_))
    }

    pub fn progress(&self) -> Option<&SyncProgress> {
        match self {
            SyncStatus::NotSyncing => None,
            SyncStatus::Syncing(progress) => Some(progress),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSyncStatus {
    Flag(bool),
    Progress(SyncProgress),
}

impl TryFrom<RawSyncStatus> for SyncStatus {
    type Error = String;

    fn try_from(raw: RawSyncStatus) -> Result<Self, Self::Error> {
        match raw {
            RawSyncStatus::Flag(false) => Ok(SyncStatus::NotSyncing),
            RawSyncStatus::Flag(true) => {
                Err("eth_syncing returned `true` without sync progress".to_string())
            }
            RawSyncStatus::Progress(progress) => Ok(SyncStatus::Syncing(progress)),
        }
    }
}

impl Serialize for SyncStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SyncStatus::NotSyncing => serializer.serialize_bool(false),
            SyncStatus::Syncing(progress) => progress.serialize(serializer),
        }
    }
}
