use std::collections::BTreeMap;

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::catalog::{LevelId, FIRST_LEVEL_ID};
use crate::error::ProgressError;

pub const PROGRESS_VERSION: u32 = 1;

/// Key-value persistence of best completion times, keyed by level id.
pub trait ProgressStore {
    fn best_time(&self, level_id: LevelId) -> Option<f32>;
    fn set_best_time(&mut self, level_id: LevelId, time: f32);
}

/// Outcome of finishing a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionReport {
    pub level_id: LevelId,
    pub time: f32,
    pub best_time: f32,
    pub is_new_record: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryProgress {
    best_times: BTreeMap<LevelId, f32>,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blob(blob: &ProgressBlob) -> Self {
        let best_times = blob
            .records
            .iter()
            .filter(|record| record.best_time.is_finite() && record.best_time >= 0.0)
            .map(|record| (record.level_id, record.best_time))
            .collect();
        Self { best_times }
    }

    pub fn to_blob(&self) -> ProgressBlob {
        ProgressBlob {
            version: PROGRESS_VERSION,
            records: self
                .best_times
                .iter()
                .map(|(&level_id, &best_time)| ProgressRecord {
                    level_id,
                    best_time,
                })
                .collect(),
        }
    }

    /// Recorded best times in level order.
    pub fn records(&self) -> impl Iterator<Item = (LevelId, f32)> + '_ {
        self.best_times.iter().map(|(&id, &time)| (id, time))
    }

    pub fn is_empty(&self) -> bool {
        self.best_times.is_empty()
    }

    pub fn clear(&mut self) {
        self.best_times.clear();
    }
}

impl ProgressStore for MemoryProgress {
    fn best_time(&self, level_id: LevelId) -> Option<f32> {
        self.best_times.get(&level_id).copied()
    }

    fn set_best_time(&mut self, level_id: LevelId, time: f32) {
        self.best_times.insert(level_id, time);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub level_id: LevelId,
    pub best_time: f32,
}

/// Versioned on-disk form of the player's progress.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ProgressBlob {
    pub version: u32,
    pub records: Vec<ProgressRecord>,
}

impl ProgressBlob {
    pub fn encode(&self) -> Result<Vec<u8>, ProgressError> {
        rkyv::to_bytes::<Error>(self)
            .map(|bytes| bytes.into_vec())
            .map_err(|_| ProgressError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProgressError> {
        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        let blob = rkyv::from_bytes::<ProgressBlob, Error>(&aligned)
            .map_err(|_| ProgressError::Decode)?;
        if blob.version != PROGRESS_VERSION {
            return Err(ProgressError::Version {
                expected: PROGRESS_VERSION,
                found: blob.version,
            });
        }
        Ok(blob)
    }
}

/// Level 1 is always open; any later level opens once its predecessor has a best time.
pub fn is_level_unlocked<P: ProgressStore + ?Sized>(progress: &P, level_id: LevelId) -> bool {
    if level_id == FIRST_LEVEL_ID {
        return true;
    }
    level_id
        .checked_sub(1)
        .is_some_and(|previous| progress.best_time(previous).is_some())
}

/// Stores `time` as the best for `level_id` if it beats the current record.
pub fn record_completion<P: ProgressStore + ?Sized>(
    progress: &mut P,
    level_id: LevelId,
    time: f32,
) -> CompletionReport {
    let previous = progress.best_time(level_id);
    let is_new_record = match previous {
        None => true,
        Some(best) => time < best,
    };
    if is_new_record {
        progress.set_best_time(level_id, time);
        log::info!("new best time for level {}: {}", level_id, format_time(time));
    }
    CompletionReport {
        level_id,
        time,
        best_time: if is_new_record {
            time
        } else {
            previous.unwrap_or(time)
        },
        is_new_record,
    }
}

/// `MM:SS` with both fields floored.
pub fn format_time(seconds: f32) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
