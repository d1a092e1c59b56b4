//! The checkpoint schedule: fixed elapsed-hour offsets from upload time at
//! which performance metrics are sampled.

/// Default checkpoint ages in elapsed hours: 1h, 6h, 24h, 48h, 7d, 30d.
pub const DEFAULT_CHECKPOINT_AGES: [i32; 6] = [1, 6, 24, 48, 168, 720];

/// Minimum checkpoint age (hours) an upload must have reached before the
/// labeling sweep considers it. 168 = 7 days.
pub const DEFAULT_MIN_LABEL_CHECKPOINT_HOURS: i32 = 168;

/// An ordered, immutable list of checkpoint ages. Constructed once at startup
/// and injected into the tracker; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSchedule {
    ages: Vec<i32>,
}

impl Default for CheckpointSchedule {
    fn default() -> Self {
        Self {
            ages: DEFAULT_CHECKPOINT_AGES.to_vec(),
        }
    }
}

impl CheckpointSchedule {
    /// Builds a schedule from arbitrary ages. Duplicates are removed and the
    /// result is sorted ascending so checkpoint runs always process the
    /// earliest ages first.
    #[must_use]
    pub fn new(mut ages: Vec<i32>) -> Self {
        ages.sort_unstable();
        ages.dedup();
        ages.retain(|&a| a > 0);
        Self { ages }
    }

    /// Ages in ascending order.
    #[must_use]
    pub fn ages(&self) -> &[i32] {
        &self.ages
    }

    /// Whether `age` is one of the scheduled checkpoints.
    #[must_use]
    pub fn contains(&self, age: i32) -> bool {
        self.ages.binary_search(&age).is_ok()
    }
}
