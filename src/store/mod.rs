//! Durable cache layer.

pub mod cache;

pub use cache::DurableCache;

/// Persisted cache keys.
///
/// Keys carry an explicit schema version so records written by older,
/// incompatible releases never collide with the current format: a version
/// bump simply orphans the old files.
pub mod keys {
    pub const USER_SNAPSHOT: &str = "mshprep.v5.user";
    pub const TRIAL_TIMER: &str = "mshprep.v5.trial_timer";
    pub const TRIAL_EXPIRED: &str = "mshprep.v5.trial_expired";
    pub const EXAM_RESULTS: &str = "mshprep.v5.exam_results";
    pub const RECENT_ACTIVITY: &str = "mshprep.v5.recent_activity";
    pub const SYNC_BUFFER: &str = "mshprep.v5.sync_buffer";
    pub const DEVICE_ID: &str = "mshprep.v5.device_id";
}
