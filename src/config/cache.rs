//! Session snapshot cache configuration

/// Seconds before a cached analysis snapshot is considered stale.
pub const SNAPSHOT_TTL_SECS: u64 = 150;

/// Upper bound on the number of snapshots kept in one session.
pub const SNAPSHOT_MAX_ENTRIES: usize = 64;
