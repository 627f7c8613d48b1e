//! Immutable data types for capture discovery.

mod options;
mod record;

pub use options::{CdxOptions, DEFAULT_ENDPOINT, DiscoveryProgress, ProgressFn};
pub use record::{
    CaptureRecord, MatchScope, RobotFlag, format_timestamp, parse_timestamp, parse_timestamp_upper,
};
