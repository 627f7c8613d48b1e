//! Staged files with hidden temporary names and atomic commit.
//!
//! A [`StagedFile`] is written under a name readers never look up
//! (`.{name}.tmp` by default) and only becomes visible under its final name
//! through a single rename in [`StagedFile::commit`]. Dropping an uncommitted
//! staged file removes it; a crash leaves at most an orphaned hidden file.

mod error;
mod range;
mod staged;

pub use error::{Error, Result};
pub use range::read_range;
pub use staged::{StageOptions, StagedFile};
