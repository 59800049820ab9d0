//! Version handling for the plugin index.
//!
//! Plugin and host versions do not follow a single format, so nothing here
//! uses semver. Versions are compared segment by segment, numerically when
//! both segments are integers and lexically otherwise.

mod branch;
mod compare;
mod merge;

pub use branch::{BranchResolver, DEFAULT_VIEW_PREFIX, MASTER_BRANCH};
pub use compare::{compare, is_later};
pub use merge::keep_latest;
