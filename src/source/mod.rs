//! Source acquisition: the firmware tree checkout and its package feeds.
//!
//! - `git`: clone/update of the source tree and commit metadata queries
//! - `feeds`: custom feed registration and the feed update/install steps

pub mod feeds;
pub mod git;

pub use feeds::{ensure_feed_line, register_feeds};
pub use git::{commit_info_or_placeholder, sync_repository, GitError, GitManager};
