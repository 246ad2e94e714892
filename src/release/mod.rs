//! Release side of the run: collected images, the release-info record and
//! the optional hosted release.

pub mod artifacts;
pub mod metadata;
pub mod publisher;

pub use artifacts::{clear_stale_artifacts, collect_artifacts, list_output_dir};
pub use metadata::{ReleaseInfo, RepoSection};
pub use publisher::{publish_release, release_tag, should_publish};
