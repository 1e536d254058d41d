//! Persistent registry of workspaces ("spaces").
//!
//! [`IndexStore`] owns the id -> path file on disk, [`Registry`] is its
//! in-memory working copy, [`SpaceCache`] keeps recently materialized spaces,
//! and [`SpaceRepository`] composes the three behind the public API.
//! [`SkillStore`] confines skill-file writes to the roots the repository
//! knows about.

pub mod cache;
pub mod error;
pub mod index;
pub mod meta;
pub mod model;
pub mod registry;
pub mod repository;
pub mod skills;

pub use cache::SpaceCache;
pub use error::SpaceError;
pub use index::{IndexEntry, IndexStore, LoadedIndex, SpaceIndex};
pub use model::{
    CreateSpace, LayoutPreferences, Space, SpaceMeta, SpacePreferences, UpdateSpace,
    TEMP_SPACE_ID,
};
pub use registry::Registry;
pub use repository::{FolderOpener, RepositoryStats, SpaceRepository, SystemOpener};
pub use skills::SkillStore;
