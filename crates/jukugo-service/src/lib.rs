//! Jukugo Service - Import pipeline and graph queries
//!
//! Ties the dictionary reader, the classifier and a graph store together.
//! [`Importer`] runs one import per level request; [`GraphQueries`] is the
//! read path that stays available while imports run.

pub mod error;
pub mod import;
pub mod levels;
pub mod query;

pub use error::{ServiceError, ServiceResult};
pub use import::{ImportReport, ImportRequest, ImportRunId, Importer};
pub use levels::{LevelSource, StaticLevelSource, TsvLevelSource};
pub use query::GraphQueries;
