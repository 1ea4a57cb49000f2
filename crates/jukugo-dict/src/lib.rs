//! Jukugo Dict - Streaming dictionary reader
//!
//! Reads a JMdict-shaped XML file one `<entry>` at a time. Only the fields
//! the compound pipeline needs are kept: written forms (`keb`), readings
//! (`reb`) and sense glosses (`gloss`).

pub mod entities;
pub mod entry;
pub mod error;
pub mod reader;

pub use entities::EntityTable;
pub use entry::{Entry, SenseGroup};
pub use error::{DictError, DictResult};
pub use reader::{DictionaryReader, ParseStats};
