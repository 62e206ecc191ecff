//! Patent input records and the readers that load them.

pub mod reader;
pub mod record;
pub mod source;

pub use reader::FileReader;
pub use record::{DEFAULT_DESCRIPTION_LIMIT, PatentRecord, is_safe_file_stem};
pub use source::{DirectorySource, PatentSource};
