//! Content model and collaborators: records, queries, engine, reading history.

pub mod engine;
pub mod query;
pub mod reading;
pub mod record;
pub mod terms;

pub use engine::{ContentEngine, MemoryEngine, QueryError, QueryErrorReason, QueryResults};
pub use query::{Query, Sort, SortOrder, DEFAULT_LIMIT};
pub use reading::{MemoryReadingHistory, ReadingHistory};
pub use record::{ContentRecord, ARTICLE_TAG, RESERVED_TAG_PREFIX, SET_TAG};
