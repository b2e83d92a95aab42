//! Data models exchanged with the listing endpoint
//!
//! Mission rows plus the page request/result pair every fetcher speaks.

pub mod mission;
pub mod page;

// Re-export commonly used types
pub use mission::Mission;
pub use page::{PageRequest, QueryResult};
