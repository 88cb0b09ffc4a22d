pub mod paging;

pub use paging::{ListParams, PagedResponse};
