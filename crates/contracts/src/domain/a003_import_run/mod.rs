pub mod aggregate;

pub use aggregate::{ImportRun, ImportRunDto, ImportRunId, ImportRunItem, ImportRunStatus};
