pub mod queue;
pub mod spec;

pub use queue::{initial_bucket, Bucket, QueueError, WorkQueue};
pub use spec::{Priority, RuntimeValidationSpec, SpecAction, Specification, SpecSource};
