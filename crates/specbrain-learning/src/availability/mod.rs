//! Field availability: which fields are realistically obtainable per category.

pub mod classify;
pub mod learner;
pub mod summary;

pub use classify::{classify, AvailabilityClass, UndisclosedEffort};
pub use learner::{update_field_availability, DomainFillStats, FieldAvailability, FieldAvailabilityRow};
pub use summary::{availability_summary, bucket_missing_fields, AvailabilitySummary, ExpectedUnknown, MissingFieldBuckets};
