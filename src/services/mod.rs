pub mod availability;
pub mod exam_clock;
pub mod grading;
pub mod violation_policy;

pub use availability::{availability, Availability};
pub use exam_clock::{countdown_view, format_remaining, resolve_duration_seconds};
pub use grading::{compute_score, GradingFailure, GradingReport, GradingService};
pub use violation_policy::{ViolationDecision, ViolationPolicy};
