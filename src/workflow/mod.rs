pub mod exam_session;
pub mod proctoring_monitor;

pub use exam_session::{ExamSessionController, SubmissionReport, TickOutcome};
pub use proctoring_monitor::{MonitorAction, ProctoringMonitor};
