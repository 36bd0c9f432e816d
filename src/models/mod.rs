pub mod exam;
pub mod proctoring;
pub mod records;

pub use exam::{
    deserialize_id, AnswerKey, AnswerOption, ExamMeta, ExamStatus, Question, SessionStatus,
    OPTION_SLOTS,
};
pub use proctoring::{
    CameraStatus, GazeClassification, GazeReading, ProctoringEvent, ProctoringState,
    StampedEvent, ViolationReason,
};
pub use records::{AnswerRecord, ResultRecord};
