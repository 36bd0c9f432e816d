use chrono::{DateTime, Utc};
use serde::Serialize;

/// 作答记录（每道已作答题目一条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub exam_id: String,
    pub question_id: String,
    #[serde(rename = "student_username")]
    pub student_id: String,
    pub selected_answer: String,
    pub is_correct: bool,
}

/// 成绩记录（每次提交一条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub exam_id: String,
    #[serde(rename = "student_username")]
    pub student_id: String,
    /// 百分制得分 0-100
    pub score: u8,
    pub completed_at: DateTime<Utc>,
}
