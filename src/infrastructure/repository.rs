//! 题库接口 - 基础设施层
//!
//! 只描述"能取什么、能存什么"，不关心传输方式

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::models::{AnswerKey, AnswerRecord, ExamMeta, Question, ResultRecord};

/// 题库
///
/// 职责：
/// - 获取考试元数据和题目（题目不含答案）
/// - 按题获取答案，仅在判分时调用
/// - 保存作答记录和成绩记录
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// 获取考试元数据，不存在时返回 `RepositoryError::NotFound`
    async fn get_exam_meta(&self, exam_id: &str) -> Result<ExamMeta, RepositoryError>;

    /// 按顺序获取考试的全部题目
    async fn list_questions(&self, exam_id: &str) -> Result<Vec<Question>, RepositoryError>;

    async fn get_answer_key(&self, question_id: &str) -> Result<AnswerKey, RepositoryError>;

    async fn save_answer(&self, record: &AnswerRecord) -> Result<(), RepositoryError>;

    async fn save_result(&self, record: &ResultRecord) -> Result<(), RepositoryError>;

    /// 考生是否已有该考试的成绩记录
    async fn has_result(&self, exam_id: &str, student_id: &str) -> Result<bool, RepositoryError>;
}
