//! 判分服务 - 业务能力层
//!
//! 只负责"逐题取答案、判对错、保存作答记录"，不关心会话状态

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RepositoryError;
use crate::infrastructure::ExamRepository;
use crate::models::{AnswerRecord, Question};

/// 单道题处理失败
#[derive(Debug)]
pub struct GradingFailure {
    pub question_id: String,
    pub error: RepositoryError,
}

/// 判分结果
#[derive(Debug, Default)]
pub struct GradingReport {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
    /// 成功保存的作答记录数
    pub records_saved: usize,
    pub failures: Vec<GradingFailure>,
}

impl GradingReport {
    pub fn score(&self) -> u8 {
        compute_score(self.correct, self.total)
    }
}

/// 百分制得分：`round(100 * correct / total)`，没有题目时为 0
pub fn compute_score(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = (100.0 * correct as f64 / total as f64).round();
    score.clamp(0.0, 100.0) as u8
}

/// 判分服务
///
/// 职责：
/// - 只对已作答的题目逐一获取答案（不做批量预取）
/// - 按选项文本严格比较
/// - 每题保存一条作答记录，单题失败不影响其他题
pub struct GradingService {
    repository: Arc<dyn ExamRepository>,
}

impl GradingService {
    pub fn new(repository: Arc<dyn ExamRepository>) -> Self {
        Self { repository }
    }

    /// 判分并保存作答记录
    ///
    /// # 参数
    /// - `exam_id`: 考试ID
    /// - `student_id`: 考生
    /// - `questions`: 全部题目（决定顺序和总数）
    /// - `answers`: 题目ID → 所选栏位
    pub async fn grade(
        &self,
        exam_id: &str,
        student_id: &str,
        questions: &[Question],
        answers: &HashMap<String, u8>,
    ) -> GradingReport {
        let mut report = GradingReport {
            total: questions.len(),
            ..Default::default()
        };

        for question in questions {
            let Some(&slot) = answers.get(&question.id) else {
                continue;
            };
            report.answered += 1;

            let key = match self.repository.get_answer_key(&question.id).await {
                Ok(key) => key,
                Err(error) => {
                    warn!("[考试 {}] ⚠️ 获取题目 {} 的答案失败: {}", exam_id, question.id, error);
                    report.failures.push(GradingFailure {
                        question_id: question.id.clone(),
                        error,
                    });
                    continue;
                }
            };

            let (selected_answer, is_correct) = key.judge(slot);
            if is_correct {
                report.correct += 1;
            }
            debug!(
                "[考试 {}] 题目 {}: 选择 {:?} → {}",
                exam_id,
                question.id,
                selected_answer,
                if is_correct { "正确" } else { "错误" }
            );

            let record = AnswerRecord {
                exam_id: exam_id.to_string(),
                question_id: question.id.clone(),
                student_id: student_id.to_string(),
                selected_answer,
                is_correct,
            };

            match self.repository.save_answer(&record).await {
                Ok(()) => report.records_saved += 1,
                Err(error) => {
                    warn!("[考试 {}] ⚠️ 保存题目 {} 的作答失败: {}", exam_id, question.id, error);
                    report.failures.push(GradingFailure {
                        question_id: question.id.clone(),
                        error,
                    });
                }
            }
        }

        report
    }
}
