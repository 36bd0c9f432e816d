//! 考试会话控制器 - 流程层
//!
//! 核心职责：持有考试状态（题目、作答、当前题号、倒计时），
//! 处理翻页、作答、计时和提交判分。
//!
//! 状态转换：
//! 1. Running → Running / TimeExpired / Terminated
//! 2. TimeExpired → Submitting / Terminated
//! 3. Submitting → Submitted（成绩保存失败时进入 Error，可重新提交）
//! 4. Submitted / Terminated 为终态

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::SessionConfig;
use crate::error::{AppResult, SessionError};
use crate::infrastructure::{ExamRepository, QuestionView};
use crate::models::{ExamMeta, Question, ResultRecord, SessionStatus};
use crate::services::{resolve_duration_seconds, GradingFailure, GradingService};

/// 计时节拍结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u64 },
    /// 时间到，会话已进入 TimeExpired
    Expired,
}

/// 提交结果
#[derive(Debug)]
pub struct SubmissionReport {
    pub score: u8,
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
    pub failures: Vec<GradingFailure>,
}

impl SubmissionReport {
    /// 部分作答记录失败时作为警告返回给调用方
    pub fn partial_failure(&self) -> Option<SessionError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(SessionError::GradingPartialFailure {
                failed: self.failures.len(),
                answered: self.answered,
            })
        }
    }
}

/// 考试会话控制器
///
/// 所有方法只在主控线程上调用
pub struct ExamSessionController {
    repository: Arc<dyn ExamRepository>,
    grading: GradingService,
    exam: ExamMeta,
    student_id: String,
    questions: Vec<Question>,
    answers: HashMap<String, u8>,
    current_index: usize,
    remaining_secs: u64,
    status: SessionStatus,
    termination_reason: Option<String>,
}

impl ExamSessionController {
    /// 开始考试
    ///
    /// # 参数
    /// - `repository`: 题库（用于提交时判分和保存）
    /// - `student_id`: 考生
    /// - `exam`: 考试元数据，时长按阈值规则换算
    /// - `questions`: 题目列表，不能为空
    ///
    /// 换算后时长为 0 时会话以 `TimeExpired` 开始，调用方应立即提交
    pub fn start(
        repository: Arc<dyn ExamRepository>,
        student_id: impl Into<String>,
        exam: ExamMeta,
        questions: Vec<Question>,
        config: &SessionConfig,
    ) -> AppResult<Self> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestions);
        }

        let remaining_secs =
            resolve_duration_seconds(exam.duration_raw, config.duration_seconds_threshold);

        info!(
            "[考试 {}] ▶️ 考试开始: {} | 共 {} 题 | 时长 {} 秒",
            exam.id,
            exam.name,
            questions.len(),
            remaining_secs
        );

        // 没有剩余时间时直接进入 TimeExpired，不接受任何作答
        let status = if remaining_secs == 0 {
            warn!("[考试 {}] ⏰ 考试时长为 0，直接进入交卷", exam.id);
            SessionStatus::TimeExpired
        } else {
            SessionStatus::Running
        };

        Ok(Self {
            grading: GradingService::new(repository.clone()),
            repository,
            exam,
            student_id: student_id.into(),
            questions,
            answers: HashMap::new(),
            current_index: 0,
            remaining_secs,
            status,
            termination_reason: None,
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn exam(&self) -> &ExamMeta {
        &self.exam
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &HashMap<String, u8> {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn termination_reason(&self) -> Option<&str> {
        self.termination_reason.as_deref()
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    /// 当前题目的显示内容
    pub fn current_view(&self) -> QuestionView {
        let question = self.current_question();
        QuestionView {
            number: self.current_index + 1,
            total: self.questions.len(),
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            selected: self.answers.get(&question.id).copied(),
        }
    }

    fn ensure_running(&self, operation: &'static str) -> AppResult<()> {
        if self.status == SessionStatus::Running {
            Ok(())
        } else {
            Err(SessionError::invalid_state(operation, self.status))
        }
    }

    /// 选择答案，重复选择同一栏位只是覆盖
    pub fn select_answer(&mut self, question_id: &str, slot: u8) -> AppResult<()> {
        self.ensure_running("select_answer")?;

        let valid = self
            .questions
            .iter()
            .any(|q| q.id == question_id && q.has_slot(slot));
        if !valid {
            return Err(SessionError::InvalidAnswer {
                question_id: question_id.to_string(),
                slot,
            });
        }

        self.answers.insert(question_id.to_string(), slot);
        Ok(())
    }

    /// 为当前题目选择答案
    pub fn select_current(&mut self, slot: u8) -> AppResult<()> {
        let question_id = self.current_question().id.clone();
        self.select_answer(&question_id, slot)
    }

    /// 下一题，已是最后一题时不动；返回是否移动
    pub fn next(&mut self) -> AppResult<bool> {
        self.ensure_running("next")?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// 上一题，已是第一题时不动；返回是否移动
    pub fn previous(&mut self) -> AppResult<bool> {
        self.ensure_running("previous")?;
        if self.current_index > 0 {
            self.current_index -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// 每秒调用一次，扣减剩余时间
    pub fn tick(&mut self) -> AppResult<TickOutcome> {
        self.ensure_running("tick")?;

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.status = SessionStatus::TimeExpired;
            warn!("[考试 {}] ⏰ 考试时间到", self.exam.id);
            return Ok(TickOutcome::Expired);
        }

        Ok(TickOutcome::Running {
            remaining_secs: self.remaining_secs,
        })
    }

    /// 提交试卷并判分
    ///
    /// 正在提交时再次调用返回 `Ok(None)`；已提交或已终止时返回错误
    pub async fn submit(&mut self) -> AppResult<Option<SubmissionReport>> {
        if self.status.is_terminal() {
            return Err(SessionError::invalid_state("submit", self.status));
        }
        if self.status == SessionStatus::Submitting {
            return Ok(None);
        }

        self.status = SessionStatus::Submitting;
        info!(
            "[考试 {}] 📤 正在提交，已作答 {}/{} 题",
            self.exam.id,
            self.answers.len(),
            self.questions.len()
        );

        let report = self
            .grading
            .grade(&self.exam.id, &self.student_id, &self.questions, &self.answers)
            .await;
        let score = report.score();

        let result = ResultRecord {
            exam_id: self.exam.id.clone(),
            student_id: self.student_id.clone(),
            score,
            completed_at: Utc::now(),
        };

        if let Err(e) = self.repository.save_result(&result).await {
            error!("[考试 {}] ❌ 成绩保存失败: {}", self.exam.id, e);
            self.status = SessionStatus::Error;
            return Err(SessionError::ResultNotSaved(e));
        }

        self.status = SessionStatus::Submitted;
        info!(
            "[考试 {}] ✅ 提交完成: 得分 {}% (正确 {}/{})",
            self.exam.id, score, report.correct, report.total
        );

        Ok(Some(SubmissionReport {
            score,
            correct: report.correct,
            answered: report.answered,
            total: report.total,
            failures: report.failures,
        }))
    }

    /// 强制结束考试，不判分
    ///
    /// 已终止时再次调用不产生任何效果，返回 `Ok(false)`
    pub fn terminate(&mut self, reason: impl Into<String>) -> AppResult<bool> {
        match self.status {
            SessionStatus::Running | SessionStatus::TimeExpired => {
                let reason = reason.into();
                warn!("[考试 {}] ⛔ 考试被终止: {}", self.exam.id, reason);
                self.status = SessionStatus::Terminated;
                self.termination_reason = Some(reason);
                Ok(true)
            }
            SessionStatus::Terminated => Ok(false),
            _ => Err(SessionError::invalid_state("terminate", self.status)),
        }
    }
}
