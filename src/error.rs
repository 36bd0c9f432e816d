use thiserror::Error;

use crate::models::SessionStatus;

/// 考试会话错误类型
#[derive(Debug, Error)]
pub enum SessionError {
    /// 在非法状态下调用操作
    #[error("操作 {operation} 在状态 {status} 下不可用")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },
    /// 试卷没有题目
    #[error("试卷没有任何题目")]
    EmptyQuestions,
    /// 题目或选项不存在
    #[error("无效的作答: 题目 {question_id} 选项 {slot}")]
    InvalidAnswer { question_id: String, slot: u8 },
    /// 考试不存在
    #[error("考试不存在: {exam_id}")]
    ExamNotFound { exam_id: String },
    /// 考试当前不可参加（未开放、已结束或未激活）
    #[error("考试 {exam_id} 当前不可参加: {reason}")]
    ExamUnavailable { exam_id: String, reason: String },
    /// 已经提交过该考试
    #[error("考生 {student_id} 已参加过考试 {exam_id}")]
    AlreadyAttempted { exam_id: String, student_id: String },
    /// 题库调用失败
    #[error("题库错误: {0}")]
    Repository(#[from] RepositoryError),
    /// 监考组件配置错误
    #[error("监考配置错误: {0}")]
    Configuration(String),
    /// 部分作答记录保存失败
    #[error("{failed}/{answered} 条作答记录处理失败")]
    GradingPartialFailure { failed: usize, answered: usize },
    /// 成绩记录保存失败
    #[error("成绩保存失败: {0}")]
    ResultNotSaved(RepositoryError),
}

/// 题库调用错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 记录不存在
    #[error("记录不存在: {what}")]
    NotFound { what: String },
    /// 网络请求失败
    #[error("请求失败: {0}")]
    Transport(String),
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}")]
    BadResponse { endpoint: String, status: u16 },
    /// 响应解析失败
    #[error("响应解析失败: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RepositoryError::Decode(err.to_string())
        } else {
            RepositoryError::Transport(err.to_string())
        }
    }
}

/// 摄像头采集错误
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// 无法打开设备
    #[error("摄像头不可用: {0}")]
    Unavailable(String),
    /// 读取帧失败
    #[error("读取画面失败: {0}")]
    FrameFailed(String),
    /// 读取帧超时
    #[error("读取画面超时")]
    Timeout,
}

// ========== 便捷构造函数 ==========

impl SessionError {
    pub fn invalid_state(operation: &'static str, status: SessionStatus) -> Self {
        SessionError::InvalidState { operation, status }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, SessionError>;
