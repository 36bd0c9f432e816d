//! 展示层接口
//!
//! 只负责显示和接收用户指令，不做任何判断

use crate::models::{AnswerOption, ProctoringState, ViolationReason};

/// 当前题目的显示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 题号（从 1 开始）
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
    /// 之前选过的栏位
    pub selected: Option<u8>,
}

/// 倒计时显示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    pub remaining_secs: u64,
    /// `MM:SS`
    pub text: String,
    /// 剩余时间不足，需要醒目显示
    pub is_low: bool,
}

/// 提示消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// 可关闭的一般警告，考试继续
    Warning(String),
    /// 视线检测不可用，考试继续
    ProctoringUnavailable(String),
    /// 单次违规警告
    Violation {
        reason: ViolationReason,
        count: u32,
        max: u32,
    },
    /// 时间到，即将自动提交
    TimeUp,
    /// 考试被强制结束
    Terminated { reason: String },
    /// 提交成功
    Submitted {
        score: u8,
        correct: usize,
        total: usize,
    },
    /// 提交失败
    SubmissionFailed(String),
}

/// 用户指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Next,
    Previous,
    /// 为当前题目选择栏位
    Select { slot: u8 },
    Submit,
    /// 界面被隐藏
    Hidden,
    /// 界面重新显示
    Shown,
    /// 关闭考试界面
    Close,
}

/// 展示界面
pub trait PresentationSurface: Send {
    fn show_question(&mut self, view: &QuestionView);
    fn show_countdown(&mut self, view: &CountdownView);
    fn show_proctoring(&mut self, state: &ProctoringState);
    fn notify(&mut self, notice: &Notice);
}
