//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_orchestrator` - 考试会话编排器
//! - 打开会话并组装控制器和监考组件
//! - 唯一的主控循环，按顺序处理计时、监考事件和用户指令
//! - 管理可见性变化和离开会话
//!
//! ### `app` - 命令行客户端
//! - 组装题库客户端、终端界面、监考能力
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! session_orchestrator (主控循环)
//!     ↓
//! workflow::{ExamSessionController, ProctoringMonitor}
//!     ↓
//! services (能力层：违规判定 / 判分 / 计时 / 开放时间)
//!     ↓
//! infrastructure (基础设施：题库、摄像头、窗口、界面)
//! ```

pub mod app;
pub mod session_orchestrator;

// 重新导出主要类型
pub use app::App;
pub use session_orchestrator::{
    LeaveCallback, ProctoringSetup, SessionOrchestrator, SessionOutcome, REASON_MAX_VIOLATIONS,
    REASON_SESSION_CLOSED,
};
