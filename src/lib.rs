//! # Exam Proctor
//!
//! 带监考模式的考试客户端核心：限时答题、提交判分，以及基于摄像头视线检测和全屏检查的违规监控
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部协作方的接口：题库、摄像头、视线检测、窗口、展示界面
//! - `clients/` - 题库的 REST 实现
//!
//! ### ② 业务能力层（Services）
//! - `ViolationPolicy` - 违规去抖和上限判定（纯状态机）
//! - `GradingService` - 逐题取答案判分
//! - `exam_clock` / `availability` - 时长换算、倒计时、开放时间
//!
//! ### ③ 流程层（Workflow）
//! - `ExamSessionController` - 考试状态机
//! - `ProctoringMonitor` - 后台采集线程 + 全屏检查 + 事件应用
//!
//! ### ④ 编排层（Orchestration）
//! - `SessionOrchestrator` - 唯一的主控循环，组装组件并管理生命周期
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppResult, CaptureError, RepositoryError, SessionError};
pub use orchestrator::{App, ProctoringSetup, SessionOrchestrator, SessionOutcome};
pub use services::ViolationPolicy;
pub use workflow::{ExamSessionController, ProctoringMonitor};
