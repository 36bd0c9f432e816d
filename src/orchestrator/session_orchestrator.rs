//! 考试会话编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **打开会话**：获取考试元数据，校验状态、开放时间和是否已参加，获取题目（只获取一次）
//! 2. **组装组件**：创建 `ExamSessionController`，开启监考时创建 `ProctoringMonitor`
//! 3. **事件分发**：在唯一的主控循环上按顺序处理计时、全屏检查、监考事件和用户指令
//! 4. **生命周期**：界面隐藏时停止监考并退出全屏，重新显示时恢复
//! 5. **离开会话**：提交或终止后统一回调调用方
//!
//! 提交分两步进行：先做提交前清理（停止监考、退出全屏），再调用控制器提交

use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::config::{ProctoringConfig, SessionConfig};
use crate::error::{AppResult, RepositoryError, SessionError};
use crate::infrastructure::{
    DetectorCapability, ExamRepository, Notice, PresentationSurface, SessionCommand,
    WindowChrome,
};
use crate::models::{ExamMeta, ExamStatus, Question, SessionStatus, StampedEvent};
use crate::services::{availability, countdown_view, Availability};
use crate::workflow::{ExamSessionController, MonitorAction, ProctoringMonitor, TickOutcome};

/// 违规达到上限时的终止原因
pub const REASON_MAX_VIOLATIONS: &str = "max violations";
/// 考生关闭界面时的终止原因
pub const REASON_SESSION_CLOSED: &str = "session closed";

/// 会话结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Submitted {
        score: u8,
        correct: usize,
        total: usize,
        /// 部分作答记录保存失败时的警告
        partial_failure: Option<String>,
    },
    Terminated {
        reason: String,
    },
    /// 提交未完成时离开（成绩保存失败后关闭界面）
    Abandoned {
        status: SessionStatus,
    },
}

/// 离开会话的回调（例如返回考生主页）
pub type LeaveCallback = Box<dyn FnOnce(&SessionOutcome) + Send>;

/// 监考组件所需的外部能力
#[derive(Clone)]
pub struct ProctoringSetup {
    pub capability: DetectorCapability,
    pub window: Arc<dyn WindowChrome>,
}

/// 考试会话编排器
pub struct SessionOrchestrator {
    session_config: SessionConfig,
    proctoring_config: ProctoringConfig,
    repository: Arc<dyn ExamRepository>,
    surface: Box<dyn PresentationSurface>,
    proctoring: Option<ProctoringSetup>,
    on_leave: Option<LeaveCallback>,
}

impl SessionOrchestrator {
    pub fn new(
        session_config: SessionConfig,
        proctoring_config: ProctoringConfig,
        repository: Arc<dyn ExamRepository>,
        surface: Box<dyn PresentationSurface>,
    ) -> Self {
        Self {
            session_config,
            proctoring_config,
            repository,
            surface,
            proctoring: None,
            on_leave: None,
        }
    }

    /// 开启监考
    pub fn with_proctoring(mut self, setup: ProctoringSetup) -> Self {
        self.proctoring = Some(setup);
        self
    }

    pub fn on_leave(mut self, callback: impl FnOnce(&SessionOutcome) + Send + 'static) -> Self {
        self.on_leave = Some(Box::new(callback));
        self
    }

    /// 获取并校验考试，返回元数据和题目
    pub async fn open(&self, exam_id: &str, student_id: &str) -> AppResult<(ExamMeta, Vec<Question>)> {
        let meta = self
            .repository
            .get_exam_meta(exam_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound { .. } => SessionError::ExamNotFound {
                    exam_id: exam_id.to_string(),
                },
                other => SessionError::Repository(other),
            })?;

        if meta.status != ExamStatus::Active {
            return Err(SessionError::ExamUnavailable {
                exam_id: exam_id.to_string(),
                reason: format!("考试状态为 {}", meta.status),
            });
        }

        if self.session_config.enforce_availability_window {
            match availability(&meta, Local::now().time()) {
                Availability::AvailableNow => {}
                Availability::Upcoming => {
                    return Err(SessionError::ExamUnavailable {
                        exam_id: exam_id.to_string(),
                        reason: "考试尚未开始".to_string(),
                    })
                }
                Availability::Expired => {
                    return Err(SessionError::ExamUnavailable {
                        exam_id: exam_id.to_string(),
                        reason: "考试已结束".to_string(),
                    })
                }
            }
        }

        if self.repository.has_result(exam_id, student_id).await? {
            return Err(SessionError::AlreadyAttempted {
                exam_id: exam_id.to_string(),
                student_id: student_id.to_string(),
            });
        }

        let questions = self.repository.list_questions(exam_id).await?;
        info!("[考试 {}] ✓ 获取到 {} 道题目", exam_id, questions.len());
        Ok((meta, questions))
    }

    /// 运行一次完整的考试会话，直到提交或终止
    ///
    /// # 参数
    /// - `exam_id`: 考试ID
    /// - `student_id`: 考生
    /// - `commands`: 来自展示界面的用户指令
    pub async fn run(
        self,
        exam_id: &str,
        student_id: &str,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> AppResult<SessionOutcome> {
        let (meta, questions) = self.open(exam_id, student_id).await?;

        let controller = ExamSessionController::start(
            self.repository.clone(),
            student_id,
            meta,
            questions,
            &self.session_config,
        )?;

        // 监考参数不合法时整体降级为无监考，考试照常进行
        let mut disabled_reason = None;
        let setup = match (&self.proctoring, self.proctoring_config.validate()) {
            (Some(setup), Ok(())) => Some(setup),
            (Some(_), Err(e)) => {
                warn!("[考试 {}] ⚠️ {}，关闭监考", exam_id, e);
                disabled_reason = Some(e.to_string());
                None
            }
            (None, _) => None,
        };

        let (monitor, events_rx) = match setup {
            Some(setup) => {
                let (monitor, rx) = ProctoringMonitor::new(
                    exam_id,
                    self.proctoring_config.clone(),
                    setup.capability.clone(),
                    setup.window.clone(),
                );
                (Some(monitor), Some(rx))
            }
            None => (None, None),
        };

        log_session_start(exam_id, student_id, monitor.is_some());

        let SessionOrchestrator {
            session_config,
            mut surface,
            on_leave,
            ..
        } = self;

        if let Some(reason) = disabled_reason {
            surface.notify(&Notice::ProctoringUnavailable(reason));
        }

        let mut dispatcher = Dispatcher {
            controller,
            monitor,
            surface,
            low_time_warning_secs: session_config.low_time_warning_secs,
            visible: true,
        };

        let outcome = dispatcher
            .run(session_config.tick_interval, events_rx, &mut commands)
            .await;

        log_session_end(exam_id, &outcome);
        if let Some(callback) = on_leave {
            callback(&outcome);
        }
        Ok(outcome)
    }
}

/// 主控循环持有的会话状态
struct Dispatcher {
    controller: ExamSessionController,
    monitor: Option<ProctoringMonitor>,
    surface: Box<dyn PresentationSurface>,
    low_time_warning_secs: u64,
    visible: bool,
}

async fn next_event(
    rx: &mut Option<mpsc::UnboundedReceiver<StampedEvent>>,
) -> Option<StampedEvent> {
    match rx.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl Dispatcher {
    fn exam_id(&self) -> String {
        self.controller.exam().id.clone()
    }

    async fn run(
        &mut self,
        tick_interval: std::time::Duration,
        mut events_rx: Option<mpsc::UnboundedReceiver<StampedEvent>>,
        commands: &mut mpsc::Receiver<SessionCommand>,
    ) -> SessionOutcome {
        self.begin();

        if self.controller.status() == SessionStatus::TimeExpired {
            self.surface.notify(&Notice::TimeUp);
            if let Some(outcome) = self.submit().await {
                self.teardown().await;
                return outcome;
            }
        }

        let mut timer = interval_at(Instant::now() + tick_interval, tick_interval);
        let poll_interval = self
            .monitor
            .as_ref()
            .map(|m| m.compliance_poll_interval())
            .unwrap_or(tick_interval);
        let mut compliance = interval_at(Instant::now() + poll_interval, poll_interval);

        let outcome = loop {
            let proctored = self.monitor.is_some();
            let step = tokio::select! {
                _ = timer.tick() => self.on_tick().await,
                _ = compliance.tick(), if proctored => {
                    if let Some(monitor) = self.monitor.as_mut() {
                        monitor.poll_compliance();
                    }
                    None
                }
                Some(event) = next_event(&mut events_rx) => self.on_event(event).await,
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => self.on_close().await,
                },
            };
            if let Some(outcome) = step {
                break outcome;
            }
        };

        self.teardown().await;
        outcome
    }

    fn begin(&mut self) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.start();
            if let Some(reason) = monitor.unavailable_reason() {
                self.surface
                    .notify(&Notice::ProctoringUnavailable(reason.to_string()));
            }
            self.surface.show_proctoring(&monitor.snapshot());
        }
        self.surface.show_question(&self.controller.current_view());
        self.surface.show_countdown(&countdown_view(
            self.controller.remaining_secs(),
            self.low_time_warning_secs,
        ));
    }

    async fn on_tick(&mut self) -> Option<SessionOutcome> {
        match self.controller.tick() {
            Ok(TickOutcome::Running { remaining_secs }) => {
                self.surface
                    .show_countdown(&countdown_view(remaining_secs, self.low_time_warning_secs));
                None
            }
            Ok(TickOutcome::Expired) => {
                self.surface
                    .show_countdown(&countdown_view(0, self.low_time_warning_secs));
                self.surface.notify(&Notice::TimeUp);
                self.submit().await
            }
            Err(e) => {
                debug!("[考试 {}] 忽略计时: {}", self.exam_id(), e);
                None
            }
        }
    }

    async fn on_event(&mut self, event: StampedEvent) -> Option<SessionOutcome> {
        let monitor = self.monitor.as_mut()?;
        let action = monitor.apply_stamped(event, Instant::now()).await;
        self.surface.show_proctoring(&monitor.snapshot());

        match action {
            MonitorAction::Updated => None,
            MonitorAction::Violation { reason, count, max } => {
                self.surface
                    .notify(&Notice::Violation { reason, count, max });
                None
            }
            MonitorAction::Terminate { count } => {
                info!("[考试 {}] 违规 {} 次，强制结束考试", self.exam_id(), count);
                self.terminate(REASON_MAX_VIOLATIONS).await
            }
        }
    }

    async fn on_command(&mut self, command: SessionCommand) -> Option<SessionOutcome> {
        debug!("[考试 {}] 指令: {:?}", self.exam_id(), command);
        let result = match command {
            SessionCommand::Next => self.controller.next().map(|_| ()),
            SessionCommand::Previous => self.controller.previous().map(|_| ()),
            SessionCommand::Select { slot } => self.controller.select_current(slot),
            SessionCommand::Submit => return self.submit().await,
            SessionCommand::Hidden => {
                self.on_hidden().await;
                return None;
            }
            SessionCommand::Shown => {
                self.on_shown();
                return None;
            }
            SessionCommand::Close => return self.on_close().await,
        };

        match result {
            Ok(()) => self.surface.show_question(&self.controller.current_view()),
            Err(e) => self.surface.notify(&Notice::Warning(e.to_string())),
        }
        None
    }

    async fn on_hidden(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        if let Some(monitor) = self.monitor.as_mut() {
            info!("[考试 {}] 界面被隐藏，暂停监考", self.controller.exam().id);
            monitor.release().await;
        }
    }

    fn on_shown(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        if self.controller.status() != SessionStatus::Running {
            return;
        }
        if let Some(monitor) = self.monitor.as_mut() {
            info!("[考试 {}] 界面重新显示，恢复监考", self.controller.exam().id);
            monitor.start();
            self.surface.show_proctoring(&monitor.snapshot());
        }
    }

    async fn on_close(&mut self) -> Option<SessionOutcome> {
        match self.controller.status() {
            SessionStatus::Running | SessionStatus::TimeExpired => {
                self.terminate(REASON_SESSION_CLOSED).await
            }
            status => Some(SessionOutcome::Abandoned { status }),
        }
    }

    /// 提交前清理
    async fn before_submit(&mut self) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.release().await;
        }
    }

    /// 提交：先清理，再提交
    async fn submit(&mut self) -> Option<SessionOutcome> {
        self.before_submit().await;

        match self.controller.submit().await {
            Ok(Some(report)) => {
                let partial_failure = report.partial_failure().map(|e| e.to_string());
                if let Some(message) = &partial_failure {
                    self.surface.notify(&Notice::Warning(message.clone()));
                }
                self.surface.notify(&Notice::Submitted {
                    score: report.score,
                    correct: report.correct,
                    total: report.total,
                });
                Some(SessionOutcome::Submitted {
                    score: report.score,
                    correct: report.correct,
                    total: report.total,
                    partial_failure,
                })
            }
            Ok(None) => None,
            Err(e @ SessionError::ResultNotSaved(_)) => {
                self.surface.notify(&Notice::SubmissionFailed(e.to_string()));
                None
            }
            Err(e) => {
                self.surface.notify(&Notice::Warning(e.to_string()));
                None
            }
        }
    }

    async fn terminate(&mut self, reason: &str) -> Option<SessionOutcome> {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.release().await;
        }

        match self.controller.terminate(reason) {
            Ok(true) => {
                self.surface.notify(&Notice::Terminated {
                    reason: reason.to_string(),
                });
                Some(SessionOutcome::Terminated {
                    reason: reason.to_string(),
                })
            }
            Ok(false) => None,
            Err(e) => {
                warn!("[考试 {}] 无法终止: {}", self.exam_id(), e);
                None
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.release().await;
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_session_start(exam_id: &str, student_id: &str, proctored: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 考试会话开始 - 考试 {} | 考生 {}", exam_id, student_id);
    info!("🎥 监考模式: {}", if proctored { "开启" } else { "关闭" });
    info!("{}", "=".repeat(60));
}

fn log_session_end(exam_id: &str, outcome: &SessionOutcome) {
    info!("\n{}", "=".repeat(60));
    match outcome {
        SessionOutcome::Submitted {
            score,
            correct,
            total,
            ..
        } => info!(
            "📊 考试 {} 已提交: 得分 {}% (正确 {}/{})",
            exam_id, score, correct, total
        ),
        SessionOutcome::Terminated { reason } => {
            info!("⛔ 考试 {} 已终止: {}", exam_id, reason)
        }
        SessionOutcome::Abandoned { status } => {
            info!("❌ 考试 {} 未完成提交 (状态: {})", exam_id, status)
        }
    }
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}
