//! 命令行客户端 - 编排层入口
//!
//! 负责组装题库客户端、终端界面和监考能力，然后运行一次考试会话

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use crate::clients::SupabaseRepository;
use crate::config::Config;
use crate::infrastructure::terminal::spawn_stdin_commands;
use crate::infrastructure::{DetectorCapability, TerminalSurface, TerminalWindow};
use crate::orchestrator::session_orchestrator::{
    ProctoringSetup, SessionOrchestrator, SessionOutcome,
};

/// 应用主结构
pub struct App {
    config: Config,
    exam_id: String,
    student_id: String,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, exam_id: String, student_id: String) -> Self {
        log_startup(&config);
        Self {
            config,
            exam_id,
            student_id,
        }
    }

    /// 运行一次考试会话
    pub async fn run(&self) -> Result<SessionOutcome> {
        let repository = Arc::new(SupabaseRepository::new(&self.config));

        let (tx, rx) = mpsc::channel(32);
        let _stdin = spawn_stdin_commands(tx);
        info!("💡 指令: n 下一题 | p 上一题 | a-d 作答 | s 提交 | q 退出");

        let mut orchestrator = SessionOrchestrator::new(
            self.config.session(),
            self.config.proctoring(),
            repository,
            Box::new(TerminalSurface::new()),
        )
        .on_leave(|outcome| info!("↩️ 返回考生主页 ({:?})", outcome));

        if self.config.proctoring_enabled {
            // 终端客户端没有视线检测后端，只进行全屏检查
            orchestrator = orchestrator.with_proctoring(ProctoringSetup {
                capability: DetectorCapability::absent("终端客户端未集成视线检测"),
                window: Arc::new(TerminalWindow::new()),
            });
        }

        orchestrator
            .run(&self.exam_id, &self.student_id, rx)
            .await
            .with_context(|| format!("考试 {} 运行失败", self.exam_id))
    }
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 考试客户端");
    info!("🌐 题库地址: {}", config.repository_base_url);
    info!(
        "🎥 监考: {} | 违规上限: {} | 冷却: {} 秒",
        if config.proctoring_enabled { "开启" } else { "关闭" },
        config.max_violations,
        config.violation_cooldown_secs
    );
    info!("{}", "=".repeat(60));
}
