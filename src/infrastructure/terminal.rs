//! 终端适配器
//!
//! 命令行客户端使用的展示界面、窗口和指令读取

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::infrastructure::presentation::{
    CountdownView, Notice, PresentationSurface, QuestionView, SessionCommand,
};
use crate::infrastructure::window::WindowChrome;
use crate::models::ProctoringState;

/// 通过日志输出的展示界面
#[derive(Debug, Default)]
pub struct TerminalSurface {
    last_countdown: Option<String>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationSurface for TerminalSurface {
    fn show_question(&mut self, view: &QuestionView) {
        info!("{}", "─".repeat(60));
        info!("第 {} 题 / 共 {} 题", view.number, view.total);
        info!("{}", view.prompt);
        for option in &view.options {
            let mark = if view.selected == Some(option.slot) {
                "●"
            } else {
                "○"
            };
            info!("  {} {}. {}", mark, option.label(), option.text);
        }
        info!("{}", "─".repeat(60));
    }

    fn show_countdown(&mut self, view: &CountdownView) {
        // 每分钟或时间不足时才输出，避免刷屏
        let minute_mark = view.remaining_secs % 60 == 0;
        if (minute_mark || view.is_low) && self.last_countdown.as_deref() != Some(&view.text) {
            if view.is_low {
                warn!("⏰ 剩余时间: {}", view.text);
            } else {
                info!("⏰ 剩余时间: {}", view.text);
            }
            self.last_countdown = Some(view.text.clone());
        }
    }

    fn show_proctoring(&mut self, state: &ProctoringState) {
        info!(
            "🎥 {:?} | {} | 违规: {}/{}",
            state.camera, state.status_text, state.violation_count, state.max_violations
        );
    }

    fn notify(&mut self, notice: &Notice) {
        match notice {
            Notice::Warning(msg) => warn!("⚠️ {}", msg),
            Notice::ProctoringUnavailable(reason) => {
                warn!("⚠️ 监考系统不可用: {}，考试将在无监考模式下继续", reason)
            }
            Notice::Violation { reason, count, max } => {
                warn!("🚨 监考违规: {} (第 {}/{} 次)", reason, count, max)
            }
            Notice::TimeUp => warn!("⏰ 时间到！考试将自动提交"),
            Notice::Terminated { reason } => warn!("⛔ 考试已被终止: {}", reason),
            Notice::Submitted {
                score,
                correct,
                total,
            } => info!("✅ 提交成功！得分: {}% (正确 {}/{})", score, correct, total),
            Notice::SubmissionFailed(msg) => warn!("❌ 提交失败: {}", msg),
        }
    }
}

/// 终端没有真实的全屏，只记录期望状态
#[derive(Debug, Default)]
pub struct TerminalWindow {
    fullscreen: AtomicBool,
}

impl TerminalWindow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowChrome for TerminalWindow {
    fn enter_fullscreen(&self) {
        self.fullscreen.store(true, Ordering::SeqCst);
    }

    fn exit_fullscreen(&self) {
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}

/// 解析一行终端输入
///
/// `n` 下一题，`p` 上一题，`a`-`d` 选择，`s` 提交，`hide`/`show` 切换可见性，`q` 退出
pub fn parse_command(line: &str) -> Option<SessionCommand> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "n" | "next" => Some(SessionCommand::Next),
        "p" | "prev" => Some(SessionCommand::Previous),
        "s" | "submit" => Some(SessionCommand::Submit),
        "hide" => Some(SessionCommand::Hidden),
        "show" => Some(SessionCommand::Shown),
        "q" | "quit" => Some(SessionCommand::Close),
        "a" | "b" | "c" | "d" => {
            let slot = line.as_bytes()[0] - b'a';
            Some(SessionCommand::Select { slot })
        }
        _ => None,
    }
}

/// 在后台读取标准输入并转换为指令
pub fn spawn_stdin_commands(tx: mpsc::Sender<SessionCommand>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => warn!("无法识别的指令: {}", line.trim()),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command(" N "), Some(SessionCommand::Next));
        assert_eq!(parse_command("c"), Some(SessionCommand::Select { slot: 2 }));
        assert_eq!(parse_command("submit"), Some(SessionCommand::Submit));
        assert_eq!(parse_command("e"), None);
    }

    #[test]
    fn terminal_window_tracks_state() {
        let window = TerminalWindow::new();
        assert!(!window.is_fullscreen());
        window.enter_fullscreen();
        assert!(window.is_fullscreen());
        window.exit_fullscreen();
        assert!(!window.is_fullscreen());
    }
}
