//! 监考流程 - 流程层
//!
//! 核心职责：
//! - 在后台线程上循环采集摄像头画面并交给视线检测器
//! - 定期检查全屏状态
//! - 在主控线程上按顺序应用事件，更新监考状态并判定违规
//!
//! 后台线程只通过事件通道与主控线程通信，从不直接修改任何状态

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ProctoringConfig;
use crate::error::CaptureError;
use crate::infrastructure::{
    CameraDevice, CameraSource, DetectorCapability, GazeDetector, WindowChrome,
};
use crate::models::{
    CameraStatus, GazeClassification, ProctoringEvent, ProctoringState, StampedEvent,
    ViolationReason,
};
use crate::services::ViolationPolicy;

/// 事件应用后主控线程需要做的事
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// 只需刷新监考状态显示
    Updated,
    /// 计入一次违规，未达到上限
    Violation {
        reason: ViolationReason,
        count: u32,
        max: u32,
    },
    /// 达到违规上限，监考已自行停止，需要终止考试
    Terminate { count: u32 },
}

/// 后台采集线程句柄
struct CameraWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// 监考组件
pub struct ProctoringMonitor {
    exam_id: String,
    config: ProctoringConfig,
    capability: DetectorCapability,
    window: Arc<dyn WindowChrome>,
    policy: ViolationPolicy,
    state: ProctoringState,
    events_tx: mpsc::UnboundedSender<StampedEvent>,
    worker: Option<CameraWorker>,
    running: bool,
    /// 启动代次，每次 `start` 加一
    generation: u64,
    /// 期望处于全屏（由本组件进入的全屏）
    wants_fullscreen: bool,
}

impl ProctoringMonitor {
    /// 创建监考组件，返回事件接收端（由主控线程唯一消费）
    pub fn new(
        exam_id: impl Into<String>,
        config: ProctoringConfig,
        capability: DetectorCapability,
        window: Arc<dyn WindowChrome>,
    ) -> (Self, mpsc::UnboundedReceiver<StampedEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let monitor = Self {
            exam_id: exam_id.into(),
            policy: ViolationPolicy::from_config(&config),
            state: ProctoringState::new(config.max_violations),
            config,
            capability,
            window,
            events_tx,
            worker: None,
            running: false,
            generation: 0,
            wants_fullscreen: false,
        };
        (monitor, events_rx)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_camera_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// 当前监考状态快照
    pub fn snapshot(&self) -> ProctoringState {
        self.state.clone()
    }

    pub fn compliance_poll_interval(&self) -> Duration {
        self.config.compliance_poll_interval
    }

    /// 视线检测不可用的原因
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.capability {
            DetectorCapability::Absent { reason } => Some(reason),
            DetectorCapability::Present { .. } => None,
        }
    }

    /// 进入全屏并启动采集线程，已启动时不做任何事
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.generation += 1;
        self.enter_fullscreen();

        if let DetectorCapability::Present { detector, camera } = &self.capability {
            let stop = Arc::new(AtomicBool::new(false));
            let ctx = WorkerContext {
                exam_id: self.exam_id.clone(),
                camera: camera.clone(),
                detector: detector.clone(),
                stop: stop.clone(),
                generation: self.generation,
                events_tx: self.events_tx.clone(),
                sampling_interval: self.config.sampling_interval,
                capture_timeout: self.config.capture_timeout,
            };
            let handle = tokio::task::spawn_blocking(move || ctx.run());
            self.worker = Some(CameraWorker { stop, handle });
        }

        info!(
            "[考试 {}] 🎥 监考已启动 (视线检测: {})",
            self.exam_id,
            if self.worker.is_some() { "开启" } else { "不可用" }
        );
    }

    /// 通知采集线程退出并等待（有上限），可重复调用
    pub async fn stop(&mut self) {
        self.running = false;

        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::SeqCst);

        match tokio::time::timeout(self.config.camera_stop_timeout, worker.handle).await {
            Ok(Ok(())) => debug!("[考试 {}] 摄像头线程已退出", self.exam_id),
            Ok(Err(e)) => error!("[考试 {}] 摄像头线程异常退出: {}", self.exam_id, e),
            Err(_) => warn!(
                "[考试 {}] ⚠️ 等待摄像头线程超时，线程将在当前采集结束后自行退出",
                self.exam_id
            ),
        }
        info!("[考试 {}] 🎥 监考已停止", self.exam_id);
    }

    /// 停止监考并退出全屏，可重复调用
    pub async fn release(&mut self) {
        self.stop().await;
        self.exit_fullscreen();
    }

    /// 全屏检查：期望全屏但实际不是时记一次违规并重新进入全屏
    pub fn poll_compliance(&mut self) {
        if !self.running || !self.wants_fullscreen {
            return;
        }
        if !self.window.is_fullscreen() {
            warn!("[考试 {}] ⚠️ 检测到退出全屏", self.exam_id);
            let _ = self.events_tx.send(StampedEvent {
                generation: self.generation,
                event: ProctoringEvent::Violation(ViolationReason::ExitedFullscreen),
            });
            self.window.enter_fullscreen();
        }
    }

    /// 应用通道中的事件，丢弃上一次启动遗留的事件
    pub async fn apply_stamped(&mut self, stamped: StampedEvent, now: Instant) -> MonitorAction {
        if stamped.generation != self.generation {
            debug!(
                "[考试 {}] 丢弃第 {} 次启动遗留的事件: {:?}",
                self.exam_id, stamped.generation, stamped.event
            );
            return MonitorAction::Updated;
        }
        self.apply(stamped.event, now).await
    }

    /// 在主控线程上应用一个事件
    pub async fn apply(&mut self, event: ProctoringEvent, now: Instant) -> MonitorAction {
        if !self.running {
            debug!("[考试 {}] 监考已停止，忽略事件: {:?}", self.exam_id, event);
            return MonitorAction::Updated;
        }

        match event {
            ProctoringEvent::Gaze(reading) => {
                self.state.camera = CameraStatus::Active;
                self.state.gaze = reading.classification();
                self.state.status_text = reading.status.clone();
                if reading.is_timeout {
                    return self.record_violation(ViolationReason::LookingAway, now).await;
                }
                MonitorAction::Updated
            }
            ProctoringEvent::CameraUnavailable(message) => {
                self.state.camera = CameraStatus::Unavailable;
                self.state.gaze = GazeClassification::Unknown;
                self.state.status_text = message;
                MonitorAction::Updated
            }
            ProctoringEvent::CameraError(message) => {
                self.state.camera = CameraStatus::Error;
                self.state.gaze = GazeClassification::Unknown;
                self.state.status_text = message;
                MonitorAction::Updated
            }
            ProctoringEvent::Violation(reason) => self.record_violation(reason, now).await,
        }
    }

    async fn record_violation(&mut self, reason: ViolationReason, now: Instant) -> MonitorAction {
        let decision = self.policy.record(reason, now);
        if !decision.counted {
            return MonitorAction::Updated;
        }

        self.state.violation_count = decision.count;
        self.state.last_violation_at = self.policy.last_counted_at();
        let max = self.policy.max_violations();
        warn!(
            "[考试 {}] 🚨 监考违规: {} ({}/{})",
            self.exam_id, reason, decision.count, max
        );

        if decision.threshold_reached {
            error!("[考试 {}] ⛔ 违规次数达到上限", self.exam_id);
            self.release().await;
            return MonitorAction::Terminate {
                count: decision.count,
            };
        }

        MonitorAction::Violation {
            reason,
            count: decision.count,
            max,
        }
    }

    fn enter_fullscreen(&mut self) {
        if !self.wants_fullscreen {
            self.window.enter_fullscreen();
            self.wants_fullscreen = true;
        }
    }

    fn exit_fullscreen(&mut self) {
        if self.wants_fullscreen {
            self.window.exit_fullscreen();
            self.wants_fullscreen = false;
        }
    }
}

impl Drop for ProctoringMonitor {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            worker.stop.store(true, Ordering::SeqCst);
        }
    }
}

/// 采集线程所需的全部数据，整体移入线程
struct WorkerContext {
    exam_id: String,
    camera: Arc<dyn CameraSource>,
    detector: Arc<dyn GazeDetector>,
    stop: Arc<AtomicBool>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<StampedEvent>,
    sampling_interval: Duration,
    capture_timeout: Duration,
}

impl WorkerContext {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn publish(&self, event: ProctoringEvent) -> bool {
        self.events_tx
            .send(StampedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// 发布故障状态，与上次发布的相同时不重复记录和发布
    fn report_failure(
        &self,
        reported: &mut Option<String>,
        message: String,
        event: fn(String) -> ProctoringEvent,
    ) -> bool {
        if reported.as_deref() == Some(message.as_str()) {
            return true;
        }
        warn!("[考试 {}] ⚠️ {}", self.exam_id, message);
        *reported = Some(message.clone());
        self.publish(event(message))
    }

    /// 采集循环
    ///
    /// 采集失败只在状态变化时发布事件并继续重试，设备在任何退出路径上都会被 drop
    fn run(self) {
        info!("[考试 {}] 摄像头线程启动", self.exam_id);
        let mut device: Option<Box<dyn CameraDevice>> = None;
        let mut reported: Option<String> = None;

        while !self.stopped() {
            if device.is_none() {
                match self.camera.open() {
                    Ok(opened) => {
                        if reported.is_some() {
                            info!("[考试 {}] 📷 摄像头已打开", self.exam_id);
                        }
                        device = Some(opened);
                    }
                    Err(e) => {
                        let sent = self.report_failure(
                            &mut reported,
                            e.to_string(),
                            ProctoringEvent::CameraUnavailable,
                        );
                        if !sent {
                            break;
                        }
                    }
                }
            }

            if let Some(camera) = device.as_mut() {
                match camera.capture(self.capture_timeout) {
                    Ok(frame) => {
                        if self.stopped() {
                            break;
                        }
                        reported = None;
                        let reading = self.detector.classify(&frame);
                        if !self.publish(ProctoringEvent::Gaze(reading)) {
                            break;
                        }
                    }
                    Err(e) => {
                        if matches!(e, CaptureError::Unavailable(_)) {
                            device = None;
                        }
                        let sent = self.report_failure(
                            &mut reported,
                            e.to_string(),
                            ProctoringEvent::CameraError,
                        );
                        if !sent {
                            break;
                        }
                    }
                }
            }

            if self.stopped() {
                break;
            }
            std::thread::sleep(self.sampling_interval);
        }

        drop(device);
        info!("[考试 {}] 摄像头线程退出，设备已释放", self.exam_id);
    }
}
