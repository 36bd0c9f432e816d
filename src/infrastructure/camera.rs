//! 摄像头与视线检测接口 - 基础设施层
//!
//! 设备句柄由后台线程独占，`Drop` 即释放

use std::sync::Arc;
use std::time::Duration;

use crate::error::CaptureError;
use crate::models::GazeReading;

/// 一帧画面
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// 已打开的摄像头设备，drop 时必须释放底层资源
pub trait CameraDevice: Send {
    /// 读取一帧，阻塞时间不超过 `timeout`
    fn capture(&mut self, timeout: Duration) -> Result<Frame, CaptureError>;
}

/// 摄像头来源，每次会话打开一次设备
pub trait CameraSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn CameraDevice>, CaptureError>;
}

/// 视线检测器
///
/// 内部算法不在本 crate 范围内；`is_timeout` 由检测器自己计时
pub trait GazeDetector: Send + Sync {
    fn classify(&self, frame: &Frame) -> GazeReading;
}

/// 视线检测能力，在构造监考组件时注入
#[derive(Clone)]
pub enum DetectorCapability {
    Present {
        detector: Arc<dyn GazeDetector>,
        camera: Arc<dyn CameraSource>,
    },
    Absent {
        reason: String,
    },
}

impl DetectorCapability {
    pub fn present(detector: Arc<dyn GazeDetector>, camera: Arc<dyn CameraSource>) -> Self {
        DetectorCapability::Present { detector, camera }
    }

    pub fn absent(reason: impl Into<String>) -> Self {
        DetectorCapability::Absent {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Debug for DetectorCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorCapability::Present { .. } => f.write_str("Present"),
            DetectorCapability::Absent { reason } => write!(f, "Absent({})", reason),
        }
    }
}
