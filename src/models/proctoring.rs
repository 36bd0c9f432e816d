use std::fmt;
use tokio::time::Instant;

/// 摄像头状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraStatus {
    Unavailable,
    Error,
    Active,
}

/// 视线判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeClassification {
    Unknown,
    CameraNotClear,
    FaceNotDetected,
    FacingAway,
    FacingCamera,
}

/// 视线检测器对单帧的输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazeReading {
    pub status: String,
    pub is_camera_clear: bool,
    pub is_face_detected: bool,
    pub is_facing_camera: bool,
    /// 持续移开视线超过检测器的超时时间
    pub is_timeout: bool,
}

impl GazeReading {
    /// 优先级：画面不清 > 未检测到人脸 > 正视 > 移开视线
    pub fn classification(&self) -> GazeClassification {
        if !self.is_camera_clear {
            GazeClassification::CameraNotClear
        } else if !self.is_face_detected {
            GazeClassification::FaceNotDetected
        } else if self.is_facing_camera {
            GazeClassification::FacingCamera
        } else {
            GazeClassification::FacingAway
        }
    }
}

/// 违规原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    ExitedFullscreen,
    LookingAway,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::ExitedFullscreen => write!(f, "exited fullscreen"),
            ViolationReason::LookingAway => write!(f, "looking away for too long"),
        }
    }
}

/// 从后台线程和全屏检查发往主控线程的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProctoringEvent {
    Gaze(GazeReading),
    CameraUnavailable(String),
    CameraError(String),
    Violation(ViolationReason),
}

/// 通道中的事件，带产生它的那次启动的代次
///
/// 每次启动监考代次加一，上一次启动遗留在通道里的事件会被丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedEvent {
    pub generation: u64,
    pub event: ProctoringEvent,
}

/// 监考状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProctoringState {
    pub camera: CameraStatus,
    pub gaze: GazeClassification,
    pub status_text: String,
    pub violation_count: u32,
    pub max_violations: u32,
    pub last_violation_at: Option<Instant>,
}

impl ProctoringState {
    pub fn new(max_violations: u32) -> Self {
        Self {
            camera: CameraStatus::Unavailable,
            gaze: GazeClassification::Unknown,
            status_text: "正在检查视线状态...".to_string(),
            violation_count: 0,
            max_violations,
            last_violation_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(clear: bool, face: bool, facing: bool) -> GazeReading {
        GazeReading {
            status: String::new(),
            is_camera_clear: clear,
            is_face_detected: face,
            is_facing_camera: facing,
            is_timeout: false,
        }
    }

    #[test]
    fn classification_follows_precedence() {
        assert_eq!(
            reading(false, true, true).classification(),
            GazeClassification::CameraNotClear
        );
        assert_eq!(
            reading(true, false, true).classification(),
            GazeClassification::FaceNotDetected
        );
        assert_eq!(
            reading(true, true, true).classification(),
            GazeClassification::FacingCamera
        );
        assert_eq!(
            reading(true, true, false).classification(),
            GazeClassification::FacingAway
        );
    }
}
