//! 测试用的协作方替身
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use exam_proctor::error::{CaptureError, RepositoryError};
use exam_proctor::infrastructure::{
    CameraDevice, CameraSource, CountdownView, ExamRepository, Frame, GazeDetector, Notice,
    PresentationSurface, QuestionView, WindowChrome,
};
use exam_proctor::models::{
    AnswerKey, AnswerRecord, ExamMeta, ExamStatus, GazeReading, ProctoringState, Question,
    ResultRecord,
};

// ========== 题库 ==========

#[derive(Default)]
pub struct RepoState {
    pub meta: Option<ExamMeta>,
    pub questions: Vec<Question>,
    pub keys: HashMap<String, AnswerKey>,
    pub already_attempted: bool,
    pub failing_answer_saves: HashSet<String>,
    pub failing_result_saves: usize,
    pub answer_key_calls: Vec<String>,
    pub saved_answers: Vec<AnswerRecord>,
    pub saved_results: Vec<ResultRecord>,
}

#[derive(Default)]
pub struct FakeRepository {
    pub state: Mutex<RepoState>,
}

impl FakeRepository {
    /// 4 道题，正确答案分别是各题的 A、B、C、D
    pub fn four_questions(duration_raw: u64) -> Arc<Self> {
        let repo = FakeRepository::default();
        {
            let mut state = repo.state.lock().unwrap();
            state.meta = Some(exam_meta(duration_raw));
            for i in 0..4u8 {
                let id = format!("q{}", i + 1);
                let options = ["w", "x", "y", "z"].map(|o| Some(format!("{}{}", o, i + 1)));
                state.questions.push(Question::from_slots(
                    id.clone(),
                    format!("题目 {}", i + 1),
                    options.clone(),
                ));
                state.keys.insert(
                    id.clone(),
                    AnswerKey {
                        question_id: id,
                        correct_answer: options[i as usize].clone().unwrap(),
                        options,
                    },
                );
            }
        }
        Arc::new(repo)
    }

    pub fn saved_answers(&self) -> Vec<AnswerRecord> {
        self.state.lock().unwrap().saved_answers.clone()
    }

    pub fn saved_results(&self) -> Vec<ResultRecord> {
        self.state.lock().unwrap().saved_results.clone()
    }

    pub fn answer_key_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().answer_key_calls.clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.state.lock().unwrap().questions.clone()
    }

    pub fn meta(&self) -> ExamMeta {
        self.state.lock().unwrap().meta.clone().unwrap()
    }
}

pub fn exam_meta(duration_raw: u64) -> ExamMeta {
    ExamMeta {
        id: "exam-1".into(),
        name: "期中测验".into(),
        duration_raw,
        start_time: None,
        end_time: None,
        status: ExamStatus::Active,
    }
}

#[async_trait]
impl ExamRepository for FakeRepository {
    async fn get_exam_meta(&self, exam_id: &str) -> Result<ExamMeta, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .meta
            .clone()
            .filter(|m| m.id == exam_id)
            .ok_or_else(|| RepositoryError::NotFound {
                what: exam_id.to_string(),
            })
    }

    async fn list_questions(&self, _exam_id: &str) -> Result<Vec<Question>, RepositoryError> {
        Ok(self.state.lock().unwrap().questions.clone())
    }

    async fn get_answer_key(&self, question_id: &str) -> Result<AnswerKey, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.answer_key_calls.push(question_id.to_string());
        state
            .keys
            .get(question_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                what: question_id.to_string(),
            })
    }

    async fn save_answer(&self, record: &AnswerRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_answer_saves.contains(&record.question_id) {
            return Err(RepositoryError::Transport("connection reset".into()));
        }
        state.saved_answers.push(record.clone());
        Ok(())
    }

    async fn save_result(&self, record: &ResultRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_result_saves > 0 {
            state.failing_result_saves -= 1;
            return Err(RepositoryError::BadResponse {
                endpoint: "exam_results".into(),
                status: 503,
            });
        }
        state.saved_results.push(record.clone());
        Ok(())
    }

    async fn has_result(&self, _exam_id: &str, _student_id: &str) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().unwrap().already_attempted)
    }
}

// ========== 摄像头 ==========

#[derive(Default)]
pub struct CameraStats {
    pub open_handles: AtomicUsize,
    pub total_opens: AtomicUsize,
    pub open_attempts: AtomicUsize,
    pub captures: AtomicUsize,
}

pub struct FakeCamera {
    pub stats: Arc<CameraStats>,
    pub capture_delay: Duration,
    pub available: AtomicBool,
}

impl FakeCamera {
    pub fn new(capture_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(CameraStats::default()),
            capture_delay,
            available: AtomicBool::new(true),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        let camera = Self::new(Duration::from_millis(1));
        camera.available.store(false, Ordering::SeqCst);
        camera
    }

    pub fn open_handles(&self) -> usize {
        self.stats.open_handles.load(Ordering::SeqCst)
    }

    pub fn total_opens(&self) -> usize {
        self.stats.total_opens.load(Ordering::SeqCst)
    }
}

struct FakeDevice {
    stats: Arc<CameraStats>,
    delay: Duration,
}

impl CameraDevice for FakeDevice {
    fn capture(&mut self, timeout: Duration) -> Result<Frame, CaptureError> {
        std::thread::sleep(self.delay.min(timeout));
        self.stats.captures.fetch_add(1, Ordering::SeqCst);
        Ok(Frame {
            width: 2,
            height: 2,
            data: vec![0; 12],
        })
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.stats.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CameraSource for FakeCamera {
    fn open(&self) -> Result<Box<dyn CameraDevice>, CaptureError> {
        self.stats.open_attempts.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(CaptureError::Unavailable("no device".into()));
        }
        self.stats.open_handles.fetch_add(1, Ordering::SeqCst);
        self.stats.total_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDevice {
            stats: self.stats.clone(),
            delay: self.capture_delay,
        }))
    }
}

// ========== 视线检测 ==========

pub struct ScriptedDetector {
    pub reading: Mutex<GazeReading>,
}

impl ScriptedDetector {
    pub fn facing() -> Arc<Self> {
        Arc::new(Self {
            reading: Mutex::new(reading("Facing camera", true, false)),
        })
    }

    pub fn looking_away_too_long() -> Arc<Self> {
        Arc::new(Self {
            reading: Mutex::new(reading("Not facing camera", false, true)),
        })
    }
}

pub fn reading(status: &str, facing: bool, timeout: bool) -> GazeReading {
    GazeReading {
        status: status.to_string(),
        is_camera_clear: true,
        is_face_detected: true,
        is_facing_camera: facing,
        is_timeout: timeout,
    }
}

impl GazeDetector for ScriptedDetector {
    fn classify(&self, _frame: &Frame) -> GazeReading {
        self.reading.lock().unwrap().clone()
    }
}

// ========== 窗口 ==========

#[derive(Default)]
pub struct FakeWindow {
    pub fullscreen: AtomicBool,
    pub enter_calls: AtomicUsize,
    pub exit_calls: AtomicUsize,
}

impl FakeWindow {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 模拟考生按 Esc 退出全屏
    pub fn user_leaves_fullscreen(&self) {
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    pub fn enter_calls(&self) -> usize {
        self.enter_calls.load(Ordering::SeqCst)
    }

    pub fn exit_calls(&self) -> usize {
        self.exit_calls.load(Ordering::SeqCst)
    }
}

impl WindowChrome for FakeWindow {
    fn enter_fullscreen(&self) {
        self.enter_calls.fetch_add(1, Ordering::SeqCst);
        self.fullscreen.store(true, Ordering::SeqCst);
    }

    fn exit_fullscreen(&self) {
        self.exit_calls.fetch_add(1, Ordering::SeqCst);
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}

// ========== 展示界面 ==========

#[derive(Default)]
pub struct SurfaceLog {
    pub questions: Vec<QuestionView>,
    pub countdowns: Vec<CountdownView>,
    pub proctoring: Vec<ProctoringState>,
    pub notices: Vec<Notice>,
}

#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn notices(&self) -> Vec<Notice> {
        self.log.lock().unwrap().notices.clone()
    }

    pub fn last_question(&self) -> Option<QuestionView> {
        self.log.lock().unwrap().questions.last().cloned()
    }
}

impl PresentationSurface for RecordingSurface {
    fn show_question(&mut self, view: &QuestionView) {
        self.log.lock().unwrap().questions.push(view.clone());
    }

    fn show_countdown(&mut self, view: &CountdownView) {
        self.log.lock().unwrap().countdowns.push(view.clone());
    }

    fn show_proctoring(&mut self, state: &ProctoringState) {
        self.log.lock().unwrap().proctoring.push(state.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.log.lock().unwrap().notices.push(notice.clone());
    }
}
