pub mod camera;
pub mod presentation;
pub mod repository;
pub mod terminal;
pub mod window;

pub use camera::{CameraDevice, CameraSource, DetectorCapability, Frame, GazeDetector};
pub use presentation::{CountdownView, Notice, PresentationSurface, QuestionView, SessionCommand};
pub use repository::ExamRepository;
pub use terminal::{TerminalSurface, TerminalWindow};
pub use window::WindowChrome;
