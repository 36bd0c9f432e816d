/// 宿主窗口的全屏控制
pub trait WindowChrome: Send + Sync {
    fn enter_fullscreen(&self);
    fn exit_fullscreen(&self);
    fn is_fullscreen(&self) -> bool;
}
