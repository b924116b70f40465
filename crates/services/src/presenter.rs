use ivideo_core::model::ViewerIdError;

/// The presentation layer: renders questions and viewer-facing notices.
///
/// Viewer input comes back separately as `ViewerAction`s.
pub trait Presenter: Send {
    fn render_question(&mut self, prompt: &str, options: &[String]);
    fn clear_question(&mut self);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn show_upload_progress(&mut self, percent: u8);
    /// Non-fatal problem the viewer should know about (e.g. a failed upload).
    fn show_warning(&mut self, message: &str);
    fn show_identifier_error(&mut self, error: &ViewerIdError);
}
