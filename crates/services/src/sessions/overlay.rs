use tracing::info;

use crate::error::SessionError;

use super::service::OverlaySession;

impl OverlaySession {
    /// Interrupt playback and put question `index` in front of the viewer.
    ///
    /// Submit starts disabled and is enabled by the first selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Overlay` if `index` is not scheduled or a question
    /// is already up; nothing is paused or rendered in that case.
    pub fn on_show(&mut self, index: usize) -> Result<(), SessionError> {
        let question = self.context.show(index)?;
        info!(index, prompt = question.prompt(), "showing question");

        self.player.pause();
        self.player.toggle_controls();
        self.player.exit_fullscreen();
        self.presenter
            .render_question(question.prompt(), question.options());
        self.presenter.set_submit_enabled(false);
        Ok(())
    }

    /// The viewer picked `option` for the question on screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Overlay` if no question is up or `option` was not rendered.
    pub fn select(&mut self, option: &str) -> Result<(), SessionError> {
        self.context.select(option)?;
        self.presenter.set_submit_enabled(true);
        Ok(())
    }

    /// Take the question down and give playback back to the viewer.
    ///
    /// Triggering stays off until playback has moved past the settle window.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Overlay` if no question is up.
    pub fn on_resolve(&mut self) -> Result<(), SessionError> {
        let position = self.player.position();
        let pending = self.context.resolve(position)?;
        info!(index = pending.index(), "question resolved; resuming playback");

        self.presenter.clear_question();
        self.player.play();
        self.player.toggle_controls();
        self.player.enter_fullscreen();
        Ok(())
    }
}
