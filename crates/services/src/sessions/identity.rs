use ivideo_core::model::ViewerId;
use tracing::{debug, warn};

use crate::presenter::Presenter;

/// Validate a viewer identifier typed into the start form.
///
/// An invalid entry is shown to the viewer and `None` is returned; the
/// caller keeps asking until this yields an id.
pub fn capture_viewer(raw: &str, presenter: &mut dyn Presenter) -> Option<ViewerId> {
    match ViewerId::parse(raw) {
        Ok(viewer) => {
            debug!(kind = ?viewer.kind(), "viewer identified");
            Some(viewer)
        }
        Err(err) => {
            warn!(error = %err, "viewer identifier rejected");
            presenter.show_identifier_error(&err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{PresenterEvent, RecordingPresenter};
    use ivideo_core::model::{ViewerIdError, ViewerIdKind};

    #[test]
    fn accepts_phone_and_email() {
        let mut presenter = RecordingPresenter::new();
        let phone = capture_viewer("9876543210", &mut presenter).unwrap();
        assert_eq!(phone.kind(), ViewerIdKind::Phone);
        let email = capture_viewer(" student@example.org ", &mut presenter).unwrap();
        assert_eq!(email.as_str(), "student@example.org");
        assert!(presenter.events().is_empty());
    }

    #[test]
    fn rejected_identifier_is_shown_to_viewer() {
        let mut presenter = RecordingPresenter::new();
        assert!(capture_viewer("12345", &mut presenter).is_none());
        assert!(capture_viewer("student@example", &mut presenter).is_none());
        assert_eq!(
            presenter.events(),
            vec![
                PresenterEvent::IdentifierError(ViewerIdError::InvalidPhone { digits: 5 }),
                PresenterEvent::IdentifierError(ViewerIdError::InvalidEmail),
            ]
        );
    }
}
