use std::collections::VecDeque;
use std::time::Duration;

use services::SessionHandle;
use services::sim::{PresenterEvent, SimulatedPlayer};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

/// How the scripted viewer answers one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedAnswer {
    Dismiss,
    /// 1-based position in the rendered options.
    Position(usize),
    Text(String),
}

impl ScriptedAnswer {
    /// Parse a comma-separated script such as `o2,skip,3`.
    ///
    /// `skip`, `-` and empty entries dismiss the question.
    pub fn parse_script(raw: &str) -> VecDeque<Self> {
        if raw.trim().is_empty() {
            return VecDeque::new();
        }
        raw.split(',').map(Self::parse).collect()
    }

    fn parse(entry: &str) -> Self {
        let entry = entry.trim();
        if entry.is_empty() || entry == "-" || entry.eq_ignore_ascii_case("skip") {
            return Self::Dismiss;
        }
        match entry.parse::<usize>() {
            Ok(position) if position > 0 => Self::Position(position),
            _ => Self::Text(entry.to_string()),
        }
    }

    fn pick<'a>(&self, options: &'a [String]) -> Option<&'a str> {
        match self {
            Self::Dismiss => None,
            Self::Position(position) => options.get(position - 1).map(String::as_str),
            Self::Text(text) => options.iter().find(|o| *o == text).map(String::as_str),
        }
    }
}

/// Plays the viewer's part: answers questions from a script and leaves
/// when the video ends.
pub struct ScriptedViewer {
    script: VecDeque<ScriptedAnswer>,
    handle: SessionHandle,
    player: SimulatedPlayer,
}

impl ScriptedViewer {
    pub fn new(
        script: VecDeque<ScriptedAnswer>,
        handle: SessionHandle,
        player: SimulatedPlayer,
    ) -> Self {
        Self {
            script,
            handle,
            player,
        }
    }

    pub async fn run(mut self, mut events: UnboundedReceiver<PresenterEvent>) {
        let mut watch = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(PresenterEvent::Question { prompt, options }) => {
                        self.answer(&prompt, &options);
                    }
                    Some(PresenterEvent::UploadProgress(percent)) => {
                        debug!(percent, "upload progress");
                    }
                    Some(PresenterEvent::Warning(message)) => println!("  ! {message}"),
                    Some(_) => {}
                    None => break,
                },
                _ = watch.tick() => {
                    if self.handle.is_closed() {
                        break;
                    }
                    if self.player.is_finished() {
                        println!("video finished");
                        self.handle.leave();
                        break;
                    }
                }
            }
        }
    }

    fn answer(&mut self, prompt: &str, options: &[String]) {
        println!("? {prompt}");
        for (position, option) in options.iter().enumerate() {
            println!("    {}. {option}", position + 1);
        }

        let entry = self.script.pop_front().unwrap_or(ScriptedAnswer::Dismiss);
        match entry.pick(options) {
            Some(option) => {
                println!("  > {option}");
                self.handle.select(option);
                self.handle.submit();
            }
            None => {
                if entry != ScriptedAnswer::Dismiss {
                    warn!(?entry, "scripted answer matches no option; dismissing");
                }
                println!("  > (dismissed)");
                self.handle.dismiss();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["op1".into(), "op2".into(), "op3".into()]
    }

    #[test]
    fn parses_mixed_script() {
        let script = ScriptedAnswer::parse_script("o2, skip,,3,-");
        assert_eq!(
            script,
            VecDeque::from(vec![
                ScriptedAnswer::Text("o2".into()),
                ScriptedAnswer::Dismiss,
                ScriptedAnswer::Dismiss,
                ScriptedAnswer::Position(3),
                ScriptedAnswer::Dismiss,
            ])
        );
        assert!(ScriptedAnswer::parse_script("  ").is_empty());
    }

    #[test]
    fn picks_by_text_or_position() {
        let options = options();
        assert_eq!(ScriptedAnswer::Position(2).pick(&options), Some("op2"));
        assert_eq!(ScriptedAnswer::Text("op3".into()).pick(&options), Some("op3"));
        assert_eq!(ScriptedAnswer::Position(4).pick(&options), None);
        assert_eq!(ScriptedAnswer::Text("nope".into()).pick(&options), None);
        assert_eq!(ScriptedAnswer::parse("0"), ScriptedAnswer::Text("0".into()));
    }
}
