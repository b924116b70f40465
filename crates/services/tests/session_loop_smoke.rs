use std::sync::Arc;
use std::time::Duration;

use ivideo_core::model::{
    IVideoId, OverlaySettings, QuestionSchedule, QuestionSpec, SubmissionRecord, ViewerId,
};
use ivideo_core::time::{fixed_clock, fixed_now};
use services::sim::{PresenterEvent, RecordingPresenter, SimulatedPlayer};
use services::{PlayerEvent, SessionHandle, SessionLoopService, SessionReport};
use storage::{InMemoryUploadStore, Storage};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const KEY: &str = "answers/Mtr6k7Ugzv_9876543210.json";

fn options(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn schedule() -> QuestionSchedule {
    QuestionSchedule::new(vec![
        QuestionSpec::new(2.0, "q1", options(&["o1", "o2"])),
        QuestionSpec::new(4.0, "q2", options(&["op1", "op2", "op3", "op4"])),
        QuestionSpec::new(6.0, "q3", options(&["opt1", "opt2", "opt3"])),
    ])
    .unwrap()
}

struct Running {
    handle: SessionHandle,
    player: SimulatedPlayer,
    events: UnboundedReceiver<PresenterEvent>,
    task: JoinHandle<Result<SessionReport, services::SessionError>>,
}

async fn start(store: &InMemoryUploadStore, player: SimulatedPlayer) -> Running {
    let settings = OverlaySettings::new(0.8, 0.8, Duration::from_millis(100), "answers").unwrap();
    let service = SessionLoopService::new(
        fixed_clock(),
        Storage::from_gateway(Arc::new(store.clone())),
        settings,
    );
    let presenter = RecordingPresenter::new();
    let events = presenter.subscribe();
    let (runner, handle) = service
        .start(
            IVideoId::new("Mtr6k7Ugzv").unwrap(),
            ViewerId::parse("9876543210").unwrap(),
            schedule(),
            Box::new(player.clone()),
            Box::new(presenter),
        )
        .await;
    player.start();
    Running {
        handle,
        player,
        events,
        task: tokio::spawn(runner.run()),
    }
}

async fn next_prompt(events: &mut UnboundedReceiver<PresenterEvent>) -> String {
    loop {
        match events.recv().await.expect("session ended early") {
            PresenterEvent::Question { prompt, .. } => return prompt,
            _ => continue,
        }
    }
}

async fn wait_for(events: &mut UnboundedReceiver<PresenterEvent>, expected: PresenterEvent) {
    loop {
        if events.recv().await.expect("session ended early") == expected {
            return;
        }
    }
}

async fn next_warning(events: &mut UnboundedReceiver<PresenterEvent>) -> String {
    loop {
        if let PresenterEvent::Warning(message) = events.recv().await.expect("session ended early")
        {
            return message;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn viewer_answers_dismisses_and_answers_again() {
    let store = InMemoryUploadStore::new();
    let mut run = start(&store, SimulatedPlayer::new(10.0)).await;

    assert_eq!(next_prompt(&mut run.events).await, "q1");
    assert!(!run.player.is_playing());
    run.handle.select("o2");
    wait_for(&mut run.events, PresenterEvent::SubmitEnabled(true)).await;
    run.handle.submit();
    wait_for(&mut run.events, PresenterEvent::Cleared).await;
    assert!(run.player.is_playing());

    assert_eq!(next_prompt(&mut run.events).await, "q2");
    run.handle.dismiss();
    wait_for(&mut run.events, PresenterEvent::Cleared).await;

    assert_eq!(next_prompt(&mut run.events).await, "q3");
    run.handle.select("opt1");
    run.handle.submit();
    wait_for(&mut run.events, PresenterEvent::Cleared).await;
    run.handle.leave();

    let report = run.task.await.unwrap().unwrap();
    assert_eq!(
        report.answers,
        vec![Some("o2".to_string()), None, Some("opt1".to_string())]
    );
    assert_eq!(report.shown, vec![0, 1, 2]);
    assert_eq!(report.answered(), vec![0, 2]);
    assert_eq!(report.cursor, 3);
    assert_eq!(report.uploads.len(), 2);
    assert_eq!(report.failed_uploads(), 0);
    assert_eq!(report.started_at, fixed_now());

    // Both submissions wrote the same key; the last one holds the whole ledger.
    let stored = store.object(KEY).unwrap();
    assert_eq!(stored.version, 2);
    let record = SubmissionRecord::from_json_bytes(&stored.body).unwrap();
    assert_eq!(record.answers(), report.answers.as_slice());
}

#[tokio::test(start_paused = true)]
async fn seeking_past_every_question_shows_nothing() {
    let store = InMemoryUploadStore::new();
    let player = SimulatedPlayer::new(10.0);
    player.seek(6.5);
    let run = start(&store, player).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    run.handle.leave();

    let report = run.task.await.unwrap().unwrap();
    assert!(report.shown.is_empty());
    assert_eq!(report.cursor, 3);
    assert_eq!(report.answers, vec![None, None, None]);
    assert!(report.uploads.is_empty());
    assert_eq!(store.upload_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_upload_is_reported_and_session_continues() {
    let store = InMemoryUploadStore::new();
    let mut run = start(&store, SimulatedPlayer::new(10.0)).await;

    assert_eq!(next_prompt(&mut run.events).await, "q1");
    store.set_offline(true);
    run.handle.select("o1");
    run.handle.submit();

    let warning = next_warning(&mut run.events).await;
    assert!(warning.contains("could not be saved"), "{warning}");
    assert_eq!(next_prompt(&mut run.events).await, "q2");
    run.handle.leave();

    let report = run.task.await.unwrap().unwrap();
    assert_eq!(report.answers[0].as_deref(), Some("o1"));
    assert_eq!(report.failed_uploads(), 1);
    assert!(store.object(KEY).is_none());
}

#[tokio::test(start_paused = true)]
async fn authentication_failure_only_warns() {
    let store = InMemoryUploadStore::new();
    store.set_offline(true);
    let mut run = start(&store, SimulatedPlayer::new(10.0)).await;

    let warning = next_warning(&mut run.events).await;
    assert!(warning.contains("Could not connect"), "{warning}");
    assert_eq!(next_prompt(&mut run.events).await, "q1");
    run.handle.leave();
    assert!(run.task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn play_while_question_is_up_pauses_again() {
    let store = InMemoryUploadStore::new();
    let mut run = start(&store, SimulatedPlayer::new(10.0)).await;

    assert_eq!(next_prompt(&mut run.events).await, "q1");
    run.player.start();
    run.handle.player_event(PlayerEvent::Play);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!run.player.is_playing());

    run.handle.leave();
    let report = run.task.await.unwrap().unwrap();
    assert_eq!(report.shown, vec![0]);
    assert_eq!(report.answers, vec![None, None, None]);
}

#[tokio::test(start_paused = true)]
async fn nothing_fires_until_the_player_is_ready() {
    let store = InMemoryUploadStore::new();
    let player = SimulatedPlayer::new(10.0);
    player.set_ready(false);
    let mut run = start(&store, player).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(run.events.try_recv().is_err());

    // The clip kept running while loading; question 0 has been passed by now.
    run.player.set_ready(true);
    assert_eq!(next_prompt(&mut run.events).await, "q2");
    run.handle.leave();

    let report = run.task.await.unwrap().unwrap();
    assert_eq!(report.shown, vec![1]);
}
