//! Drives `AppContext` the way the GUI does: submit, then pump until idle.

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use common::*;
use tubeconvert::AppContext;
use tubeconvert::config::Config;
use tubeconvert::context::Collaborators;
use tubeconvert::error::CoreError;
use tubeconvert::events::{AppEvent, EventKind};
use tubeconvert::model::DownloadOutcome;
use tubeconvert::state::StateUpdate;

fn context(dir: &std::path::Path, source: StubSource) -> AppContext {
    let config = Config { download_dir: dir.to_path_buf(), ..Config::default() };
    let collaborators = Collaborators {
        source: Arc::new(source),
        http: Arc::new(StubHttp::ok(b"thumb")),
        transcoder: Arc::new(RecordingTranscoder::default()),
    };
    AppContext::with_collaborators(&config, collaborators).unwrap()
}

/// Collects every published event of the given kinds.
fn record(ctx: &mut AppContext, kinds: &[EventKind]) -> Rc<RefCell<Vec<AppEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    for kind in kinds {
        let seen = Rc::clone(&seen);
        ctx.subscribe(*kind, move |event| seen.borrow_mut().push(event.clone()));
    }
    seen
}

fn pump_until(ctx: &mut AppContext, mut done: impl FnMut(&AppContext) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(ctx) {
        assert!(Instant::now() < deadline, "timed out waiting for background work");
        ctx.pump();
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn download_runs_to_completion_and_reenables_submission() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(video_info("clip", vec![progressive_mp4(16)]), vec![7; 16]);
    let mut ctx = context(dir.path(), source);
    let seen = record(&mut ctx, &[EventKind::DownloadFinished, EventKind::DownloadStatus]);

    let transitions = Rc::new(RefCell::new(Vec::new()));
    let t = Rc::clone(&transitions);
    ctx.on_state_change(move |state| t.borrow_mut().push(state.is_downloading));

    ctx.submit_download().unwrap();
    assert!(!ctx.can_submit());
    pump_until(&mut ctx, |ctx| ctx.can_submit());

    let expected = dir.path().join("clip.mp4");
    assert_eq!(std::fs::read(&expected).unwrap(), vec![7; 16]);
    assert_eq!(*transitions.borrow(), vec![true, false]);

    let seen = seen.borrow();
    assert_eq!(seen.last(), Some(&AppEvent::DownloadFinished(DownloadOutcome::Success { path: expected })));
    assert!(seen.contains(&AppEvent::DownloadStatus("Download complete!".into())));
    ctx.shutdown();
}

#[test]
fn second_submission_is_refused_while_downloading() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let mut source = StubSource::new(video_info("slow", vec![progressive_mp4(4)]), vec![1; 4]);
    source.gate = Some(Arc::clone(&gate));
    let mut ctx = context(dir.path(), source);

    ctx.submit_download().unwrap();
    assert_eq!(ctx.submit_download(), Err(CoreError::AlreadyInProgress));

    gate.notify_one();
    pump_until(&mut ctx, |ctx| ctx.can_submit());
    assert!(dir.path().join("slow.mp4").exists());
    ctx.shutdown();
}

#[test]
fn invalid_state_is_rejected_before_anything_starts() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path(), StubSource::new(video_info("x", Vec::new()), Vec::new()));

    ctx.update_state(StateUpdate::default().url("not a url"));
    assert!(matches!(ctx.submit_download(), Err(CoreError::InvalidRequest(_))));

    ctx.update_state(StateUpdate::default().url("https://youtu.be/x").format("FLAC"));
    assert_eq!(ctx.submit_download(), Err(CoreError::UnknownFormat("FLAC".into())));
    assert!(ctx.can_submit());
    ctx.shutdown();
}

#[test]
fn cancel_ends_the_run_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = StubSource::new(video_info("stuck", vec![progressive_mp4(4)]), vec![1; 4]);
    // never released
    source.gate = Some(Arc::new(Notify::new()));
    let mut ctx = context(dir.path(), source);
    let seen = record(&mut ctx, &[EventKind::DownloadFinished]);

    assert!(!ctx.cancel_download());
    ctx.submit_download().unwrap();
    assert!(ctx.cancel_download());
    pump_until(&mut ctx, |ctx| ctx.can_submit());

    assert_eq!(*seen.borrow(), vec![AppEvent::DownloadFinished(DownloadOutcome::Failed(CoreError::Cancelled))]);
    ctx.shutdown();
}

#[test]
fn preview_result_is_published_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path(), StubSource::new(video_info("Title", Vec::new()), Vec::new()));
    let seen = record(&mut ctx, &[EventKind::PreviewReady, EventKind::PreviewFailed]);

    ctx.submit_preview().unwrap();
    assert!(ctx.is_preview_in_flight());
    assert_eq!(ctx.submit_preview(), Err(CoreError::AlreadyInProgress));
    pump_until(&mut ctx, |ctx| !ctx.is_preview_in_flight());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        AppEvent::PreviewReady(preview) => {
            assert_eq!(preview.title, "Title");
            assert_eq!(preview.thumbnail, b"thumb".to_vec());
        }
        other => panic!("unexpected event {other:?}"),
    }
    ctx.shutdown();
}

#[test]
fn preview_failure_is_published_as_message() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path(), StubSource::failing("Private video"));
    let seen = record(&mut ctx, &[EventKind::PreviewFailed]);

    ctx.submit_preview().unwrap();
    pump_until(&mut ctx, |ctx| !ctx.is_preview_in_flight());
    assert_eq!(*seen.borrow(), vec![AppEvent::PreviewFailed("Private video".into())]);
    ctx.shutdown();
}
