use std::collections::HashMap;

use crate::model::{DownloadOutcome, DownloadPhase, VideoPreview};

/// Subscription key for [`AppEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PreviewReady,
    PreviewFailed,
    DownloadPhase,
    DownloadProgress,
    DownloadStatus,
    DownloadFinished,
    DownloadRejected,
}

/// Background results, published on the UI thread after being drained from
/// the worker channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PreviewReady(VideoPreview),
    PreviewFailed(String),
    DownloadPhase(DownloadPhase),
    DownloadProgress(u8),
    DownloadStatus(String),
    DownloadFinished(DownloadOutcome),
    /// The orchestrator refused to start because another run was active
    DownloadRejected(String),
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::PreviewReady(_) => EventKind::PreviewReady,
            AppEvent::PreviewFailed(_) => EventKind::PreviewFailed,
            AppEvent::DownloadPhase(_) => EventKind::DownloadPhase,
            AppEvent::DownloadProgress(_) => EventKind::DownloadProgress,
            AppEvent::DownloadStatus(_) => EventKind::DownloadStatus,
            AppEvent::DownloadFinished(_) => EventKind::DownloadFinished,
            AppEvent::DownloadRejected(_) => EventKind::DownloadRejected,
        }
    }
}

type Callback = Box<dyn FnMut(&AppEvent)>;

/// Publish/subscribe registry. Lives on the UI thread, so callbacks need not be `Send`.
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<Callback>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, callback: impl FnMut(&AppEvent) + 'static) {
        self.subscribers.entry(kind).or_default().push(Box::new(callback));
    }

    /// Calls every subscriber of the event's kind in subscription order.
    /// Returns how many were called.
    pub fn publish(&mut self, event: &AppEvent) -> usize {
        match self.subscribers.get_mut(&event.kind()) {
            Some(callbacks) => {
                for callback in callbacks.iter_mut() {
                    callback(event);
                }
                callbacks.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_publish_reaches_only_matching_subscribers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let s = Rc::clone(&seen);
        bus.subscribe(EventKind::DownloadProgress, move |e| s.borrow_mut().push(format!("a:{e:?}")));
        let s = Rc::clone(&seen);
        bus.subscribe(EventKind::DownloadProgress, move |e| s.borrow_mut().push(format!("b:{e:?}")));
        let s = Rc::clone(&seen);
        bus.subscribe(EventKind::DownloadStatus, move |e| s.borrow_mut().push(format!("c:{e:?}")));

        assert_eq!(bus.publish(&AppEvent::DownloadProgress(42)), 2);
        assert_eq!(
            *seen.borrow(),
            vec!["a:DownloadProgress(42)".to_string(), "b:DownloadProgress(42)".to_string()]
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let mut bus = EventBus::new();
        assert_eq!(bus.publish(&AppEvent::PreviewFailed("x".into())), 0);
    }
}
