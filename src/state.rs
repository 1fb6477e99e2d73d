use std::path::PathBuf;

/// The UI-relevant fields of [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub url: String,
    pub path: PathBuf,
    pub format: String,
    pub is_downloading: bool,
}

/// A partial update; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    pub format: Option<String>,
    pub is_downloading: Option<bool>,
}

impl StateUpdate {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn is_downloading(mut self, value: bool) -> Self {
        self.is_downloading = Some(value);
        self
    }
}

type Listener = Box<dyn FnMut(&StateSnapshot)>;

/// Single shared application state. [`AppState::update`] is the only writer.
pub struct AppState {
    current: StateSnapshot,
    listeners: Vec<Listener>,
}

impl AppState {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            current: StateSnapshot {
                url: url.into(),
                path: path.into(),
                format: format.into(),
                is_downloading: false,
            },
            listeners: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &StateSnapshot {
        &self.current
    }

    pub fn is_downloading(&self) -> bool {
        self.current.is_downloading
    }

    pub fn on_change(&mut self, listener: impl FnMut(&StateSnapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Applies every field that differs, then notifies listeners once.
    /// Returns whether anything changed; a no-op update notifies nobody.
    pub fn update(&mut self, update: StateUpdate) -> bool {
        let mut changed = false;
        let cur = &mut self.current;

        if let Some(url) = update.url.filter(|v| *v != cur.url) {
            cur.url = url;
            changed = true;
        }
        if let Some(path) = update.path.filter(|v| *v != cur.path) {
            cur.path = path;
            changed = true;
        }
        if let Some(format) = update.format.filter(|v| *v != cur.format) {
            cur.format = format;
            changed = true;
        }
        if let Some(flag) = update.is_downloading.filter(|v| *v != cur.is_downloading) {
            cur.is_downloading = flag;
            changed = true;
        }

        if changed {
            tracing::debug!(state = ?self.current, "state changed");
            for listener in &mut self.listeners {
                listener(&self.current);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn state_with_counter() -> (AppState, Rc<RefCell<Vec<StateSnapshot>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut state = AppState::new("/tmp", "", "MP4");
        let s = Rc::clone(&seen);
        state.on_change(move |snap| s.borrow_mut().push(snap.clone()));
        (state, seen)
    }

    #[test]
    fn test_batched_update_notifies_once() {
        let (mut state, seen) = state_with_counter();
        let changed = state.update(
            StateUpdate::default()
                .url("https://youtu.be/abc")
                .format("MP3")
                .is_downloading(true),
        );
        assert!(changed);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(
            seen.borrow()[0],
            StateSnapshot {
                url: "https://youtu.be/abc".into(),
                path: PathBuf::from("/tmp"),
                format: "MP3".into(),
                is_downloading: true,
            }
        );
    }

    #[test]
    fn test_unchanged_update_is_silent() {
        let (mut state, seen) = state_with_counter();
        assert!(!state.update(StateUpdate::default().format("MP4").path("/tmp")));
        assert!(!state.update(StateUpdate::default()));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let (mut state, _) = state_with_counter();
        state.update(StateUpdate::default().url("https://a"));
        state.update(StateUpdate::default().path("/downloads"));
        let snap = state.snapshot();
        assert_eq!(snap.url, "https://a");
        assert_eq!(snap.path, PathBuf::from("/downloads"));
        assert_eq!(snap.format, "MP4");
        assert!(!state.is_downloading());
    }
}
