//! Local mirror of remote scene state
//!
//! Writers are the session supervisor (scene loads, connection changes) and
//! the event pump (current-scene pushes). Readers get consistent snapshots:
//! the scene list and the current scene of a load are published together.

use tokio::sync::watch;

use obs_core::{CachedState, Scene};

/// Best-effort view of the remote scene state
pub struct StateCache {
    state: watch::Sender<CachedState>,
}

impl StateCache {
    /// Create an empty, disconnected cache
    pub fn new() -> Self {
        let (state, _) = watch::channel(CachedState::default());
        Self { state }
    }

    /// Replace the scene list and current scene in one step
    pub fn apply_scene_list(&self, scenes: Vec<Scene>, current_scene: Option<String>) {
        self.state.send_modify(|state| {
            state.scenes = scenes;
            state.current_scene = current_scene;
        });
    }

    /// Record a change of the program scene
    pub fn apply_current_scene(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.send_if_modified(|state| {
            if state.current_scene.as_deref() == Some(name.as_str()) {
                return false;
            }
            state.current_scene = Some(name);
            true
        });
    }

    /// Record connection status.
    ///
    /// The scene list is kept on disconnect so the last known state stays
    /// readable.
    pub fn set_connected(&self, connected: bool) {
        self.state.send_if_modified(|state| {
            if state.connected == connected {
                return false;
            }
            state.connected = connected;
            true
        });
    }

    /// Consistent copy of the whole state
    pub fn snapshot(&self) -> CachedState {
        self.state.borrow().clone()
    }

    pub fn scenes(&self) -> Vec<Scene> {
        self.state.borrow().scenes.clone()
    }

    pub fn current_scene(&self) -> Option<String> {
        self.state.borrow().current_scene.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Watch for changes
    pub fn subscribe(&self) -> watch::Receiver<CachedState> {
        self.state.subscribe()
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_is_empty() {
        let cache = StateCache::new();
        assert_eq!(cache.snapshot(), CachedState::default());
        assert!(!cache.is_connected());
    }

    #[test]
    fn test_scene_list_published_with_current() {
        let cache = StateCache::new();
        let mut rx = cache.subscribe();

        cache.apply_scene_list(
            vec![Scene::new("Intro", 0), Scene::new("Main", 1)],
            Some("Main".to_string()),
        );

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.scenes.len(), 2);
        assert_eq!(state.current_scene.as_deref(), Some("Main"));
    }

    #[test]
    fn test_current_scene_unchanged_does_not_notify() {
        let cache = StateCache::new();
        cache.apply_current_scene("Main");
        let rx = cache.subscribe();

        cache.apply_current_scene("Main");
        assert!(!rx.has_changed().unwrap());

        cache.apply_current_scene("BRB");
        assert!(rx.has_changed().unwrap());
        assert_eq!(cache.current_scene().as_deref(), Some("BRB"));
    }

    #[test]
    fn test_disconnect_keeps_scenes() {
        let cache = StateCache::new();
        cache.set_connected(true);
        cache.apply_scene_list(vec![Scene::new("Main", 0)], Some("Main".to_string()));

        cache.set_connected(false);

        let state = cache.snapshot();
        assert!(!state.connected);
        assert_eq!(state.scenes, vec![Scene::new("Main", 0)]);
        assert_eq!(state.current_scene.as_deref(), Some("Main"));
    }
}
