use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::store::{KeyValueStore, NOTES_KEY, TASKS_KEY};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// First press; a second one inside the window burns.
    Armed,
    /// Tasks and notes were wiped. Mounted widgets must reload.
    Burned,
}

/// Two-step wipe of the task deck and notepad. The books ledger survives.
#[derive(Debug, Clone)]
pub struct Incinerator {
    window: Duration,
    armed_at: Option<Instant>,
}

impl Default for Incinerator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Incinerator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed_at: None,
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let window = cfg
            .get_u64("incinerator.window.seconds")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WINDOW);
        Ok(Self::new(window))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_armed(&self, now: Instant) -> bool {
        self.armed_at
            .is_some_and(|at| now.saturating_duration_since(at) <= self.window)
    }

    #[instrument(skip(self, store, now))]
    pub fn press<S: KeyValueStore>(&mut self, store: &S, now: Instant) -> anyhow::Result<Press> {
        if !self.is_armed(now) {
            warn!(window_secs = self.window.as_secs(), "incinerator armed");
            self.armed_at = Some(now);
            return Ok(Press::Armed);
        }

        self.armed_at = None;
        store.remove(TASKS_KEY)?;
        store.remove(NOTES_KEY)?;
        info!("tasks and notes incinerated");
        Ok(Press::Burned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BOOKS_KEY, MemoryStore};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.save_raw(TASKS_KEY, "[]").expect("save");
        store.save_raw(NOTES_KEY, "secret").expect("save");
        store.save_raw(BOOKS_KEY, "[]").expect("save");
        store
    }

    #[test]
    fn second_press_inside_window_burns() {
        let store = seeded();
        let mut burner = Incinerator::default();
        let start = Instant::now();

        assert_eq!(burner.press(&store, start).expect("press"), Press::Armed);
        assert_eq!(store.load_raw(NOTES_KEY).expect("load").as_deref(), Some("secret"));

        let confirm = start + Duration::from_secs(2);
        assert_eq!(burner.press(&store, confirm).expect("press"), Press::Burned);
        assert_eq!(store.load_raw(TASKS_KEY).expect("load"), None);
        assert_eq!(store.load_raw(NOTES_KEY).expect("load"), None);
        assert!(store.load_raw(BOOKS_KEY).expect("load").is_some());
        assert!(!burner.is_armed(confirm));
    }

    #[test]
    fn late_press_rearms_instead() {
        let store = seeded();
        let mut burner = Incinerator::default();
        let start = Instant::now();

        burner.press(&store, start).expect("press");
        let late = start + Duration::from_secs(4);
        assert_eq!(burner.press(&store, late).expect("press"), Press::Armed);
        assert!(store.load_raw(TASKS_KEY).expect("load").is_some());
    }
}
