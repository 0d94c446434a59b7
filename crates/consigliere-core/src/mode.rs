use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Focus,
    Relax,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::Relax => "relax",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Mode::Focus => Mode::Relax,
            Mode::Relax => Mode::Focus,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(Mode::Focus),
            "relax" => Ok(Mode::Relax),
            other => Err(anyhow!("unknown mode: {other}")),
        }
    }
}

type Listener = Box<dyn Fn(Mode) + Send + Sync>;

struct Shared {
    mode: RwLock<Mode>,
    listeners: Mutex<Vec<Listener>>,
}

/// Creates the process-wide flag. The [`ModeSwitch`] is the only handle
/// that can write; hand it to the timer and give everyone else a
/// [`ModeView`].
pub fn mode_flag(initial: Mode) -> (ModeSwitch, ModeView) {
    let shared = Arc::new(Shared {
        mode: RwLock::new(initial),
        listeners: Mutex::new(Vec::new()),
    });
    (
        ModeSwitch {
            shared: Arc::clone(&shared),
        },
        ModeView { shared },
    )
}

/// Read-only handle on the mode flag.
#[derive(Clone)]
pub struct ModeView {
    shared: Arc<Shared>,
}

impl ModeView {
    pub fn get(&self) -> Mode {
        *self.shared.mode.read()
    }

    /// Registers a callback run after every change of mode. Callbacks must
    /// not subscribe further listeners from inside the callback.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(Mode) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.listeners.lock();
        listeners.push(Box::new(listener));
        debug!(count = listeners.len(), "mode listener registered");
    }
}

impl fmt::Debug for ModeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeView").field("mode", &self.get()).finish()
    }
}

/// Writer handle on the mode flag. Not `Clone`: there is exactly one.
pub struct ModeSwitch {
    shared: Arc<Shared>,
}

impl ModeSwitch {
    pub fn get(&self) -> Mode {
        *self.shared.mode.read()
    }

    pub fn view(&self) -> ModeView {
        ModeView {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Sets the mode; listeners only hear about actual changes.
    pub fn set(&self, mode: Mode) -> bool {
        {
            let mut current = self.shared.mode.write();
            if *current == mode {
                return false;
            }
            *current = mode;
        }

        info!(%mode, "mode changed");
        for listener in self.shared.listeners.lock().iter() {
            listener(mode);
        }
        true
    }

    pub fn toggle(&self) -> Mode {
        let next = self.get().other();
        self.set(next);
        next
    }
}

impl fmt::Debug for ModeSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeSwitch").field("mode", &self.get()).finish()
    }
}
