use rand::Rng;
use tracing::debug;

pub const CHAMBERS: u32 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Chamber {
    #[default]
    Idle,
    Safe,
    Dead,
}

/// One live round in six. Once dead, the trigger stays unavailable until
/// `revive`.
#[derive(Debug, Clone, Default)]
pub struct Revolver {
    state: Chamber,
}

impl Revolver {
    pub fn state(&self) -> Chamber {
        self.state
    }

    pub fn pull<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Chamber> {
        if self.state == Chamber::Dead {
            debug!("trigger refused; revive first");
            return None;
        }
        self.state = if rng.gen_range(0..CHAMBERS) == 0 {
            Chamber::Dead
        } else {
            Chamber::Safe
        };
        Some(self.state)
    }

    pub fn revive(&mut self) {
        self.state = Chamber::Idle;
    }
}

pub fn describe(state: Chamber) -> &'static str {
    match state {
        Chamber::Idle => "Feeling lucky?",
        Chamber::Safe => "*Click* ... You survive.",
        Chamber::Dead => "BANG! You're dead.",
    }
}
