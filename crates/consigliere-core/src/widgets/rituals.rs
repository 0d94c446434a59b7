use std::collections::BTreeSet;

pub const HABITS: [&str; 3] = ["Watch Movie", "Listen to Music", "Play Games"];

/// The daily rituals checklist. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct Rituals {
    done: BTreeSet<&'static str>,
}

impl Rituals {
    /// Flips a habit by name (case-insensitive). Returns the new state, or
    /// `None` for names that are not on the list.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let habit = HABITS
            .iter()
            .copied()
            .find(|habit| habit.eq_ignore_ascii_case(name.trim()))?;
        if self.done.remove(habit) {
            Some(false)
        } else {
            self.done.insert(habit);
            Some(true)
        }
    }

    pub fn is_done(&self, habit: &str) -> bool {
        self.done.contains(habit)
    }

    pub fn checklist(&self) -> Vec<(&'static str, bool)> {
        HABITS
            .iter()
            .map(|&habit| (habit, self.is_done(habit)))
            .collect()
    }
}
