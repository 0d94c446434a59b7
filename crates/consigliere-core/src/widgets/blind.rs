pub const HEADLINE: &str = "OPERATIONS SUSPENDED";
pub const HINT: &str = "Press Esc to Resume";

/// Full-screen privacy cover toggled with Escape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivacyBlind {
    drawn: bool,
}

impl PrivacyBlind {
    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    pub fn toggle(&mut self) -> bool {
        self.drawn = !self.drawn;
        self.drawn
    }
}
