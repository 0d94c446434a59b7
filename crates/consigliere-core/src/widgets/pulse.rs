use std::time::Duration;

pub const CYCLE: Duration = Duration::from_secs(10);
pub const GUIDE: &str = "Inhale ... Hold ... Exhale";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breath {
    Inhale,
    Hold,
    Exhale,
}

impl Breath {
    pub fn label(self) -> &'static str {
        match self {
            Breath::Inhale => "Inhale",
            Breath::Hold => "Hold",
            Breath::Exhale => "Exhale",
        }
    }
}

/// Four seconds in, two held, four out.
pub fn phase(elapsed: Duration) -> Breath {
    let offset = elapsed.as_millis() % CYCLE.as_millis();
    match offset {
        0..4_000 => Breath::Inhale,
        4_000..6_000 => Breath::Hold,
        _ => Breath::Exhale,
    }
}
