use chrono::Timelike;

use crate::mode::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Operations,
    SecureLine,
    Notes,
    Timer,
    Audio,
    Quotes,
    Pulse,
    Rituals,
    Outlook,
}

impl Widget {
    pub fn title(self) -> &'static str {
        match self {
            Widget::Operations => "Operations",
            Widget::SecureLine => "Secure Line",
            Widget::Notes => "The Ledger",
            Widget::Timer => "The Fuse",
            Widget::Audio => "Vinyl",
            Widget::Quotes => "Words of the Family",
            Widget::Pulse => "The Pulse",
            Widget::Rituals => "The Chain",
            Widget::Outlook => "Atmosphere",
        }
    }
}

const FOCUS_GRID: [Widget; 5] = [
    Widget::Operations,
    Widget::SecureLine,
    Widget::Notes,
    Widget::Timer,
    Widget::Audio,
];

const RELAX_GRID: [Widget; 6] = [
    Widget::Quotes,
    Widget::Pulse,
    Widget::Timer,
    Widget::Rituals,
    Widget::Audio,
    Widget::Outlook,
];

/// Widgets shown for `mode`, left wing first.
pub fn widgets_for(mode: Mode) -> &'static [Widget] {
    match mode {
        Mode::Focus => &FOCUS_GRID,
        Mode::Relax => &RELAX_GRID,
    }
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..12 => "Good Morning",
        12..18 => "Good Afternoon",
        _ => "Good Evening",
    }
}

pub fn header<T: Timelike>(now: &T) -> String {
    format!("{}, Don Corelli.", greeting(now.hour()))
}
