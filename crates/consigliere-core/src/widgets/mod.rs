//! Peripheral dashboard widgets. Apart from the notepad and the books, none
//! of them persist anything.

pub mod audio;
pub mod blind;
pub mod books;
pub mod dice;
pub mod enforcer;
pub mod incinerator;
pub mod notes;
pub mod poker;
pub mod pulse;
pub mod quotes;
pub mod revolver;
pub mod rituals;
pub mod wheel;
