pub mod fuzzy;
pub mod gap;
pub mod language;
pub mod votes;
