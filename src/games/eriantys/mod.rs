//! Reference Eriantys rules: islands, schools, clouds, professors and the
//! expert-mode character cards.

pub mod board;
pub mod characters;
pub mod rules;
pub mod types;

pub use rules::EriantysRules;
