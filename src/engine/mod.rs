pub mod action;
pub mod actor;
pub mod arena;
pub mod bot_strategy;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod phase;
pub mod ranking;
pub mod rules;
pub mod session;
pub mod suspension;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;
