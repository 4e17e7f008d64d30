// Library root: team-building rules, roster construction and saved teams.

pub mod config;
pub mod engine;
pub mod player;
pub mod roster;
pub mod rules;
pub mod team;
