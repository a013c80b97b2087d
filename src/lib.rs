//! Merges loose-file mods and patcher-based mods into one deployable
//! game data folder.

pub mod services;
pub mod types;
