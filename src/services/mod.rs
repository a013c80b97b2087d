pub mod archive;
pub mod config;
pub mod core;
pub mod flatten;
pub mod fs_utils;
pub mod installer;
pub mod patcher;
