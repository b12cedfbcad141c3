pub mod config;
pub mod kill;
pub mod list;
pub mod watch;
