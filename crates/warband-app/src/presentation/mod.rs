pub mod bootstrap;
pub mod runner;
pub mod state;
pub mod status_table;
