pub mod fetch;
pub mod runner;
