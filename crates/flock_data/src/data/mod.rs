pub mod agent;
pub mod grid;
