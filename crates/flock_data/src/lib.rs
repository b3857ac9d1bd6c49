//! Plain data types shared by the flocking engine, its transport and drivers.

pub mod data;

pub use data::agent::{Agent, AgentId, AgentSnapshot, Neighbor, NeighborBuffer};
pub use data::grid::{CellMove, GridCoord, Neighborhood, NEIGHBORHOOD_CELLS};
pub use glam::Vec3;
