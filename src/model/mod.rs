pub use flock_core::SteeringLogic;
pub mod spatial_grid {
    pub use flock_core::spatial_grid::*;
}
pub mod steering {
    pub use flock_core::steering::*;
}
pub mod partition {
    pub use flock_core::partition::*;
}
pub mod population {
    pub use flock_core::population::*;
}
pub mod metrics {
    pub use flock_core::metrics::*;
}
pub mod error {
    pub use flock_core::error::*;
}
pub mod state {
    pub use flock_data::*;
}
pub mod replication {
    pub use flock_io::replication::*;
}

pub mod config;
pub mod fleet;
pub mod world;
