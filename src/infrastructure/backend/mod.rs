//! External service adapters
//!
//! - `pharos`: reset and fixture loading for the REST backend
//! - `dpn_cluster`: multi-phase bring-up of the local replication cluster

pub mod dpn_cluster;
pub mod pharos;

pub use dpn_cluster::DpnCluster;
pub use pharos::PharosBackend;
