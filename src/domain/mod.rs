//! Domain layer: persisted entities, the shared audit base, and the storage
//! port every backend must implement.

pub mod course;
pub mod entity;
pub mod payment;
pub mod ports;
pub mod user;
