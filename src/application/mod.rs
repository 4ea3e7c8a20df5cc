//! Application layer: one service per entity kind plus the read-side
//! statistics aggregator. Services own the invariant checks (uniqueness,
//! non-negative deduction) and call down into the entity stores; nothing in
//! this layer calls up the stack.

pub mod courses;
pub mod payments;
pub mod stats;
pub mod users;
