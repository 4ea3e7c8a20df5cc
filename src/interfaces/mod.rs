//! Thin adapters between the outside world and the application services.
//! This is where typed failure conditions become wire-shaped outcomes; the
//! core itself never formats user-facing output.

pub mod ops;
