//! Use Cases module
//!
//! The operations exposed by [`crate::domain::RouterManager`], each built
//! on the session gateway and the command executor.

pub mod config_transaction;
pub mod restart;
pub mod shell;
pub mod xkeen;
