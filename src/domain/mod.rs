//! Domain types and the ports the reconciliation core talks to.

pub mod address;
pub mod method;
pub mod money;
pub mod order;
pub mod ports;
pub mod transaction;
pub mod urls;
