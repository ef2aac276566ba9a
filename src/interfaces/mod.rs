//! Adapters between the reconciliation core and files on disk.

pub mod csv;
pub mod json;
