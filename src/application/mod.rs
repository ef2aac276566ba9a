//! Application layer: reconciliation of gateway transactions against orders.
//!
//! `ReconciliationService` is the entry point. It loads the order, then hands it to the
//! `TransactionDispatcher` (webhook and browser-return paths) or the
//! `RedirectRequestProcessor` (checkout start). Both funnel through the primitives on
//! `OrderReconciler`, which owns the injected ports.

pub mod customer;
pub mod dispatcher;
pub mod handlers;
pub mod reconciler;
pub mod redirect;
pub mod service;
