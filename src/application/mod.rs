//! Application layer orchestrating the domain over the ports.
//!
//! `QuoteCalculator` prices shipments, `ClientQuoteCache` keeps the per-session
//! draft between quoting and payment, and `OrderReconciler` turns a verified
//! payment into exactly one order.

pub mod cache;
pub mod quote;
pub mod reconciler;
pub mod webhook;
