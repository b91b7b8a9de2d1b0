//! Domain models for WASHBOOK.
//!
//! Booking and payment resources are owned by their own services; the
//! only model shared across the workspace is the principal record.

pub mod principal;
