//! Mobile-facing bindings for the exam tracker core.

pub mod api;
