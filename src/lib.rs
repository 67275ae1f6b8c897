//! tourdash: client library for the tour-booking dashboard API.
//!
//! Exposes the REST wrappers, DTO normalization, chat message grouping and
//! the notification/account reconciliation used by the `tourdash` binary.

pub mod api;
pub mod config;
pub mod errors;
pub mod grouping;
pub mod jobs;
pub mod models;
pub mod normalize;
pub mod notification;
pub mod reconcile;
pub mod session;
