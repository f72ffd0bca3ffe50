//! Hotel booking service
//!
//! Guest bookings priced from a fixed rate table, paid through a hosted
//! payment gateway, confirmed by email, and managed from a token-guarded
//! admin back office. Everything is persisted in an embedded Sled store.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod mailer;
pub mod models;
pub mod openapi;
pub mod payments;
pub mod pricing;
// REST API: public booking flow plus /api/admin back office
pub mod rest;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;
