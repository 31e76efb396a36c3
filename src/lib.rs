//! Kolekta - donation platform for religious parishes.
//!
//! Parishes maintain a public profile and fundraising goals and receive
//! one-time or recurring donations through Przelewy24. This library holds
//! the payment-session lifecycle (initiation, browser callback, gateway
//! webhook), the SQLite-backed record store and the API handlers.

pub mod amount;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod id;
pub mod models;
