//! `StudyBot` library.
//!
//! A Telegram shop for ready-made student projects: a browsable catalog
//! with cart and instant purchase, custom work orders, support tickets,
//! reviews, referrals, and an admin panel for the catalog, orders, users,
//! tickets and broadcasts.
//!
//! The binary in `main.rs` only wires configuration, logging and the
//! polling loop; everything else lives here so it can be tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod handlers;
pub mod health;
pub mod models;
pub mod runtime;
pub mod services;
pub mod state;
pub mod telegram;
pub mod views;
