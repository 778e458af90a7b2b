//! TimmyOS: a personal-assistant status dashboard.
//!
//! The HTTP surface in [`api`] reads through to the OS and a handful of flat
//! files on every request. [`sync`] layers live updates on top: a health
//! ticker and filesystem watchers push fresh views into the [`hub`], which
//! fans them out to every open dashboard.

pub mod actions;
pub mod api;
pub mod config;
pub mod cron;
pub mod error;
pub mod health;
pub mod hub;
pub mod knowcore;
pub mod memory;
pub mod models;
pub mod skills;
pub mod sync;
pub mod tasks;
