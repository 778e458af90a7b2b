//! Domain models for TimmyOS.
//!
//! # Read-through views
//!
//! Most of these are never stored by the server. They are recomputed from the
//! OS, the filesystem or a remote service on every request:
//!
//! - [`HealthSnapshot`]: RAM, CPU temperature, disk and uptime facts.
//! - [`MemoryFile`]: A note in the memory directory, with a short preview.
//! - [`Skill`]: A subdirectory of the skills root.
//! - [`CronJob`]: A line of the user's crontab.
//! - [`KnowcoreStatus`]: Reachability of the remote knowledge base.
//!
//! ## Persisted
//!
//! - [`Task`]: Kanban card. The whole ordered collection lives in one JSON file.
//!
//! ## Wire only
//!
//! - [`BroadcastEnvelope`]: What live dashboards receive over the real-time channel.

mod cron;
mod event;
mod health;
mod knowcore;
mod memory;
mod skill;
mod task;

pub use cron::*;
pub use event::*;
pub use health::*;
pub use knowcore::*;
pub use memory::*;
pub use skill::*;
pub use task::*;
