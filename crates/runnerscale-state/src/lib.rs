//! runnerscale-state — embedded runner inventory.
//!
//! Backed by [redb](https://docs.rs/redb), tracks the runners this
//! deployment has launched so the scale-up engine can count them per
//! category.
//!
//! # Architecture
//!
//! `RunnerRecord`s are JSON-serialized into redb's `&[u8]` value column.
//! Keys are `{environment}:{scope_key}:{instance_id}`, so every runner of
//! one environment and scope sits under a common prefix.
//!
//! The `InventoryStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and implements `RunnerInventory`.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::InventoryStore;
