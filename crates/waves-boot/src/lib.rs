//! Waves Module Bootstrapper
//!
//! Instantiates a precompiled binary module exactly once and publishes the
//! resulting handle to a write-once cell that any later code can read.
//!
//! # Module Organization
//!
//! - `cell` - [`PublishedCell`], the write-once read-many publication slot,
//!   and [`PublishedReader`], its read-only consumer view
//! - `bootstrap` - [`Bootstrapper`], the single-invocation bootstrap protocol
//! - `state` - [`BootState`] lifecycle (NotStarted → Pending → Published | Failed)
//! - `error` - [`BootError`] taxonomy
//! - `sync` - std or loom synchronization primitives behind the cell
//! - `loom_tests` - Concurrency tests using loom (with `loom` feature)
//!
//! # Protocol
//!
//! ```text
//! bootstrap()
//!   ├─ guard: NotStarted → Pending   (later calls: AlreadyStarted)
//!   ├─ provider.instantiate().await  (sole suspension point)
//!   ├─ Ok(handle)  → host slot write → cell.set(handle)  → Published
//!   └─ Err(error)  → cell.close(InitializationFailure)   → Failed
//! ```
//!
//! Publication and failure are mutually exclusive: the cell settles exactly
//! once, and only the bootstrapper that owns it can settle it. Consumers
//! receive a [`PublishedReader`] from [`Bootstrapper::reader`].

pub mod bootstrap;
pub mod cell;
pub mod error;
pub mod state;
mod sync;


pub use bootstrap::Bootstrapper;
pub use cell::{PublishedCell, PublishedReader, Ready};
pub use error::BootError;
pub use state::BootState;

// Re-export the collaborator contracts so dependents need only this crate
pub use waves_hal::{HostSlot, ModuleProvider, ProviderError};
