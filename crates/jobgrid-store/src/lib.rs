//! jobgrid-store: persisted job definitions for jobgrid
//!
//! This crate owns every side effect on the job store: the active area that a
//! live scheduler reads job definitions from, and the archive area that
//! retired definitions are moved into.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: identity (one definition per job name), idempotence detection and
//! per-call error reporting. Nothing here knows how a definition was produced.
//!
//! ## Key Components
//!
//! - `JobStore`: existence check, create, update, archive, revive, listing
//! - `SchedulerNotifier`: optional live-scheduler hook, failures non-fatal
//! - `FsJobStore`: directory-per-job filesystem backend
//! - `CommandNotifier`: notifier that shells out to a configured command

mod error;
pub mod fakes;
pub mod fs;
pub mod notifier;
pub mod storage_traits;

pub use error::StoreError;
pub use fs::FsJobStore;
pub use notifier::CommandNotifier;
pub use storage_traits::{
    DefinitionDigest, JobRecord, JobStore, NotifyAction, SchedulerNotifier, StoreResult,
};
