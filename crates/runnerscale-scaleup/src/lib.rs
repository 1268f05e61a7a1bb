//! runnerscale-scaleup — demand-driven runner provisioning.
//!
//! Reacts to one "job queued" event and decides, per runner category,
//! whether a new runner must be launched.
//!
//! # Decision Algorithm
//!
//! ```text
//! require event_source == "aws:sqs"
//! scope  = organization_level ? org(owner) : repo(owner, repo)
//! client = installation client (look the installation up when id == 0)
//!
//! if check_run(id).status != queued:
//!     done                                   // normal, frequent no-op
//!
//! records = inventory(environment, scope)
//! for category in categories:
//!     current = count(records where category == category.name)
//!     if current >= category.max_available:
//!         skip
//!     live = platform runners of scope carrying the label, not offline
//!     if every runner in live is busy:        // vacuously true when empty
//!         token = registration token(scope)
//!         create runner(--url .. --token .. --labels ..)
//! ```
//!
//! Concurrent invocations are not excluded from each other; the ceiling
//! bounds how far a race can over-provision.

pub mod admission;
pub mod error;
pub mod provision;
pub mod scaler;
pub mod target;

#[cfg(test)]
mod testing;

pub use admission::{Admission, all_matching_busy};
pub use error::{ScaleUpError, ScaleUpResult};
pub use scaler::{CategoryOutcome, ScaleUp, ScaleUpReport};
pub use target::ResolvedTarget;
