// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Partitioned execution with canonical (start-index) reassembly.
//!
//! Contiguous partitions for locality, one scoped worker per partition, and a
//! merge that sorts by partition start so results never depend on which
//! worker finished first.

mod cancel;
mod exec;
pub mod merge;
mod ops;
mod plan;

pub use cancel::CancelToken;
pub use merge::Outcome;
pub use ops::{ConcurrentSlice, PartitionedExecutor};
pub use plan::{available_parallelism, resolve_divisions, Partition, PartitionPlan};
