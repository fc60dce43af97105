//! penstock-flow — uniform-rate admission control over a shared
//! virtual-time ledger.
//!
//! The [`Pacer`] decides, per request for N permits, whether to admit
//! immediately, admit after a bounded wait, or reject. [`RuleTable`] wires
//! one pacer per configured resource.

pub mod ledger;
pub mod pacer;
pub mod registry;

pub use ledger::Ledger;
pub use pacer::{Pacer, ResourceContext};
pub use registry::RuleTable;
