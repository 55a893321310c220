#![doc = include_str!("../README.md")]

mod error;
mod normalize;
mod quasigroup;
mod text;
mod verdict;

pub use error::{QuasigroupError, Result};
pub use normalize::{DEFAULT_UNIT, SIMPLE_LABEL};
pub use quasigroup::{LoopState, MAX_ORDER, Quasigroup};
pub use text::IndexOrigin;
pub use verdict::{AffinityReport, NO_SUBGROUPS, SubgroupVerdict, Trial};
