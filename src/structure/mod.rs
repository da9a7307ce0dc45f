//! Structure check: compare a submission tree against its seed project.
//!
//! - [`differ`] walks both trees and classifies every difference
//! - [`policy`] decides which differences are allowed

pub mod differ;
pub mod policy;


pub use differ::{DEFAULT_IGNORED_NAMES, DiffResult, TreeDiffer};
pub use policy::{
    PolicyVerdict, PolicyViolation, PolicyViolationType, evaluate, evaluate_policy,
};
