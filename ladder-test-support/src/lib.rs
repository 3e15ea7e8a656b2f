//! Test support for ladder.
//!
//! - [`fixtures`]: build user/event histories by hand or at random
//! - [`chaos`]: scramble event arrival order and inject duplicate deliveries
//! - [`oracle`]: brute-force reference implementation to check responses

pub mod chaos;
pub mod fixtures;
pub mod oracle;

pub use chaos::ArrivalChaos;
pub use fixtures::{Fixture, RandomHistory};
pub use oracle::{Discrepancy, ReferenceBoard};
