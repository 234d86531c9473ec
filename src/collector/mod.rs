//! Result collection.
//!
//! - tabular: `TabularParser` trait and the default comma/whitespace parser
//! - collect: `ResultCollector`, directory scan -> `ResultDataset`

mod collect;
mod tabular;

pub use collect::ResultCollector;
pub use tabular::{DelimitedParser, TabularParser};
