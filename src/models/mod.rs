pub mod result;
pub mod status;
pub mod tree;

pub use result::{Example, Outcome, RunSummary};
pub use status::ExampleState;
pub use tree::Suite;
