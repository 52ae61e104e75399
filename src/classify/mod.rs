mod matcher;
mod parser;
mod result;
mod stat;
mod types;

pub use matcher::{DataFilterMatcher, FilterMatcher};
pub use parser::{DataResultParser, ResultParser};
pub use result::ResultFilterClassifier;
pub use stat::StatFilterClassifier;
pub use types::{Fixture, MatcherQuery};
