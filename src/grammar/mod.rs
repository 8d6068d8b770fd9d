pub mod analysis;
pub mod conflict;
pub mod derivation;
pub mod error;
pub mod grammar;
pub mod ll1_parsing_table;
pub mod nullable_first_follow;
pub mod parse;
pub mod pretty_print;
pub use analysis::Analysis;
pub use grammar::Grammar;

pub const EPSILON: &str = "ε";
pub const END_MARK: &str = "$";
