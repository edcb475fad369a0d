//! Recognition engine: normalize, match, evaluate

pub mod evaluator;
pub mod expression;
pub mod matcher;
pub mod normalizer;
pub mod target_formula;

pub use evaluator::evaluate;
pub use matcher::PatternMatcher;
pub use normalizer::FormulaNormalizer;
pub use target_formula::{target_formula, VOCABULARY};
