pub mod constants;
pub mod documents;
pub mod estimator;

pub use constants::*;
pub use documents::*;
pub use estimator::*;
