// Models module
pub mod order;
pub mod severity;

pub use order::OrderLine;
pub use severity::Severity;
