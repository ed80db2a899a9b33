// Utility functions module
pub mod filters;

// Re-export for easy access
pub use filters::*;
