//! Template rendering adapters.

mod builtin;

pub use builtin::{BuiltinRenderer, builtin_template};
