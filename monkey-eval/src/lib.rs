pub mod eval;
pub mod macros;
mod quote;

pub use eval::eval_program;
pub use macros::{define_macros, expand_macros};
