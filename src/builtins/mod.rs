//! # Built-in Procedures
//!
//! Native procedures bound into the top-level frame before the prelude
//! runs, organized by category:
//!
//! - **[arithmetic]** (5): =, +, -, *, zero? - Integer operations
//! - **[lists]** (5): list, length, reverse, append, apply - List manipulation
//! - **[console]** (1): display - Output
//!
//! Each category is a sub-module with its own register function. Builtins
//! receive the evaluator (for output and re-application) and their
//! already-evaluated argument list.

use crate::env::Environment;
use crate::node::{BuiltinFn, Node};

pub mod arithmetic;
pub mod console;
pub mod lists;

pub use arithmetic::register as register_arithmetic;
pub use console::register as register_console;
pub use lists::register as register_lists;

/// An environment whose top-level frame holds every builtin, ready for the
/// prelude and then user code.
pub fn default_environment() -> Environment {
    let env = Environment::new();
    register_arithmetic(&env);
    register_lists(&env);
    register_console(&env);
    env
}

pub(crate) fn define_builtin(env: &Environment, name: &'static str, func: BuiltinFn) {
    env.add_define(name.to_string(), Node::builtin(name, func));
}
