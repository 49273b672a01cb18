//! Tick-driven visual novel script engine.
//!
//! A line-oriented narrative script is parsed eagerly into a flat sequence
//! of typed [`Tag`]s, then a [`Conductor`] walks that sequence under an
//! external clock: one [`step`](Conductor::step) per tick dispatches at most
//! one tag to the host, with non-blocking timed pauses and label jumps.
//! Dynamic values (`"&expr"`) are resolved at dispatch time through a
//! pluggable [`Evaluator`] bound to the shared [`VarScopes`].
//!
//! # Quick start
//!
//! ```
//! use kamishibai::{Conductor, ConductorEvent, Resource, Script, Status, Tag};
//!
//! struct Reveal(String);
//!
//! impl ConductorEvent for Reveal {
//!     fn on_error(&mut self, _messages: &[String]) {}
//!     fn on_label(&mut self, _label: &str) {}
//!     fn on_code(&mut self, _code: &str, _print: bool) {}
//!     fn on_tag(&mut self, tag: &Tag) {
//!         if let Some(text) = tag.get("text").and_then(|v| v.as_str()) {
//!             self.0.push_str(text);
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conductor = Conductor::new(Resource::new("."));
//! conductor.set_script(Script::new("hello\n")?);
//! conductor.start();
//!
//! let mut host = Reveal(String::new());
//! let mut tick = 0;
//! while conductor.status() != Status::Stop {
//!     conductor.step(tick, &mut host)?;
//!     tick += 1;
//! }
//! assert_eq!(host.0, "hello");
//! # Ok(())
//! # }
//! ```
//!
//! The `lua` Cargo feature swaps the built-in expression language for a full
//! Lua interpreter behind the same [`Evaluator`] seam.

pub mod cli;
pub mod conductor;
pub mod error;
pub mod expr;
pub mod lua;
pub mod parser;
pub mod resource;
pub mod script;
pub mod tag;
pub mod vars;

pub use conductor::{Conductor, ConductorEvent, Status};
pub use error::{EvalError, LabelNotFoundError, LoadError, ParseError};
pub use expr::ExprEvaluator;
pub use parser::parse_script;
pub use resource::{Evaluator, Resource};
pub use script::Script;
pub use tag::{
    Tag, Value, BODY_KEY, BR_TAG, CH_TAG, CODE_TAG, LABEL_TAG, PRINT_KEY, TEXT_KEY,
};
pub use vars::{Scope, VarScopes};

#[cfg(feature = "lua")]
pub use lua::LuaEvaluator;
