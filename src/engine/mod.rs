//! Document rewriting engines.
//!
//! - [`substitute`]: run-level text substitution inside one paragraph
//! - [`expand`]: cloning a template row once per loop item
//! - [`materialize`]: writing placeholders and loop markers for a whole
//!   mapping list

mod expand;
mod materialize;
mod substitute;

pub use expand::{expand, loop_marker, stringify_value};
pub use materialize::{
    materialize, MappingOutcome, MaterializeOptions, MaterializePolicy, MaterializeReport,
    OutcomeStatus,
};
pub use substitute::{replace_range, substitute, RunText};
