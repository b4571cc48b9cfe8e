//! Global type checker for FEL projects.
//!
//! Runs the six-stage check described in spec.md §4.4 over every parsed
//! file in a project: collect top-level definitions, check each `:: html`
//! component body while recording which other components it renders,
//! resolve the dependency closure (erroring on cycles), flag orphaned
//! `:: css_config` definitions, then re-check every file's own top-level
//! statement body (config.fel and templates alike).

mod checker;
mod scope;
mod type_info;

pub use checker::{CheckedProgram, TypeChecker};
pub use scope::Scope;
pub use type_info::{ProcedureShape, StructFieldShape, StructShape, TypeInfo, TypeRegistry};
