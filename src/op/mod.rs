//! The operation catalog (C1): a process-wide registry mapping an operation
//! name to its signature and classification.

mod builtin;
mod catalog;
mod signature;

pub use catalog::{default_catalog, OpCatalog};
pub use signature::{AcceptsFn, OutputTypeFn};

use crate::dtype::DataType;
use crate::error::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// An operation may belong to more than one of these classes at once.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct OpClass: u16 {
        /// Produces a literal value baked into the graph (`const_`).
        const CONSTANT  = 0b0000_0001;
        /// Mutates memory in place (store, scatter atomics).
        const MODIFIER  = 0b0000_0010;
        /// Reads or writes a memory node (load/store/deallocate/atomics/memory/input_shape).
        const MEMORY_OP = 0b0000_0100;
        /// Reverse-mode autodiff must fail deterministically on this op.
        const NONDIFF   = 0b0000_1000;
        /// Has no runtime-varying inputs; safe to hoist/evaluate at compile time.
        const STATIC    = 0b0001_0000;
    }
}

/// An immutable descriptor of one named operation.
///
/// All fields are plain data or non-capturing function pointers, so
/// `Operation` is `Copy` and can be embedded directly in a [`crate::ir::Node`]
/// without any arena-shared ownership machinery.
#[derive(Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub classes: OpClass,
    accepts: AcceptsFn,
    output_type: OutputTypeFn,
}

impl Operation {
    pub const fn new(
        name: &'static str,
        classes: OpClass,
        accepts: AcceptsFn,
        output_type: OutputTypeFn,
    ) -> Self {
        Operation {
            name,
            classes,
            accepts,
            output_type,
        }
    }

    /// Is this input type tuple valid for the operation?
    pub fn accepts(&self, inputs: &[DataType]) -> bool {
        (self.accepts)(inputs)
    }

    /// Given a valid input tuple, what is the output type?
    pub fn infer_output_type(&self, inputs: &[DataType]) -> Result<DataType> {
        if !self.accepts(inputs) {
            return Err(Error::InvalidInputTypes {
                op: self.name.to_string(),
                types: inputs.iter().map(|t| t.to_string()).collect(),
            });
        }
        (self.output_type)(inputs).ok_or_else(|| Error::InvalidOutputType(self.name.to_string()))
    }

    /// Does this operation belong to class `class`?
    pub fn is(&self, class: OpClass) -> bool {
        self.classes.contains(class)
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("classes", &self.classes)
            .finish()
    }
}
