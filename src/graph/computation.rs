//! Computations: pure functions from input cells to output cells.

use std::fmt;

use super::cell::CellValue;
use crate::error::GraphError;

/// Result of one computation execution, one value per declared output.
pub type ComputeResult = Result<Vec<CellValue>, GraphError>;

/// Function body of a computation. Receives the current input values in
/// declaration order.
pub type ComputeFn = Box<dyn Fn(&[&CellValue]) -> ComputeResult>;

/// A registered computation.
pub struct Computation {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    func: ComputeFn,
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl Computation {
    /// Starts a computation declaration.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ComputationBuilder {
        ComputationBuilder {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// A computation with no inputs runs exactly once, when the engine is built.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inputs.is_empty()
    }

    pub(crate) fn call(&self, inputs: &[&CellValue]) -> ComputeResult {
        (self.func)(inputs)
    }
}

/// Builder for [`Computation`].
#[derive(Debug)]
pub struct ComputationBuilder {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl ComputationBuilder {
    /// Declares the input cells, in the order the function receives them.
    #[must_use]
    pub fn reads<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(cells.into_iter().map(Into::into));
        self
    }

    /// Declares the output cells, in the order the function returns them.
    #[must_use]
    pub fn writes<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(cells.into_iter().map(Into::into));
        self
    }

    /// Attaches the function body.
    pub fn compute<F>(self, func: F) -> Computation
    where
        F: Fn(&[&CellValue]) -> ComputeResult + 'static,
    {
        Computation {
            name: self.name,
            inputs: self.inputs,
            outputs: self.outputs,
            func: Box::new(func),
        }
    }
}
