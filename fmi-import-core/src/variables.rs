//! Variable index over a model description.
//!
//! The index classifies the declared variables and resolves `(base type, value reference)`
//! pairs back to the declaring variable. Value references are only unique within a base
//! type, so the base type is always part of the key.
//!
//! The index holds the description behind an [`Arc`] and never copies variables out of it.
//! Once built it is read-only and can be shared freely between threads.

use crate::description::{BaseType, Causality, ModelDescription, ModelVariable, ValueReference, Variability};
use crate::errors::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Number of variables per classification.
///
/// Each variable is counted exactly once in each of the three groups, so every group sums
/// to the total number of variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCounts {
    pub num_constants: usize,
    pub num_fixed: usize,
    pub num_tunable: usize,
    pub num_discrete: usize,
    pub num_continuous: usize,

    pub num_parameters: usize,
    pub num_calculated_parameters: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_local: usize,
    pub num_independent: usize,

    pub num_float64_vars: usize,
    pub num_float32_vars: usize,
    pub num_integer_vars: usize,
    pub num_bool_vars: usize,
    pub num_string_vars: usize,
    pub num_enum_vars: usize,
}

impl ModelCounts {
    pub fn variability_total(&self) -> usize {
        self.num_constants + self.num_fixed + self.num_tunable + self.num_discrete + self.num_continuous
    }

    pub fn causality_total(&self) -> usize {
        self.num_parameters
            + self.num_calculated_parameters
            + self.num_inputs
            + self.num_outputs
            + self.num_local
            + self.num_independent
    }

    pub fn base_type_total(&self) -> usize {
        self.num_float64_vars
            + self.num_float32_vars
            + self.num_integer_vars
            + self.num_bool_vars
            + self.num_string_vars
            + self.num_enum_vars
    }

    fn count(&mut self, variable: &ModelVariable) {
        match variable.variability {
            Variability::Constant => self.num_constants += 1,
            Variability::Fixed => self.num_fixed += 1,
            Variability::Tunable => self.num_tunable += 1,
            Variability::Discrete => self.num_discrete += 1,
            Variability::Continuous => self.num_continuous += 1,
        }
        match variable.causality {
            Causality::Parameter => self.num_parameters += 1,
            Causality::CalculatedParameter => self.num_calculated_parameters += 1,
            Causality::Input => self.num_inputs += 1,
            Causality::Output => self.num_outputs += 1,
            Causality::Local => self.num_local += 1,
            Causality::Independent => self.num_independent += 1,
        }
        match variable.base_type {
            BaseType::Float64 => self.num_float64_vars += 1,
            BaseType::Float32 => self.num_float32_vars += 1,
            BaseType::Int => self.num_integer_vars += 1,
            BaseType::Bool => self.num_bool_vars += 1,
            BaseType::String => self.num_string_vars += 1,
            BaseType::Enumeration => self.num_enum_vars += 1,
        }
    }
}

/// Lookup structure from `(base type, value reference)` to the declaring variable.
#[derive(Debug)]
pub struct VariableIndex {
    description: Arc<ModelDescription>,
    /// Position of each variable in `description.variables`.
    by_reference: HashMap<(BaseType, ValueReference), usize>,
}

impl VariableIndex {
    /// Build the index.
    ///
    /// Fails if two variables share a base type and value reference, in which case no
    /// index is produced.
    pub fn new(description: Arc<ModelDescription>) -> ImportResult<Self> {
        let mut by_reference = HashMap::with_capacity(description.variables.len());
        for (position, variable) in description.variables.iter().enumerate() {
            let key = (variable.base_type, variable.value_reference);
            if by_reference.insert(key, position).is_some() {
                return Err(ImportError::DuplicateValueReference {
                    base_type: variable.base_type,
                    value_reference: variable.value_reference,
                });
            }
        }
        Ok(Self {
            description,
            by_reference,
        })
    }

    pub fn description(&self) -> &ModelDescription {
        &self.description
    }

    pub fn len(&self) -> usize {
        self.description.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.description.variables.is_empty()
    }

    /// Classify every variable, starting from zeroed counters.
    pub fn counts(&self) -> ModelCounts {
        let mut counts = ModelCounts::default();
        for variable in &self.description.variables {
            counts.count(variable);
        }
        counts
    }

    pub fn lookup(&self, base_type: BaseType, value_reference: ValueReference) -> Option<&ModelVariable> {
        self.by_reference
            .get(&(base_type, value_reference))
            .map(|position| &self.description.variables[*position])
    }

    pub fn name_of<'a>(&self, variable: &'a ModelVariable) -> &'a str {
        &variable.name
    }
}
