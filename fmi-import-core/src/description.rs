//! In-memory model description.
//!
//! The model description document is parsed outside of this crate. Whatever parser the
//! host uses hands over a [`ModelDescription`]: module metadata plus the ordered list of
//! declared variables. The types derive serde traits so a description can also be
//! written by hand, e.g. in TOML:
//!
//! ```toml
//! model_name = "BouncingBall"
//! fmi_version = "3.0-alpha"
//! instantiation_token = "{8c4e810f-3df3-4a00-8276-176fa3c9f003}"
//! kinds = ["CoSimulation"]
//!
//! [[variables]]
//! name = "h"
//! value_reference = 0
//! base_type = "Float64"
//! causality = "Output"
//! variability = "Continuous"
//! ```

use crate::errors::ImportResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier of a variable, unique only within its base type.
pub type ValueReference = u32;

/// Base type of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Float64,
    Float32,
    Int,
    Bool,
    String,
    Enumeration,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Float64 => write!(f, "Float64"),
            BaseType::Float32 => write!(f, "Float32"),
            BaseType::Int => write!(f, "Int"),
            BaseType::Bool => write!(f, "Bool"),
            BaseType::String => write!(f, "String"),
            BaseType::Enumeration => write!(f, "Enumeration"),
        }
    }
}

/// Role of a variable in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Causality {
    Parameter,
    CalculatedParameter,
    Input,
    Output,
    Local,
    /// The independent variable, usually time.
    Independent,
}

/// How often the value of a variable may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variability {
    Constant,
    Fixed,
    Tunable,
    Discrete,
    Continuous,
}

/// Flavour of a native module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FmuKind {
    /// The host integrates the continuous states.
    ModelExchange,
    /// The module carries its own solver and advances itself in steps.
    CoSimulation,
}

impl FmuKind {
    /// Value passed across the native boundary to `fmi3Instantiate`.
    pub fn as_raw(self) -> i32 {
        match self {
            FmuKind::ModelExchange => 0,
            FmuKind::CoSimulation => 1,
        }
    }
}

impl fmt::Display for FmuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmuKind::ModelExchange => write!(f, "model exchange"),
            FmuKind::CoSimulation => write!(f, "co-simulation"),
        }
    }
}

/// A variable declared in the model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariable {
    pub name: String,
    pub value_reference: ValueReference,
    pub base_type: BaseType,
    pub causality: Causality,
    pub variability: Variability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelVariable {
    pub fn new(
        name: impl Into<String>,
        value_reference: ValueReference,
        base_type: BaseType,
        causality: Causality,
        variability: Variability,
    ) -> Self {
        Self {
            name: name.into(),
            value_reference,
            base_type,
            causality,
            variability,
            description: None,
        }
    }
}

/// Parsed model description of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub model_name: String,
    /// Interface version declared by the description, e.g. "3.0-alpha".
    pub fmi_version: String,
    /// Token the module checks on instantiation to make sure it matches its description.
    pub instantiation_token: String,
    /// Kinds the module implements.
    pub kinds: Vec<FmuKind>,
    /// Variables in declaration order.
    #[serde(default)]
    pub variables: Vec<ModelVariable>,
}

impl ModelDescription {
    pub fn new(
        model_name: impl Into<String>,
        fmi_version: impl Into<String>,
        instantiation_token: impl Into<String>,
        kinds: Vec<FmuKind>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            fmi_version: fmi_version.into(),
            instantiation_token: instantiation_token.into(),
            kinds,
            variables: vec![],
        }
    }

    /// Append a variable, keeping declaration order.
    pub fn with_variable(mut self, variable: ModelVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn supports(&self, kind: FmuKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn from_toml_str(content: &str) -> ImportResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ImportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Major component of an interface version string ("3.0-alpha" -> "3").
pub(crate) fn major_version(version: &str) -> &str {
    version
        .split(|c: char| c == '.' || c == '-')
        .next()
        .unwrap_or(version)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_toml_description() {
        let description = ModelDescription::from_toml_str(
            r#"
model_name = "BouncingBall"
fmi_version = "3.0-alpha"
instantiation_token = "{8c4e810f}"
kinds = ["CoSimulation", "ModelExchange"]

[[variables]]
name = "h"
value_reference = 0
base_type = "Float64"
causality = "Output"
variability = "Continuous"
description = "Height of the ball"

[[variables]]
name = "bounces"
value_reference = 0
base_type = "Int"
causality = "Output"
variability = "Discrete"
"#,
        )
        .unwrap();

        assert_eq!(description.variables.len(), 2);
        assert!(description.supports(FmuKind::CoSimulation));
        assert!(description.supports(FmuKind::ModelExchange));
        assert_eq!(description.variables[1].base_type, BaseType::Int);
        assert_eq!(
            description.variables[0].description.as_deref(),
            Some("Height of the ball")
        );
    }

    #[test]
    fn unknown_causality_is_rejected() {
        let result = ModelDescription::from_toml_str(
            r#"
model_name = "Broken"
fmi_version = "3.0"
instantiation_token = ""
kinds = ["CoSimulation"]

[[variables]]
name = "x"
value_reference = 0
base_type = "Float64"
causality = "Sideways"
variability = "Continuous"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn major_versions() {
        assert_eq!(major_version("3.0-alpha"), "3");
        assert_eq!(major_version("3"), "3");
        assert_eq!(major_version("2.0"), "2");
    }
}
