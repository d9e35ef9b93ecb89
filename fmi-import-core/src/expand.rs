//! Expansion of variable references embedded in log messages.
//!
//! Modules may refer to variables in their log messages with tokens of the form
//! `#<type><value reference>#`, where `<type>` is `i` (integer), `b` (boolean) or `s`
//! (string). The expander replaces each token with the name of the variable and turns
//! `##` into a single `#`:
//!
//! ```text
//! "#i5# exceeded its limit"   ->  "height exceeded its limit"
//! "value is ##10## done"      ->  "value is #10# done"
//! ```
//!
//! Float variables cannot be referenced: value references are about to stop being scoped
//! by type, and until then `r` is rejected like any other unknown type character.
//!
//! A malformed token never produces a partially expanded message. The caller gets the
//! original text back together with a warning describing the offending fragment.

use crate::description::BaseType;
use crate::logging::{BufferError, Callbacks, LogLevel, MessageBuffer};
use crate::variables::VariableIndex;
use thiserror::Error;

/// Module tag for expansion diagnostics.
pub const MODULE: &str = "LOGGER";

/// Extra room reserved on top of the template length before scanning.
const RESERVE_EXTRA: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("Expected type specification character 'i', 'b' or 's' in log message here: '{fragment}'")]
    UnknownType { fragment: String },
    #[error("Expected value reference in log message here: '{fragment}'")]
    MissingReference { fragment: String },
    #[error("Expected terminating '#' in log message here: '{fragment}'")]
    MissingTerminator { fragment: String },
    #[error("Could not decode value reference in log message here: '{fragment}'")]
    InvalidReference { fragment: String },
    #[error("Could not find variable referenced in log message here: '{fragment}'")]
    UnresolvedReference { fragment: String },
    #[error("Could not allocate memory for the log message: {0}")]
    Buffer(#[from] BufferError),
}

fn base_type_for(type_char: u8) -> Option<BaseType> {
    match type_char {
        b'i' => Some(BaseType::Int),
        b'b' => Some(BaseType::Bool),
        b's' => Some(BaseType::String),
        _ => None,
    }
}

/// Expand `template` into `out`.
///
/// On error the content of `out` is unspecified; [`expand_variable_references`] takes
/// care of restoring the original message.
pub fn expand_into(
    out: &mut MessageBuffer,
    template: &str,
    index: &VariableIndex,
) -> Result<(), ExpandError> {
    out.clear();
    // Head room is best effort; only content written below is held to the limit.
    out.try_reserve((template.len() + RESERVE_EXTRA).min(out.limit()))?;

    let bytes = template.as_bytes();
    let fragment = |out: &MessageBuffer, token: &str| format!("{}{}", out.as_str(), token);
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'#' {
            i += 1;
            continue;
        }
        out.try_push_str(&template[literal_start..i])?;

        if bytes.get(i + 1) == Some(&b'#') {
            out.try_push_str("#")?;
            i += 2;
            literal_start = i;
            continue;
        }

        let Some(base_type) = bytes.get(i + 1).copied().and_then(base_type_for) else {
            let token_end = template[i + 1..]
                .chars()
                .next()
                .map_or(i + 1, |c| i + 1 + c.len_utf8());
            return Err(ExpandError::UnknownType {
                fragment: fragment(out, &template[i..token_end]),
            });
        };

        let digits_start = i + 2;
        let mut digits_end = digits_start;
        while digits_end < bytes.len() && bytes[digits_end].is_ascii_digit() {
            digits_end += 1;
        }
        let token = &template[i..digits_end];
        if digits_end == digits_start {
            return Err(ExpandError::MissingReference {
                fragment: fragment(out, token),
            });
        }
        if bytes.get(digits_end) != Some(&b'#') {
            return Err(ExpandError::MissingTerminator {
                fragment: fragment(out, token),
            });
        }

        let value_reference: u32 = template[digits_start..digits_end]
            .parse()
            .map_err(|_| ExpandError::InvalidReference {
                fragment: fragment(out, token),
            })?;
        let Some(variable) = index.lookup(base_type, value_reference) else {
            return Err(ExpandError::UnresolvedReference {
                fragment: fragment(out, token),
            });
        };

        let name = index.name_of(variable);
        out.try_reserve_exact(name.len())?;
        out.try_push_str(name)?;

        i = digits_end + 1;
        literal_start = i;
    }

    out.try_push_str(&template[literal_start..])?;
    Ok(())
}

/// Expand `template` into `out`, falling back to the unexpanded template.
///
/// Any failure is reported as a warning through `callbacks`. If not even the original
/// template fits, `out` holds the sentinel message.
pub fn expand_variable_references(
    out: &mut MessageBuffer,
    template: &str,
    index: &VariableIndex,
    callbacks: &Callbacks,
) {
    if let Err(err) = expand_into(out, template, index) {
        callbacks.emit(MODULE, LogLevel::Warning, &err.to_string());
        if out.try_set(template).is_err() {
            out.set_sentinel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{Causality, FmuKind, ModelDescription, ModelVariable, Variability};
    use crate::logging::{MemoryLogger, SENTINEL};
    use std::sync::Arc;

    fn index() -> VariableIndex {
        let description = ModelDescription::new("Ball", "3.0", "", vec![FmuKind::CoSimulation])
            .with_variable(ModelVariable::new(
                "height",
                5,
                BaseType::Int,
                Causality::Output,
                Variability::Discrete,
            ))
            .with_variable(ModelVariable::new(
                "on_ground",
                5,
                BaseType::Bool,
                Causality::Output,
                Variability::Discrete,
            ))
            .with_variable(ModelVariable::new(
                "label",
                1,
                BaseType::String,
                Causality::Parameter,
                Variability::Fixed,
            ))
            .with_variable(ModelVariable::new(
                "h",
                5,
                BaseType::Float64,
                Causality::Output,
                Variability::Continuous,
            ));
        VariableIndex::new(Arc::new(description)).unwrap()
    }

    fn expand(template: &str) -> Result<String, ExpandError> {
        let mut out = MessageBuffer::new(16, 4096);
        expand_into(&mut out, template, &index())?;
        Ok(out.as_str().to_string())
    }

    fn expand_logged(template: &str) -> (String, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let callbacks = Callbacks::new(logger.clone(), LogLevel::All);
        let mut out = MessageBuffer::new(16, 4096);
        expand_variable_references(&mut out, template, &index(), &callbacks);
        assert_eq!(out.as_c_str().to_bytes(), out.as_bytes());
        (out.as_str().to_string(), logger)
    }

    #[test]
    fn text_without_references_is_unchanged() {
        assert_eq!(expand("no refs here").unwrap(), "no refs here");
        assert_eq!(expand("").unwrap(), "");
    }

    #[test]
    fn escaped_hashes_collapse() {
        assert_eq!(expand("value is ##10## done").unwrap(), "value is #10# done");
        assert_eq!(expand("####").unwrap(), "##");
    }

    #[test]
    fn references_are_replaced_by_names() {
        assert_eq!(expand("#i5#").unwrap(), "height");
        assert_eq!(
            expand("#b5# while #i5# grows, see #s1#.").unwrap(),
            "on_ground while height grows, see label."
        );
        assert_eq!(expand("ünï #i5# ✓").unwrap(), "ünï height ✓");
    }

    #[test]
    fn name_longer_than_reserve_is_substituted() {
        let long = "x".repeat(500);
        let description = ModelDescription::new("Long", "3.0", "", vec![FmuKind::CoSimulation])
            .with_variable(ModelVariable::new(
                long.clone(),
                0,
                BaseType::Int,
                Causality::Local,
                Variability::Discrete,
            ));
        let index = VariableIndex::new(Arc::new(description)).unwrap();
        let mut out = MessageBuffer::new(4, 4096);
        expand_into(&mut out, "[#i0#][#i0#]", &index).unwrap();
        assert_eq!(out.as_str(), format!("[{long}][{long}]"));
    }

    #[test]
    fn malformed_tokens() {
        assert!(matches!(
            expand("#x5#"),
            Err(ExpandError::UnknownType { fragment }) if fragment == "#x"
        ));
        assert!(matches!(expand("#r5#"), Err(ExpandError::UnknownType { .. })));
        assert!(matches!(expand("end #"), Err(ExpandError::UnknownType { .. })));
        assert!(matches!(
            expand("a #i# b"),
            Err(ExpandError::MissingReference { fragment }) if fragment == "a #i"
        ));
        assert!(matches!(
            expand("#i5 and more"),
            Err(ExpandError::MissingTerminator { fragment }) if fragment == "#i5"
        ));
        assert!(matches!(
            expand("#i99999999999#"),
            Err(ExpandError::InvalidReference { .. })
        ));
        assert!(matches!(
            expand("ok #i5#, #i6#"),
            Err(ExpandError::UnresolvedReference { fragment }) if fragment == "ok height, #i6"
        ));
    }

    #[test]
    fn failure_returns_original_and_warns() {
        let (text, logger) = expand_logged("#x5#");
        assert_eq!(text, "#x5#");
        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].module, MODULE);
        assert_eq!(records[0].level, LogLevel::Warning);
        assert!(records[0].message.contains("'#x'"));

        let (text, logger) = expand_logged("#i7#");
        assert_eq!(text, "#i7#");
        assert!(logger.records()[0]
            .message
            .starts_with("Could not find variable referenced"));
    }

    #[test]
    fn success_does_not_warn() {
        let (text, logger) = expand_logged("#i5# landed");
        assert_eq!(text, "height landed");
        assert!(logger.records().is_empty());
    }

    #[test]
    fn expands_close_to_the_limit() {
        let template = format!("#i5# {}", "x".repeat(920));
        let mut out = MessageBuffer::new(64, 1000);
        expand_into(&mut out, &template, &index()).unwrap();
        assert_eq!(out.len(), 927);

        let logger = Arc::new(MemoryLogger::new());
        let callbacks = Callbacks::new(logger.clone(), LogLevel::All);
        let exact = format!("#i5#{}", "x".repeat(994));
        expand_variable_references(&mut out, &exact, &index(), &callbacks);
        assert_eq!(out.len(), 1000);
        assert!(out.as_str().starts_with("heightx"));
        assert!(logger.records().is_empty());
    }

    #[test]
    fn buffer_limit_degrades_to_sentinel() {
        let logger = Arc::new(MemoryLogger::new());
        let callbacks = Callbacks::new(logger.clone(), LogLevel::Warning);
        let mut out = MessageBuffer::new(8, 32);
        let template = "a template that is longer than the thirty-two byte limit";
        expand_variable_references(&mut out, template, &index(), &callbacks);
        assert_eq!(out.as_str(), SENTINEL);
        assert!(logger.records()[0]
            .message
            .starts_with("Could not allocate memory"));
    }
}
