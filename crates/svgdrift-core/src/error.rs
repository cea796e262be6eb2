//! Error types for svgdrift

use thiserror::Error;

/// Problems found while turning raw settings into a [`Configuration`](crate::Configuration).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("incomplete configuration, missing: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} is too large, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("settings parse error: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Problems with the shape a [`Template`](crate::Template) is built from.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template is not valid markup: {0}")]
    Malformed(String),

    #[error("template must contain an <svg> element")]
    MissingSvgRoot,

    #[error("template needs a <path> element to recolor")]
    MissingFillablePart,
}

impl From<roxmltree::Error> for TemplateError {
    fn from(err: roxmltree::Error) -> Self {
        TemplateError::Malformed(err.to_string())
    }
}

/// Errors surfaced by an [`Engine`](crate::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("host collaborator failed: {0}")]
    Host(Box<dyn std::error::Error + Send + Sync>),

    #[error("engine stopped after a fault: {0}")]
    Faulted(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_lists_every_field() {
        let err = ConfigError::Incomplete {
            missing: vec!["max_particles", "timeout"],
        };
        assert_eq!(
            err.to_string(),
            "incomplete configuration, missing: max_particles, timeout"
        );
    }

    #[test]
    fn template_error_converts_into_engine_error() {
        let err: EngineError = TemplateError::MissingFillablePart.into();
        assert!(matches!(
            err,
            EngineError::Template(TemplateError::MissingFillablePart)
        ));
    }
}
