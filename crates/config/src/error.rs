//! Error types for configuration parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing KDL syntax.
	#[error("KDL parse error: {0}")]
	Kdl(#[from] kdl::KdlError),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A required field is missing from the configuration.
	#[error("missing required field: {0}")]
	MissingField(String),

	/// A property has a value of the wrong type.
	#[error("invalid value for {property} on {node}: expected a string")]
	InvalidValue {
		/// Node carrying the property.
		node: String,
		/// The property name.
		property: String,
	},

	/// A boss is defined twice, in one document or across merged documents.
	#[error("boss '{boss}' is defined more than once")]
	DuplicateBoss {
		/// The boss name.
		boss: String,
	},

	/// The registry rejected a parsed boss.
	#[error(transparent)]
	Registry(#[from] whisper_registry::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Non-fatal warning during configuration parsing.
///
/// These warnings are collected during parsing and reported to the user,
/// but do not prevent the configuration from being loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
	/// A node this schema does not know.
	UnknownNode {
		/// The node name.
		node: String,
		/// Where it was found (e.g., "boss block").
		found_in: &'static str,
	},
	/// A property this schema does not know.
	UnknownProperty {
		/// The property name.
		property: String,
		/// Node carrying the property.
		node: String,
	},
}

impl std::fmt::Display for ConfigWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigWarning::UnknownNode { node, found_in } => {
				write!(f, "unknown node '{node}' in {found_in} will be ignored")
			}
			ConfigWarning::UnknownProperty { property, node } => {
				write!(f, "unknown property '{property}' on {node} will be ignored")
			}
		}
	}
}
