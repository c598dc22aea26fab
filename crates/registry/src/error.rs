//! Error types for the object model.

use std::borrow::Cow;

use thiserror::Error;

use crate::capability::CapabilityId;

/// Boxed error carried by a failing factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a capability factory while constructing its implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ComponentError {
	message: String,
	#[source]
	source: Option<BoxError>,
}

impl ComponentError {
	/// Creates an error with a message only.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
		}
	}

	/// Creates an error wrapping an underlying cause.
	pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
		Self {
			message: message.into(),
			source: Some(source.into()),
		}
	}

	/// Returns the message without the source chain.
	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Errors raised by the registry, descriptors and roots.
///
/// Absence of an optional capability is never an error: queries return `None`.
#[derive(Debug, Error)]
pub enum Error {
	/// No descriptor is registered under this boss name.
	#[error("unknown boss type: {boss:?}")]
	UnknownBossType { boss: Cow<'static, str> },

	/// A descriptor references a capability with no factory on the boss or any ancestor.
	#[error("boss {boss:?} has no factory for capability {capability}")]
	MissingCapabilityFactory {
		boss: Cow<'static, str>,
		capability: CapabilityId,
	},

	/// Two bindings for the same capability on one boss, descriptor or root.
	#[error("duplicate capability {capability} on boss {boss:?}")]
	DuplicateCapability {
		boss: Cow<'static, str>,
		capability: CapabilityId,
	},

	/// A second descriptor was defined under an existing boss name.
	#[error("boss {boss:?} is already defined")]
	DuplicateBoss { boss: Cow<'static, str> },

	/// A descriptor violates a structural rule.
	#[error("invalid descriptor for boss {boss:?}: {reason}")]
	InvalidDescriptor {
		boss: Cow<'static, str>,
		reason: String,
	},

	/// A boss extends itself through its chain of bases.
	#[error("boss {boss:?} inherits from itself")]
	InheritanceCycle { boss: Cow<'static, str> },

	/// Two distinct contract types were bound to one identifier.
	#[error("capability {capability} is bound to both {existing} and {incoming}")]
	CapabilityConflict {
		capability: CapabilityId,
		existing: &'static str,
		incoming: &'static str,
	},

	/// An implementation or typed request does not match the expected contract.
	#[error("boss {boss:?} does not provide capability {capability} with the requested type")]
	CapabilityMismatch {
		boss: Cow<'static, str>,
		capability: CapabilityId,
	},

	/// A factory failed; siblings built so far were released.
	#[error("constructing capability {capability} for boss {boss:?} failed: {source}")]
	Construction {
		boss: Cow<'static, str>,
		capability: CapabilityId,
		#[source]
		source: ComponentError,
	},
}

/// Result type for object model operations.
pub type Result<T> = std::result::Result<T, Error>;
