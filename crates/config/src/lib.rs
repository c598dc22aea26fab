//! Boss definitions written in KDL.
//!
//! Boss types can be declared in configuration instead of code. Factories
//! still come from code (static registrations or plugins); a config file only
//! names which capabilities a boss aggregates.
//!
//! ```kdl
//! boss "Window" {
//!     capability "IWindow"
//!     capability "IDrawable"
//! }
//!
//! boss "Document" extends="Window" {
//!     capability "IUndoManager"
//!     capability "IUndoPolicy" helper-of="IUndoManager"
//! }
//! ```
//!
//! Unknown nodes and properties produce [`ConfigWarning`]s collected in
//! [`BossConfig::warnings`] rather than failing the parse. Defining a boss
//! twice is an error, whether in one document or across merged ones; configs
//! add bosses but never override them.

pub mod boss;
pub mod error;

use std::path::Path;

pub use boss::{BossSpec, CapabilitySpec};
pub use error::{ConfigError, ConfigWarning, Result};
use whisper_registry::Registry;

/// Parsed boss definitions from one or more KDL documents.
#[derive(Debug, Clone, Default)]
pub struct BossConfig {
	/// Boss definitions in document order.
	pub bosses: Vec<BossSpec>,
	/// Non-fatal warnings encountered during parsing.
	pub warnings: Vec<ConfigWarning>,
}

impl BossConfig {
	/// Parse a KDL string into a [`BossConfig`].
	pub fn parse(input: &str) -> Result<Self> {
		let doc: kdl::KdlDocument = input.parse()?;
		let mut config = BossConfig::default();

		for node in doc.nodes() {
			match node.name().value() {
				"boss" => {
					let spec = boss::parse_boss_node(node, &mut config.warnings)?;
					config.insert(spec)?;
				}
				other => config.warnings.push(ConfigWarning::UnknownNode {
					node: other.to_string(),
					found_in: "document",
				}),
			}
		}

		Ok(config)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Load every `*.kdl` file in `dir`, in file name order.
	///
	/// Files that fail to read or parse are skipped with a logged warning. A
	/// boss defined in two files fails with [`ConfigError::DuplicateBoss`].
	pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
		let dir = dir.as_ref();
		let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
			path: dir.to_path_buf(),
			error: e,
		})?;

		let mut paths: Vec<_> = entries
			.flatten()
			.map(|entry| entry.path())
			.filter(|path| path.extension().is_some_and(|ext| ext == "kdl"))
			.collect();
		paths.sort();

		let mut config = BossConfig::default();
		for path in paths {
			match Self::load(&path) {
				Ok(other) => config.merge(other)?,
				Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to load boss config"),
			}
		}
		Ok(config)
	}

	/// Merge another config into this one.
	///
	/// Fails with [`ConfigError::DuplicateBoss`] if `other` defines a boss this
	/// config already has; `self` is left unchanged.
	pub fn merge(&mut self, other: BossConfig) -> Result<()> {
		if let Some(spec) = other.bosses.iter().find(|spec| self.get(&spec.name).is_some()) {
			tracing::warn!(boss = %spec.name, "boss defined in more than one config");
			return Err(ConfigError::DuplicateBoss {
				boss: spec.name.clone(),
			});
		}
		self.warnings.extend(other.warnings);
		self.bosses.extend(other.bosses);
		Ok(())
	}

	/// Defines every parsed boss on `registry`, returning how many were added.
	///
	/// Stops at the first boss the registry rejects; earlier bosses stay defined.
	pub fn apply(&self, registry: &Registry) -> Result<usize> {
		for spec in &self.bosses {
			let descriptor = spec.to_descriptor()?;
			registry.define_boss(descriptor).inspect_err(|e| {
				tracing::warn!(boss = %spec.name, error = %e, "registry rejected configured boss");
			})?;
			tracing::debug!(
				registry = registry.label(),
				boss = %spec.name,
				capabilities = spec.capabilities.len(),
				"defined boss from config"
			);
		}
		Ok(self.bosses.len())
	}

	/// Looks up a parsed boss by name.
	pub fn get(&self, name: &str) -> Option<&BossSpec> {
		self.bosses.iter().find(|spec| spec.name == name)
	}

	fn insert(&mut self, spec: BossSpec) -> Result<()> {
		if self.get(&spec.name).is_some() {
			return Err(ConfigError::DuplicateBoss { boss: spec.name });
		}
		self.bosses.push(spec);
		Ok(())
	}
}

#[cfg(test)]
mod tests;
