//! `boss { }` node parsing.

use kdl::KdlNode;
use whisper_registry::{BossDescriptor, CapabilityId, DescriptorEntry};

use crate::error::{ConfigError, ConfigWarning, Result};

/// One boss definition read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossSpec {
	/// Boss type name.
	pub name: String,
	/// Base boss, from the `extends` property.
	pub extends: Option<String>,
	/// Capabilities in declaration order.
	pub capabilities: Vec<CapabilitySpec>,
}

/// One `capability` child of a boss node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySpec {
	pub id: String,
	/// Primary served, from the `helper-of` property.
	pub helper_of: Option<String>,
}

impl BossSpec {
	/// Converts the definition into a registry descriptor.
	///
	/// Structural rules (order, duplicates, helpers) are checked here.
	pub fn to_descriptor(&self) -> whisper_registry::Result<BossDescriptor> {
		let entries = self.capabilities.iter().map(|cap| {
			let capability = CapabilityId::from(cap.id.clone());
			match &cap.helper_of {
				Some(primary) => DescriptorEntry::helper(capability, CapabilityId::from(primary.clone())),
				None => DescriptorEntry::new(capability),
			}
		});
		match &self.extends {
			Some(base) => BossDescriptor::extending(self.name.clone(), base.clone(), entries),
			None => BossDescriptor::define(self.name.clone(), entries),
		}
	}
}

/// Parse a `boss "Name" extends="Base" { capability "Id" }` node.
pub fn parse_boss_node(node: &KdlNode, warnings: &mut Vec<ConfigWarning>) -> Result<BossSpec> {
	let name = node
		.get(0)
		.and_then(|v| v.as_string())
		.ok_or_else(|| ConfigError::MissingField("boss name".into()))?
		.to_string();
	let label = format!("boss '{name}'");

	let mut extends = None;
	for entry in node.entries() {
		let Some(property) = entry.name() else {
			continue;
		};
		match property.value() {
			"extends" => {
				let base = entry.value().as_string().ok_or_else(|| ConfigError::InvalidValue {
					node: label.clone(),
					property: "extends".into(),
				})?;
				extends = Some(base.to_string());
			}
			other => warnings.push(ConfigWarning::UnknownProperty {
				property: other.to_string(),
				node: label.clone(),
			}),
		}
	}

	let mut capabilities = Vec::new();
	if let Some(children) = node.children() {
		for child in children.nodes() {
			match child.name().value() {
				"capability" => capabilities.push(parse_capability_node(child, &label, warnings)?),
				other => warnings.push(ConfigWarning::UnknownNode {
					node: other.to_string(),
					found_in: "boss block",
				}),
			}
		}
	}

	Ok(BossSpec {
		name,
		extends,
		capabilities,
	})
}

fn parse_capability_node(node: &KdlNode, boss: &str, warnings: &mut Vec<ConfigWarning>) -> Result<CapabilitySpec> {
	let id = node
		.get(0)
		.and_then(|v| v.as_string())
		.ok_or_else(|| ConfigError::MissingField(format!("capability id in {boss}")))?
		.to_string();

	let mut helper_of = None;
	for entry in node.entries() {
		let Some(property) = entry.name() else {
			continue;
		};
		match property.value() {
			"helper-of" => {
				let primary = entry.value().as_string().ok_or_else(|| ConfigError::InvalidValue {
					node: format!("capability '{id}' in {boss}"),
					property: "helper-of".into(),
				})?;
				helper_of = Some(primary.to_string());
			}
			other => warnings.push(ConfigWarning::UnknownProperty {
				property: other.to_string(),
				node: format!("capability '{id}' in {boss}"),
			}),
		}
	}

	Ok(CapabilitySpec { id, helper_of })
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn parse(kdl: &str) -> (Result<BossSpec>, Vec<ConfigWarning>) {
		let doc: kdl::KdlDocument = kdl.parse().unwrap();
		let mut warnings = Vec::new();
		let spec = parse_boss_node(doc.get("boss").unwrap(), &mut warnings);
		(spec, warnings)
	}

	#[test]
	fn test_parse_boss_with_helper() {
		let (spec, warnings) = parse(
			r#"
boss "Document" extends="Window" {
    capability "IUndoManager"
    capability "IUndoPolicy" helper-of="IUndoManager"
}
"#,
		);
		assert_eq!(
			spec.unwrap(),
			BossSpec {
				name: "Document".into(),
				extends: Some("Window".into()),
				capabilities: vec![
					CapabilitySpec {
						id: "IUndoManager".into(),
						helper_of: None,
					},
					CapabilitySpec {
						id: "IUndoPolicy".into(),
						helper_of: Some("IUndoManager".into()),
					},
				],
			}
		);
		assert!(warnings.is_empty());
	}

	#[test]
	fn test_missing_name_is_an_error() {
		let (spec, _) = parse("boss { capability \"IWindow\" }");
		assert!(matches!(spec, Err(ConfigError::MissingField(_))));

		let (spec, _) = parse("boss \"Window\" { capability }");
		assert!(matches!(spec, Err(ConfigError::MissingField(_))));
	}

	#[test]
	fn test_non_string_extends_is_rejected() {
		let (spec, _) = parse("boss \"Window\" extends=3 { capability \"IWindow\" }");
		assert!(matches!(spec, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn test_unknown_nodes_and_properties_warn() {
		let (spec, warnings) = parse(
			r#"
boss "Window" color="red" {
    capability "IWindow" lazy=#true
    menu "File"
}
"#,
		);
		assert_eq!(spec.unwrap().capabilities.len(), 1);
		assert_eq!(
			warnings,
			vec![
				ConfigWarning::UnknownProperty {
					property: "color".into(),
					node: "boss 'Window'".into(),
				},
				ConfigWarning::UnknownProperty {
					property: "lazy".into(),
					node: "capability 'IWindow' in boss 'Window'".into(),
				},
				ConfigWarning::UnknownNode {
					node: "menu".into(),
					found_in: "boss block",
				},
			]
		);
	}

	#[test]
	fn test_descriptor_conversion_validates() {
		let (spec, _) = parse(
			r#"
boss "Odd" {
    capability "IPolicy" helper-of="IAlgo"
    capability "IAlgo"
}
"#,
		);
		let err = spec.unwrap().to_descriptor().unwrap_err();
		assert!(matches!(err, whisper_registry::Error::InvalidDescriptor { .. }), "{err}");
	}
}
