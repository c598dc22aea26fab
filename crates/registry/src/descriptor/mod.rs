//! Boss descriptors: the declarative list of capabilities a boss type exposes.
//!
//! # Rules
//!
//! - The first entry is the primary capability (the boss's entry point) and is
//!   never a helper.
//! - A capability appears at most once as a non-helper entry.
//! - A helper names a non-helper primary declared before it. The same helper
//!   capability may serve several primaries; each `(helper, primary)` pair is
//!   one slot.
//! - A capability is either a non-helper entry or a helper, never both.
//!
//! A descriptor that extends a base is checked in two steps: its own entries
//! on definition, and the flattened list (base entries first) when the
//! registry resolves it.

use std::borrow::Cow;

use rustc_hash::FxHashSet;

use crate::capability::{CapabilityId, Interface};
use crate::error::{Error, Result};

#[cfg(test)]
mod tests;

/// One capability listed by a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorEntry {
	/// Capability constructed for this entry.
	pub capability: CapabilityId,
	/// Primary capability this entry supports, if it is a helper.
	pub helper_of: Option<CapabilityId>,
}

impl DescriptorEntry {
	/// Creates an externally visible capability entry.
	pub const fn new(capability: CapabilityId) -> Self {
		Self {
			capability,
			helper_of: None,
		}
	}

	/// Creates a helper entry supporting `primary`.
	pub const fn helper(capability: CapabilityId, primary: CapabilityId) -> Self {
		Self {
			capability,
			helper_of: Some(primary),
		}
	}

	/// Entry for contract `T`.
	pub const fn of<T: Interface + ?Sized>() -> Self {
		Self::new(T::ID)
	}

	/// Helper entry for contract `H` supporting contract `P`.
	pub const fn helper_for<H: Interface + ?Sized, P: Interface + ?Sized>() -> Self {
		Self::helper(H::ID, P::ID)
	}

	/// Returns true if this entry is a helper.
	pub fn is_helper(&self) -> bool {
		self.helper_of.is_some()
	}

	/// Key of the root slot this entry fills.
	pub fn slot_key(&self) -> SlotKey {
		SlotKey {
			capability: self.capability.clone(),
			primary: self.helper_of.clone(),
		}
	}
}

/// Key of one implementation slot on a root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
	/// Capability implemented by the slot.
	pub capability: CapabilityId,
	/// Primary served by the slot when it holds a helper.
	pub primary: Option<CapabilityId>,
}

impl SlotKey {
	/// Key of a non-helper slot.
	pub fn of(capability: CapabilityId) -> Self {
		Self {
			capability,
			primary: None,
		}
	}
}

impl core::fmt::Display for SlotKey {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match &self.primary {
			Some(primary) => write!(f, "{}(helper of {})", self.capability, primary),
			None => write!(f, "{}", self.capability),
		}
	}
}

/// Named, immutable aggregation of capabilities defining one boss type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossDescriptor {
	name: Cow<'static, str>,
	extends: Option<Cow<'static, str>>,
	entries: Vec<DescriptorEntry>,
}

impl BossDescriptor {
	/// Defines a standalone boss type.
	pub fn define(
		name: impl Into<Cow<'static, str>>,
		entries: impl IntoIterator<Item = DescriptorEntry>,
	) -> Result<Self> {
		let name = name.into();
		let entries: Vec<_> = entries.into_iter().collect();
		validate_entries(&name, &entries)?;
		Ok(Self {
			name,
			extends: None,
			entries,
		})
	}

	/// Defines a boss type that inherits every capability of `base`.
	///
	/// Own entries may be empty and may name helpers whose primary comes
	/// from the base; the full list is validated when the boss is resolved.
	pub fn extending(
		name: impl Into<Cow<'static, str>>,
		base: impl Into<Cow<'static, str>>,
		entries: impl IntoIterator<Item = DescriptorEntry>,
	) -> Result<Self> {
		let name = name.into();
		let base = base.into();
		if base == name {
			return Err(Error::InheritanceCycle { boss: name });
		}
		let entries: Vec<_> = entries.into_iter().collect();
		validate_own_entries(&name, &entries)?;
		Ok(Self {
			name,
			extends: Some(base),
			entries,
		})
	}

	/// Boss name.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
		&self.name
	}

	/// Base boss, if any.
	pub fn extends(&self) -> Option<&str> {
		self.extends.as_deref()
	}

	/// Entries declared by this descriptor, excluding inherited ones.
	pub fn entries(&self) -> &[DescriptorEntry] {
		&self.entries
	}
}

/// A descriptor flattened through its inheritance chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBoss {
	/// Boss name.
	pub name: Cow<'static, str>,
	/// The boss followed by its ancestors, nearest first.
	pub lineage: Vec<Cow<'static, str>>,
	/// Effective entries, base entries first.
	pub entries: Vec<DescriptorEntry>,
}

impl ResolvedBoss {
	/// The entry-point capability.
	pub fn primary(&self) -> Option<&CapabilityId> {
		self.entries.first().map(|e| &e.capability)
	}
}

fn invalid(boss: &Cow<'static, str>, reason: String) -> Error {
	Error::InvalidDescriptor {
		boss: boss.clone(),
		reason,
	}
}

fn duplicate(boss: &Cow<'static, str>, capability: &CapabilityId) -> Error {
	Error::DuplicateCapability {
		boss: boss.clone(),
		capability: capability.clone(),
	}
}

/// Checks a complete, flattened entry list.
pub(crate) fn validate_entries(boss: &Cow<'static, str>, entries: &[DescriptorEntry]) -> Result<()> {
	let Some(first) = entries.first() else {
		return Err(invalid(boss, "a boss needs at least one capability".into()));
	};
	if let Some(primary) = &first.helper_of {
		return Err(invalid(
			boss,
			format!("entry point {} is declared as a helper of {primary}", first.capability),
		));
	}

	let mut primaries: FxHashSet<&CapabilityId> = FxHashSet::default();
	let mut helpers: FxHashSet<&CapabilityId> = FxHashSet::default();
	let mut helper_slots: FxHashSet<(&CapabilityId, &CapabilityId)> = FxHashSet::default();

	for entry in entries {
		let cap = &entry.capability;
		match &entry.helper_of {
			None => {
				if helpers.contains(cap) || !primaries.insert(cap) {
					return Err(duplicate(boss, cap));
				}
			}
			Some(primary) => {
				if primary == cap {
					return Err(invalid(boss, format!("{cap} is declared as a helper of itself")));
				}
				if !primaries.contains(primary) {
					return Err(invalid(
						boss,
						format!("helper {cap} names {primary}, which is not an earlier primary capability"),
					));
				}
				if primaries.contains(cap) || !helper_slots.insert((cap, primary)) {
					return Err(duplicate(boss, cap));
				}
				helpers.insert(cap);
			}
		}
	}

	Ok(())
}

/// Checks the entries an extending descriptor declares itself.
fn validate_own_entries(boss: &Cow<'static, str>, entries: &[DescriptorEntry]) -> Result<()> {
	let mut seen: FxHashSet<SlotKey> = FxHashSet::default();
	for entry in entries {
		if entry.helper_of.as_ref() == Some(&entry.capability) {
			return Err(invalid(
				boss,
				format!("{} is declared as a helper of itself", entry.capability),
			));
		}
		if !seen.insert(entry.slot_key()) {
			return Err(duplicate(boss, &entry.capability));
		}
	}
	Ok(())
}
