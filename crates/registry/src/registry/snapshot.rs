//! Immutable registry state published through `ArcSwap`.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{OverridePolicy, RegistrySource};
use crate::capability::CapabilityId;
use crate::component::Factory;
use crate::descriptor::{BossDescriptor, ResolvedBoss, validate_entries};
use crate::error::{Error, Result};

/// Contract type bound to a capability identifier.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding {
	pub(crate) type_id: TypeId,
	pub(crate) type_name: &'static str,
}

pub(crate) struct FactoryEntry {
	pub(crate) capability: CapabilityId,
	pub(crate) binding: Binding,
	pub(crate) source: RegistrySource,
	pub(crate) factory: Factory,
}

type FactoryTable = FxHashMap<Cow<'static, str>, FxHashMap<CapabilityId, Arc<FactoryEntry>>>;

/// One published generation of the registry.
///
/// Maps sit behind `Arc` so publishing a change copies only the map it touches.
#[derive(Clone, Default)]
pub(crate) struct Snapshot {
	pub(crate) bosses: Arc<BTreeMap<Cow<'static, str>, Arc<BossDescriptor>>>,
	pub(crate) factories: Arc<FactoryTable>,
	pub(crate) bindings: Arc<FxHashMap<CapabilityId, Binding>>,
	pub(crate) generation: u64,
}

impl Snapshot {
	pub(crate) fn define_boss(&mut self, descriptor: Arc<BossDescriptor>) -> Result<()> {
		if self.bosses.contains_key(descriptor.name()) {
			return Err(Error::DuplicateBoss {
				boss: descriptor.name_cow().clone(),
			});
		}
		Arc::make_mut(&mut self.bosses).insert(descriptor.name_cow().clone(), descriptor);
		Ok(())
	}

	/// Adds a factory; returns true when it replaced an earlier one.
	pub(crate) fn insert_factory(
		&mut self,
		boss: &Cow<'static, str>,
		entry: Arc<FactoryEntry>,
		policy: OverridePolicy,
	) -> Result<bool> {
		if let Some(bound) = self.bindings.get(&entry.capability)
			&& bound.type_id != entry.binding.type_id
		{
			return Err(Error::CapabilityConflict {
				capability: entry.capability.clone(),
				existing: bound.type_name,
				incoming: entry.binding.type_name,
			});
		}

		let exists = self
			.factories
			.get(boss.as_ref())
			.is_some_and(|per_boss| per_boss.contains_key(&entry.capability));
		if exists && policy == OverridePolicy::Reject {
			return Err(Error::DuplicateCapability {
				boss: boss.clone(),
				capability: entry.capability.clone(),
			});
		}

		Arc::make_mut(&mut self.bindings)
			.entry(entry.capability.clone())
			.or_insert(entry.binding);
		Arc::make_mut(&mut self.factories)
			.entry(boss.clone())
			.or_default()
			.insert(entry.capability.clone(), entry);
		Ok(exists)
	}

	/// Follows `extends` links from `boss` and flattens the entry lists.
	pub(crate) fn resolve(&self, boss: &str) -> Result<ResolvedBoss> {
		let desc = self.bosses.get(boss).ok_or_else(|| Error::UnknownBossType {
			boss: Cow::Owned(boss.to_owned()),
		})?;

		let mut chain = vec![desc.as_ref()];
		let mut lineage = vec![desc.name_cow().clone()];
		let mut next = desc.extends();
		while let Some(base) = next {
			let Some(ancestor) = self.bosses.get(base) else {
				tracing::warn!(boss = %desc.name(), base, "boss extends an undefined base");
				return Err(Error::UnknownBossType {
					boss: Cow::Owned(base.to_owned()),
				});
			};
			if lineage.iter().any(|name| name == ancestor.name_cow()) {
				return Err(Error::InheritanceCycle {
					boss: desc.name_cow().clone(),
				});
			}
			lineage.push(ancestor.name_cow().clone());
			chain.push(ancestor.as_ref());
			next = ancestor.extends();
		}

		let entries: Vec<_> = chain
			.iter()
			.rev()
			.flat_map(|d| d.entries().iter().cloned())
			.collect();
		validate_entries(desc.name_cow(), &entries)?;

		Ok(ResolvedBoss {
			name: desc.name_cow().clone(),
			lineage,
			entries,
		})
	}

	/// Finds the factory for `capability`, nearest boss in `lineage` first.
	pub(crate) fn find_factory<'s>(
		&'s self,
		lineage: &'s [Cow<'static, str>],
		capability: &CapabilityId,
	) -> Option<(&'s str, &'s Arc<FactoryEntry>)> {
		lineage.iter().find_map(|boss| {
			let entry = self.factories.get(boss.as_ref())?.get(capability)?;
			Some((boss.as_ref(), entry))
		})
	}
}
