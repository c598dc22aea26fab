//! Capability registry: boss descriptors and per-boss factories.
//!
//! # Mental Model
//!
//! 1. **Registration:** descriptors and factories are added to an immutable
//!    snapshot, published atomically through [`ArcSwap`]. Writers build
//!    an extended copy and install it with a CAS retry loop, so concurrent
//!    registrations never lose updates.
//! 2. **Creation:** [`Registry::create_boss`] loads one snapshot, resolves the
//!    descriptor through its inheritance chain, finds every factory before
//!    constructing anything, then builds the implementations into a
//!    [`RootBuilder`].
//! 3. **Failure:** any error drops the builder, which tears down the
//!    implementations built so far. Clients never see a partial boss.
//!
//! # Precedence
//!
//! Factory lookup for capability `c` on boss `B` tries `B` first, then each
//! ancestor nearest first. Within one boss a second registration for the same
//! capability fails unless it uses [`OverridePolicy::Replace`].

mod snapshot;

use std::any::TypeId;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arc_swap::ArcSwap;

pub(crate) use self::snapshot::FactoryEntry;
use self::snapshot::{Binding, Snapshot};
use crate::capability::{CapabilityId, Interface};
use crate::component::{Component, Factory, FactoryContext};
use crate::descriptor::{BossDescriptor, ResolvedBoss};
use crate::error::{ComponentError, Error, Result};
use crate::handle::Handle;
use crate::root::{Root, RootBuilder};


/// Where a registration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistrySource {
	/// Collected from a static registration in the named crate.
	Crate(&'static str),
	/// Added at runtime (plugins, config documents, tests).
	Runtime,
}

impl core::fmt::Display for RegistrySource {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Crate(name) => write!(f, "crate:{name}"),
			Self::Runtime => write!(f, "runtime"),
		}
	}
}

/// What happens when a boss already has a factory for a capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverridePolicy {
	/// Fail with [`Error::DuplicateCapability`].
	#[default]
	Reject,
	/// Replace the existing factory.
	Replace,
}

/// Description of one registered factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryInfo {
	/// Capability the factory satisfies.
	pub capability: CapabilityId,
	/// Contract type name.
	pub type_name: &'static str,
	/// Origin of the registration.
	pub source: RegistrySource,
}

/// Process-wide or test-local table of bosses and factories.
pub struct Registry {
	label: &'static str,
	snap: ArcSwap<Snapshot>,
	live: Arc<AtomicUsize>,
}

impl Registry {
	/// Creates an empty registry.
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			snap: ArcSwap::from_pointee(Snapshot::default()),
			live: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Label used in diagnostics.
	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Registers `factory` as the constructor of capability `T` on `boss`.
	///
	/// Fails with [`Error::DuplicateCapability`] if `boss` already has a
	/// factory for `T`.
	pub fn register<T, F>(&self, boss: impl Into<Cow<'static, str>>, factory: F) -> Result<()>
	where
		T: Interface + ?Sized,
		F: Fn(&FactoryContext<'_>) -> std::result::Result<Component, ComponentError>
			+ Send
			+ Sync
			+ 'static,
	{
		self.register_with_policy::<T, F>(boss, factory, OverridePolicy::Reject)
	}

	/// Registers a factory with an explicit override rule.
	pub fn register_with_policy<T, F>(
		&self,
		boss: impl Into<Cow<'static, str>>,
		factory: F,
		policy: OverridePolicy,
	) -> Result<()>
	where
		T: Interface + ?Sized,
		F: Fn(&FactoryContext<'_>) -> std::result::Result<Component, ComponentError>
			+ Send
			+ Sync
			+ 'static,
	{
		let entry = FactoryEntry {
			capability: T::ID,
			binding: Binding {
				type_id: TypeId::of::<T>(),
				type_name: std::any::type_name::<T>(),
			},
			source: RegistrySource::Runtime,
			factory: Arc::new(factory),
		};
		self.insert_factory(boss.into(), entry, policy)
	}

	pub(crate) fn insert_factory(
		&self,
		boss: Cow<'static, str>,
		entry: FactoryEntry,
		policy: OverridePolicy,
	) -> Result<()> {
		let entry = Arc::new(entry);
		let replaced = self.publish(|snap| snap.insert_factory(&boss, entry.clone(), policy))?;
		if replaced {
			tracing::debug!(
				registry = self.label,
				boss = %boss,
				capability = %entry.capability,
				source = %entry.source,
				"replaced capability factory"
			);
		} else {
			tracing::trace!(
				registry = self.label,
				boss = %boss,
				capability = %entry.capability,
				"registered capability factory"
			);
		}
		Ok(())
	}

	/// Defines a boss type.
	///
	/// Fails with [`Error::DuplicateBoss`] if the name is taken. Bases named by
	/// `extends` may be defined later; they are resolved on creation.
	pub fn define_boss(&self, descriptor: BossDescriptor) -> Result<()> {
		let name = descriptor.name().to_owned();
		let descriptor = Arc::new(descriptor);
		self.publish(|snap| snap.define_boss(descriptor.clone()))?;
		tracing::trace!(registry = self.label, boss = %name, "defined boss");
		Ok(())
	}

	/// Instantiates `boss`, returning the owning [`Root`].
	pub fn create_boss(&self, boss: &str) -> Result<Root> {
		let snap = self.snap.load_full();
		let resolved = snap.resolve(boss)?;

		let mut plan = Vec::with_capacity(resolved.entries.len());
		for entry in &resolved.entries {
			let Some((provider, factory)) = snap.find_factory(&resolved.lineage, &entry.capability)
			else {
				tracing::error!(
					registry = self.label,
					boss = %resolved.name,
					capability = %entry.capability,
					"no factory registered for capability"
				);
				return Err(Error::MissingCapabilityFactory {
					boss: resolved.name.clone(),
					capability: entry.capability.clone(),
				});
			};
			plan.push((entry, provider, factory));
		}

		let mut builder =
			RootBuilder::new(resolved.name.clone()).with_live_counter(self.live.clone());
		for (entry, provider, factory) in plan {
			let cx = FactoryContext {
				boss: &resolved.name,
				provider,
				capability: &entry.capability,
				helper_of: entry.helper_of.as_ref(),
			};
			let component = (factory.factory)(&cx).map_err(|source| {
				tracing::warn!(
					registry = self.label,
					boss = %resolved.name,
					capability = %entry.capability,
					error = %source,
					"capability factory failed"
				);
				Error::Construction {
					boss: resolved.name.clone(),
					capability: entry.capability.clone(),
					source,
				}
			})?;
			if component.type_id() != factory.binding.type_id {
				tracing::error!(
					boss = %resolved.name,
					capability = %entry.capability,
					expected = factory.binding.type_name,
					built = component.type_name(),
					"factory built the wrong contract"
				);
				return Err(Error::CapabilityMismatch {
					boss: resolved.name.clone(),
					capability: entry.capability.clone(),
				});
			}
			builder.add_implementation(entry.slot_key(), component)?;
		}

		builder.finish()
	}

	/// Instantiates `boss` and returns its primary capability as `T`.
	///
	/// A `T` other than the primary fails before any factory runs.
	pub fn create<T: Interface + ?Sized>(&self, boss: &str) -> Result<Handle<T>> {
		let resolved = self.resolve(boss)?;
		let mismatch = || Error::CapabilityMismatch {
			boss: resolved.name.clone(),
			capability: T::ID,
		};
		if resolved.primary() != Some(&T::ID) {
			return Err(mismatch());
		}
		self.create_boss(boss)?.query::<T>().ok_or_else(mismatch)
	}

	/// Flattens `boss` through its inheritance chain without building it.
	pub fn resolve(&self, boss: &str) -> Result<ResolvedBoss> {
		self.snap.load().resolve(boss)
	}

	/// Descriptor registered under `boss`, without inherited entries.
	pub fn descriptor(&self, boss: &str) -> Option<Arc<BossDescriptor>> {
		self.snap.load().bosses.get(boss).cloned()
	}

	/// Names of every defined boss, sorted.
	pub fn boss_names(&self) -> Vec<String> {
		self.snap.load().bosses.keys().map(|name| name.to_string()).collect()
	}

	/// Factories registered directly on `boss`, sorted by capability.
	pub fn factories_for(&self, boss: &str) -> Vec<FactoryInfo> {
		let snap = self.snap.load();
		let Some(per_boss) = snap.factories.get(boss) else {
			return Vec::new();
		};
		let mut infos: Vec<_> = per_boss
			.values()
			.map(|entry| FactoryInfo {
				capability: entry.capability.clone(),
				type_name: entry.binding.type_name,
				source: entry.source,
			})
			.collect();
		infos.sort_by(|a, b| a.capability.cmp(&b.capability));
		infos
	}

	/// Number of bosses created by this registry that are still alive.
	pub fn live_bosses(&self) -> usize {
		self.live.load(Ordering::Acquire)
	}

	/// Monotonic counter bumped by every successful registration.
	pub fn generation(&self) -> u64 {
		self.snap.load().generation
	}

	/// Installs a snapshot derived from the current one.
	///
	/// `apply` may run more than once if another writer wins the race.
	fn publish<R>(&self, mut apply: impl FnMut(&mut Snapshot) -> Result<R>) -> Result<R> {
		loop {
			let old = self.snap.load_full();
			let mut next = Snapshot::clone(&old);
			let out = apply(&mut next)?;
			next.generation = old.generation + 1;

			let prev = self.snap.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				return Ok(out);
			}
			tracing::trace!(registry = self.label, "registry snapshot raced, retrying");
		}
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new("registry")
	}
}

impl core::fmt::Debug for Registry {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let snap = self.snap.load();
		f.debug_struct("Registry")
			.field("label", &self.label)
			.field("bosses", &snap.bosses.len())
			.field("generation", &snap.generation)
			.field("live_bosses", &self.live_bosses())
			.finish()
	}
}

pub(crate) fn static_entry(
	capability: CapabilityId,
	type_id: TypeId,
	type_name: &'static str,
	crate_name: &'static str,
	factory: Factory,
) -> FactoryEntry {
	FactoryEntry {
		capability,
		binding: Binding { type_id, type_name },
		source: RegistrySource::Crate(crate_name),
		factory,
	}
}
