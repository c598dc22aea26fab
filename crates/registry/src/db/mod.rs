//! Process-wide registry built from static registrations.
//!
//! Crates declare bosses with [`boss!`](crate::boss) and factories with
//! [`factory!`](crate::factory); both submit records through `inventory`.
//! The first call to [`get_registry`] collects them into one [`Registry`] and
//! then runs every [`PluginDef`] in priority order.

use std::any::TypeId;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use crate::capability::CapabilityId;
use crate::component::{Component, Factory, FactoryContext};
use crate::descriptor::{BossDescriptor, DescriptorEntry};
use crate::error::{ComponentError, Error, Result};
use crate::registry::{FactoryEntry, Registry, static_entry};

pub mod builder;
pub mod plugin;

pub use self::plugin::PluginDef;

/// Statically submitted factory for one capability on one boss.
pub struct FactoryReg {
	/// Boss the factory is registered on.
	pub boss: &'static str,
	/// Capability it constructs.
	pub capability: CapabilityId,
	/// Contract type, as a function so the record stays const-constructible.
	pub type_id: fn() -> TypeId,
	/// Contract type name, for diagnostics and introspection.
	pub type_name: fn() -> &'static str,
	/// Crate that submitted the record.
	pub crate_name: &'static str,
	/// Constructor run each time the boss is created.
	pub build: fn(&FactoryContext<'_>) -> std::result::Result<Component, ComponentError>,
}

inventory::collect!(FactoryReg);

impl FactoryReg {
	pub(crate) fn boss(&self) -> Cow<'static, str> {
		Cow::Borrowed(self.boss)
	}

	pub(crate) fn entry(&self) -> FactoryEntry {
		let factory: Factory = Arc::new(self.build);
		static_entry(
			self.capability.clone(),
			(self.type_id)(),
			(self.type_name)(),
			self.crate_name,
			factory,
		)
	}
}

/// Statically submitted boss descriptor.
pub struct BossReg {
	/// Boss type name; unique across the process.
	pub name: &'static str,
	/// Base boss, if this one extends another.
	pub extends: Option<&'static str>,
	/// Capabilities declared by this boss, primary first.
	pub entries: &'static [DescriptorEntry],
	/// Crate that submitted the record.
	pub crate_name: &'static str,
}

inventory::collect!(BossReg);

impl BossReg {
	/// Builds the descriptor this record declares.
	pub fn descriptor(&self) -> Result<BossDescriptor> {
		let entries = self.entries.iter().cloned();
		match self.extends {
			Some(base) => BossDescriptor::extending(self.name, base, entries),
			None => BossDescriptor::define(self.name, entries),
		}
	}
}

static REGISTRY: OnceLock<Result<Registry>> = OnceLock::new();

/// Returns the process-wide registry, building it on first use.
pub fn try_get_registry() -> std::result::Result<&'static Registry, &'static Error> {
	REGISTRY.get_or_init(builder::build_global).as_ref()
}

/// Returns the process-wide registry, building it on first use.
///
/// # Panics
///
/// Panics if the static registrations are inconsistent (a duplicate boss or
/// factory, an invalid descriptor, a failing plugin). That is a build-time
/// defect in the linked crates; use [`try_get_registry`] to inspect it.
pub fn get_registry() -> &'static Registry {
	match try_get_registry() {
		Ok(registry) => registry,
		Err(e) => panic!("static capability registration failed: {e}"),
	}
}
