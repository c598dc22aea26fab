//! Type-erased capability implementations and the factories that build them.

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::capability::{CapabilityId, Interface};
use crate::error::ComponentError;
use crate::root::BossLink;

/// Storage cell shared by a root slot and every handle to it.
pub(crate) type Cell<T> = RwLock<Box<T>>;

/// One capability implementation, erased until it is wired into a root.
///
/// Dropping a component runs its [`Unknown::teardown`](crate::Unknown::teardown)
/// hook, so an implementation built for a boss that never finished
/// construction is still torn down exactly once.
pub struct Component {
	capability: CapabilityId,
	type_id: TypeId,
	type_name: &'static str,
	cell: Arc<dyn Any + Send + Sync>,
	attach: fn(&(dyn Any + Send + Sync), BossLink),
	teardown: fn(&(dyn Any + Send + Sync)),
}

impl Component {
	/// Wraps an implementation of capability `T`.
	pub fn new<T: Interface + ?Sized>(object: Box<T>) -> Self {
		let cell: Arc<Cell<T>> = Arc::new(RwLock::new(object));
		Self {
			capability: T::ID,
			type_id: TypeId::of::<T>(),
			type_name: std::any::type_name::<T>(),
			cell,
			attach: attach_cell::<T>,
			teardown: teardown_cell::<T>,
		}
	}

	/// Returns the capability this implementation satisfies.
	pub fn capability(&self) -> &CapabilityId {
		&self.capability
	}

	/// Returns the contract type name, for diagnostics.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub(crate) fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub(crate) fn attach(&self, link: BossLink) {
		(self.attach)(&*self.cell, link);
	}

	/// Returns the typed cell if this component implements `T`.
	pub(crate) fn cell<T: Interface + ?Sized>(&self) -> Option<Arc<Cell<T>>> {
		self.cell.clone().downcast::<Cell<T>>().ok()
	}
}

impl Drop for Component {
	fn drop(&mut self) {
		tracing::trace!(capability = %self.capability, "tearing down implementation");
		(self.teardown)(&*self.cell);
	}
}

impl core::fmt::Debug for Component {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Component")
			.field("capability", &self.capability)
			.field("type", &self.type_name)
			.finish()
	}
}

fn attach_cell<T: Interface + ?Sized>(cell: &(dyn Any + Send + Sync), link: BossLink) {
	if let Some(cell) = cell.downcast_ref::<Cell<T>>() {
		cell.write().attach(link);
	}
}

fn teardown_cell<T: Interface + ?Sized>(cell: &(dyn Any + Send + Sync)) {
	if let Some(cell) = cell.downcast_ref::<Cell<T>>() {
		cell.write().teardown();
	}
}

/// What a factory knows about the slot it is filling.
#[derive(Debug, Clone, Copy)]
pub struct FactoryContext<'a> {
	pub(crate) boss: &'a str,
	pub(crate) provider: &'a str,
	pub(crate) capability: &'a CapabilityId,
	pub(crate) helper_of: Option<&'a CapabilityId>,
}

impl<'a> FactoryContext<'a> {
	/// Boss being instantiated.
	pub fn boss(&self) -> &'a str {
		self.boss
	}

	/// Boss the factory was registered on; an ancestor when inherited.
	pub fn provider(&self) -> &'a str {
		self.provider
	}

	/// Capability being constructed.
	pub fn capability(&self) -> &'a CapabilityId {
		self.capability
	}

	/// Primary capability this slot serves, if it is a helper.
	pub fn helper_of(&self) -> Option<&'a CapabilityId> {
		self.helper_of
	}
}

/// Type-erased constructor stored in the registry.
pub type FactoryFn =
	dyn Fn(&FactoryContext<'_>) -> Result<Component, ComponentError> + Send + Sync;

/// Shared constructor handle.
pub type Factory = Arc<FactoryFn>;
