//! Unknown roots: the per-instance aggregate owning every implementation of one boss.
//!
//! # Role
//!
//! A [`RootBuilder`] collects implementations while a boss is constructing.
//! [`RootBuilder::finish`] publishes them as a live [`Root`]. The root's
//! shared state is reference-counted; every [`Root`] and [`Handle`] holds one
//! count, and implementations hold only a weak [`BossLink`].
//!
//! # Invariants
//!
//! - Each implementation is torn down exactly once: when the last count is
//!   released, or when an unfinished builder is dropped.
//! - Teardown runs in reverse construction order. Once it starts, every
//!   [`BossLink`] fails to upgrade, so no implementation can reach a sibling
//!   that may already be gone.
//! - Queries are identity-stable: every handle to a slot shares one cell.
//! - Access never waits on the calling thread's own borrow. Shared borrows of
//!   one cell nest; re-entering a cell this thread writes, or writing a cell it
//!   reads, panics naming the capability. Sibling callbacks that may reach
//!   back into their caller should take `&self` paths or use
//!   [`Handle::try_read`].

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;

use crate::capability::{CapabilityId, Interface};
use crate::component::Component;
use crate::descriptor::SlotKey;
use crate::error::{Error, Result};
use crate::handle::{ConstHandle, Handle};


struct Slot {
	key: SlotKey,
	component: Component,
}

struct Shared {
	boss: Cow<'static, str>,
	primary: CapabilityId,
	slots: Vec<Slot>,
	by_key: FxHashMap<SlotKey, usize>,
	/// Preferred slot per capability: the non-helper entry, else the first helper.
	by_capability: FxHashMap<CapabilityId, usize>,
	live: Option<Arc<AtomicUsize>>,
}

impl Shared {
	fn slot_for(&self, capability: &CapabilityId) -> Option<&Slot> {
		self.by_capability.get(capability).map(|&idx| &self.slots[idx])
	}

	fn slot_by_key(&self, key: &SlotKey) -> Option<&Slot> {
		self.by_key.get(key).map(|&idx| &self.slots[idx])
	}
}

impl Drop for Shared {
	fn drop(&mut self) {
		tracing::debug!(boss = %self.boss, implementations = self.slots.len(), "tearing down boss");
		while let Some(slot) = self.slots.pop() {
			drop(slot);
		}
		if let Some(live) = &self.live {
			live.fetch_sub(1, Ordering::AcqRel);
		}
	}
}

/// Collects implementations for one boss instance under construction.
///
/// Dropping the builder without calling [`RootBuilder::finish`] tears down
/// every implementation added so far.
pub struct RootBuilder {
	boss: Cow<'static, str>,
	slots: Vec<Slot>,
	by_key: FxHashMap<SlotKey, usize>,
	live: Option<Arc<AtomicUsize>>,
}

impl RootBuilder {
	/// Starts constructing an instance of `boss`.
	pub fn new(boss: impl Into<Cow<'static, str>>) -> Self {
		Self {
			boss: boss.into(),
			slots: Vec::new(),
			by_key: FxHashMap::default(),
			live: None,
		}
	}

	/// Counts the finished root in `live` until it is destroyed.
	pub(crate) fn with_live_counter(mut self, live: Arc<AtomicUsize>) -> Self {
		self.live = Some(live);
		self
	}

	/// Adds the implementation filling `key`.
	pub fn add_implementation(&mut self, key: SlotKey, component: Component) -> Result<()> {
		if component.capability() != &key.capability {
			return Err(Error::CapabilityMismatch {
				boss: self.boss.clone(),
				capability: key.capability,
			});
		}
		if self.by_key.contains_key(&key) {
			return Err(Error::DuplicateCapability {
				boss: self.boss.clone(),
				capability: key.capability,
			});
		}
		self.by_key.insert(key.clone(), self.slots.len());
		self.slots.push(Slot { key, component });
		Ok(())
	}

	/// Number of implementations added so far.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Returns true if nothing has been added.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Publishes the boss and hands every implementation its [`BossLink`].
	///
	/// The first added implementation is the boss's primary capability.
	pub fn finish(mut self) -> Result<Root> {
		let Some(primary) = self.slots.first().map(|s| s.key.capability.clone()) else {
			return Err(Error::InvalidDescriptor {
				boss: self.boss.clone(),
				reason: "a boss needs at least one capability".into(),
			});
		};

		let slots = std::mem::take(&mut self.slots);
		let by_key = std::mem::take(&mut self.by_key);
		let live = self.live.take();
		let boss = self.boss.clone();

		let mut by_capability = FxHashMap::default();
		for (idx, slot) in slots.iter().enumerate() {
			let preferred = by_capability.entry(slot.key.capability.clone()).or_insert(idx);
			if slot.key.primary.is_none() {
				*preferred = idx;
			}
		}

		if let Some(live) = &live {
			live.fetch_add(1, Ordering::AcqRel);
		}

		let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
			for slot in &slots {
				slot.component.attach(BossLink {
					boss: boss.clone(),
					shared: weak.clone(),
				});
			}
			Shared {
				boss,
				primary,
				slots,
				by_key,
				by_capability,
				live,
			}
		});

		tracing::debug!(
			boss = %shared.boss,
			primary = %shared.primary,
			implementations = shared.slots.len(),
			"boss constructed"
		);
		Ok(Root { shared })
	}
}

impl Drop for RootBuilder {
	fn drop(&mut self) {
		if self.slots.is_empty() {
			return;
		}
		tracing::debug!(
			boss = %self.boss,
			built = self.slots.len(),
			"releasing partially constructed boss"
		);
		while let Some(slot) = self.slots.pop() {
			drop(slot);
		}
	}
}

/// Owning handle to a live boss instance.
///
/// Cloning retains the boss; dropping releases it. The boss is torn down when
/// the last `Root` or [`Handle`] into it is dropped.
#[derive(Clone)]
pub struct Root {
	shared: Arc<Shared>,
}

impl Root {
	/// Name of the boss type this instance was built from.
	pub fn boss(&self) -> &str {
		&self.shared.boss
	}

	/// The entry-point capability.
	pub fn primary(&self) -> &CapabilityId {
		&self.shared.primary
	}

	/// Finds capability `T` on this boss.
	///
	/// Returns `None` when the boss does not provide `T`. A capability listed
	/// only as a helper resolves to its first helper slot.
	pub fn query<T: Interface + ?Sized>(&self) -> Option<Handle<T>> {
		let slot = self.shared.slot_for(&T::ID)?;
		let cell = slot.component.cell::<T>()?;
		Some(Handle::new(cell, self.clone()))
	}

	/// Finds capability `T` for read-only use.
	pub fn query_const<T: Interface + ?Sized>(&self) -> Option<ConstHandle<T>> {
		self.query::<T>().map(ConstHandle::from)
	}

	/// Finds the helper `H` attached to `primary`.
	pub fn helper<H: Interface + ?Sized>(&self, primary: &CapabilityId) -> Option<Handle<H>> {
		let key = SlotKey {
			capability: H::ID,
			primary: Some(primary.clone()),
		};
		let slot = self.shared.slot_by_key(&key)?;
		let cell = slot.component.cell::<H>()?;
		Some(Handle::new(cell, self.clone()))
	}

	/// Returns true if the boss provides `capability`, as a primary or helper.
	pub fn provides(&self, capability: &str) -> bool {
		self.shared.by_capability.contains_key(capability)
	}

	/// Slot keys in construction order.
	pub fn capabilities(&self) -> impl Iterator<Item = &SlotKey> + '_ {
		self.shared.slots.iter().map(|s| &s.key)
	}

	/// Takes another count on the boss.
	pub fn retain(&self) -> Root {
		self.clone()
	}

	/// Gives up this count, destroying the boss if it was the last one.
	pub fn release(self) {
		drop(self);
	}

	/// Number of outstanding [`Root`] and [`Handle`] values for this boss.
	pub fn ref_count(&self) -> usize {
		Arc::strong_count(&self.shared)
	}

	/// Creates a non-owning back-reference.
	pub fn downgrade(&self) -> BossLink {
		BossLink {
			boss: self.shared.boss.clone(),
			shared: Arc::downgrade(&self.shared),
		}
	}

	/// Returns true if both values refer to the same boss instance.
	pub fn ptr_eq(&self, other: &Root) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}
}

impl core::fmt::Debug for Root {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Root")
			.field("boss", &self.shared.boss)
			.field("primary", &self.shared.primary)
			.field("implementations", &self.shared.slots.len())
			.finish()
	}
}

/// Non-owning back-reference from an implementation to its boss.
///
/// Implementations keep this instead of a [`Handle`]; a stored handle would
/// keep its own boss alive forever.
#[derive(Clone)]
pub struct BossLink {
	boss: Cow<'static, str>,
	shared: Weak<Shared>,
}

impl BossLink {
	/// A link that never upgrades.
	pub fn detached() -> Self {
		Self {
			boss: Cow::Borrowed(""),
			shared: Weak::new(),
		}
	}

	/// Name of the boss type; empty for a detached link.
	pub fn boss(&self) -> &str {
		&self.boss
	}

	/// Retains the boss if it is still live.
	pub fn upgrade(&self) -> Option<Root> {
		self.shared.upgrade().map(|shared| Root { shared })
	}

	/// Returns true while the boss is live.
	pub fn is_live(&self) -> bool {
		self.shared.strong_count() > 0
	}

	/// Finds sibling `T`; `None` once the boss is tearing down.
	pub fn query<T: Interface + ?Sized>(&self) -> Option<Handle<T>> {
		self.upgrade()?.query::<T>()
	}

	/// Finds the helper `H` attached to `primary`.
	pub fn helper<H: Interface + ?Sized>(&self, primary: &CapabilityId) -> Option<Handle<H>> {
		self.upgrade()?.helper::<H>(primary)
	}
}

impl Default for BossLink {
	fn default() -> Self {
		Self::detached()
	}
}

impl core::fmt::Debug for BossLink {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("BossLink")
			.field("boss", &self.boss)
			.field("live", &self.is_live())
			.finish()
	}
}
