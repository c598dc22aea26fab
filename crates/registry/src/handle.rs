//! Typed capability handles.
//!
//! A [`Handle<T>`] is the only way client code reaches an implementation. It
//! keeps the whole boss alive, gives shared access through [`Handle::read`]
//! and exclusive access through [`Handle::write`]. A [`ConstHandle<T>`] drops
//! the exclusive half, so `&mut self` operations of the contract cannot be
//! called through it:
//!
//! ```compile_fail
//! use whisper_registry::{ConstHandle, Unknown, interface};
//!
//! trait Counter: Unknown {
//!     fn bump(&mut self);
//! }
//! interface!(dyn Counter => "Counter");
//!
//! fn bump(counter: &ConstHandle<dyn Counter>) {
//!     counter.write().bump();
//! }
//! ```
//!
//! ```
//! use whisper_registry::{ConstHandle, Handle, Unknown, interface};
//!
//! trait Counter: Unknown {
//!     fn get(&self) -> u32;
//!     fn bump(&mut self);
//! }
//! interface!(dyn Counter => "Counter");
//!
//! fn bump(counter: &Handle<dyn Counter>) -> ConstHandle<dyn Counter> {
//!     counter.write().bump();
//!     counter.to_const()
//! }
//! ```
//!
//! # Re-entrancy
//!
//! Shared borrows nest: an implementation that reads itself back through a
//! sibling gets a second shared borrow, even while another thread waits to
//! write. An exclusive borrow does not nest. Asking for any borrow of a
//! capability the current thread holds exclusively, or for an exclusive borrow
//! of one it already reads, panics with the capability name instead of waiting
//! forever. [`Handle::try_read`] and [`Handle::try_write`] return `None` in
//! that case.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{
	MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard,
};

use crate::capability::{CapabilityId, Interface};
use crate::component::Cell;
use crate::root::{BossLink, Root};

/// Reference-counted handle to capability `T` on a live boss.
pub struct Handle<T: Interface + ?Sized> {
	cell: Arc<Cell<T>>,
	root: Root,
}

impl<T: Interface + ?Sized> Handle<T> {
	pub(crate) fn new(cell: Arc<Cell<T>>, root: Root) -> Self {
		Self { cell, root }
	}

	/// Shared access to the implementation.
	///
	/// Nests with shared borrows already held by this thread.
	///
	/// # Panics
	///
	/// Panics if this thread holds the implementation through [`Handle::write`].
	pub fn read(&self) -> ReadGuard<'_, T> {
		let cell = self.addr();
		Borrow::check::<T>(cell, Access::Shared, self.boss());
		let guard = RwLockReadGuard::map(self.cell.read_recursive(), |object| &**object);
		ReadGuard {
			guard,
			_borrow: Borrow::enter(cell, Access::Shared),
		}
	}

	/// Exclusive access to the implementation.
	///
	/// While the guard lives, sibling code reached from it must not borrow this
	/// capability again on the same thread, e.g. through a [`BossLink`].
	///
	/// # Panics
	///
	/// Panics if this thread already borrows the implementation, shared or
	/// exclusive. Waiting there could never finish.
	pub fn write(&self) -> WriteGuard<'_, T> {
		let cell = self.addr();
		Borrow::check::<T>(cell, Access::Exclusive, self.boss());
		let guard = RwLockWriteGuard::map(self.cell.write(), |object| &mut **object);
		WriteGuard {
			guard,
			_borrow: Borrow::enter(cell, Access::Exclusive),
		}
	}

	/// Shared access, or `None` if a writer currently holds the implementation.
	pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
		let guard = self.cell.try_read_recursive()?;
		Some(ReadGuard {
			guard: RwLockReadGuard::map(guard, |object| &**object),
			_borrow: Borrow::enter(self.addr(), Access::Shared),
		})
	}

	/// Exclusive access, or `None` if the implementation is borrowed.
	pub fn try_write(&self) -> Option<WriteGuard<'_, T>> {
		let guard = self.cell.try_write()?;
		Some(WriteGuard {
			guard: RwLockWriteGuard::map(guard, |object| &mut **object),
			_borrow: Borrow::enter(self.addr(), Access::Exclusive),
		})
	}

	fn addr(&self) -> usize {
		Arc::as_ptr(&self.cell).addr()
	}

	/// Capability this handle refers to.
	pub fn capability(&self) -> CapabilityId {
		T::ID
	}

	/// Boss instance owning the implementation.
	pub fn root(&self) -> &Root {
		&self.root
	}

	/// Name of the boss type.
	pub fn boss(&self) -> &str {
		self.root.boss()
	}

	/// Finds sibling capability `U` on the same boss.
	pub fn query<U: Interface + ?Sized>(&self) -> Option<Handle<U>> {
		self.root.query::<U>()
	}

	/// Finds the helper `H` attached to this capability.
	pub fn helper<H: Interface + ?Sized>(&self) -> Option<Handle<H>> {
		self.root.helper::<H>(&T::ID)
	}

	/// Read-only view sharing this handle's count.
	pub fn to_const(&self) -> ConstHandle<T> {
		ConstHandle(self.clone())
	}

	/// Non-owning back-reference to the boss.
	pub fn downgrade(&self) -> BossLink {
		self.root.downgrade()
	}

	/// Returns true if both handles refer to the same implementation.
	pub fn ptr_eq(&self, other: &Handle<T>) -> bool {
		Arc::ptr_eq(&self.cell, &other.cell)
	}
}

impl<T: Interface + ?Sized> Clone for Handle<T> {
	fn clone(&self) -> Self {
		Self {
			cell: self.cell.clone(),
			root: self.root.clone(),
		}
	}
}

impl<T: Interface + ?Sized> core::fmt::Debug for Handle<T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Handle")
			.field("boss", &self.boss())
			.field("capability", &T::ID)
			.finish()
	}
}

/// Read-only handle to capability `T`.
///
/// Built from a [`Handle`]; there is no conversion back.
pub struct ConstHandle<T: Interface + ?Sized>(Handle<T>);

impl<T: Interface + ?Sized> ConstHandle<T> {
	/// Shared access to the implementation. Panics like [`Handle::read`].
	pub fn read(&self) -> ReadGuard<'_, T> {
		self.0.read()
	}

	/// Shared access, or `None` if a writer currently holds the implementation.
	pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
		self.0.try_read()
	}

	/// Capability this handle refers to.
	pub fn capability(&self) -> CapabilityId {
		T::ID
	}

	/// Name of the boss type.
	pub fn boss(&self) -> &str {
		self.0.boss()
	}

	/// Finds sibling capability `U`, read-only.
	pub fn query<U: Interface + ?Sized>(&self) -> Option<ConstHandle<U>> {
		self.0.query::<U>().map(ConstHandle)
	}

	/// Finds the helper `H` attached to this capability, read-only.
	pub fn helper<H: Interface + ?Sized>(&self) -> Option<ConstHandle<H>> {
		self.0.helper::<H>().map(ConstHandle)
	}

	/// Returns true if both handles refer to the same implementation.
	pub fn ptr_eq(&self, other: &ConstHandle<T>) -> bool {
		self.0.ptr_eq(&other.0)
	}
}

impl<T: Interface + ?Sized> From<Handle<T>> for ConstHandle<T> {
	fn from(handle: Handle<T>) -> Self {
		Self(handle)
	}
}

impl<T: Interface + ?Sized> Clone for ConstHandle<T> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<T: Interface + ?Sized> core::fmt::Debug for ConstHandle<T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ConstHandle")
			.field("boss", &self.boss())
			.field("capability", &T::ID)
			.finish()
	}
}

/// Shared borrow of an implementation.
pub struct ReadGuard<'a, T: ?Sized> {
	guard: MappedRwLockReadGuard<'a, T>,
	_borrow: Borrow,
}

impl<T: ?Sized> Deref for ReadGuard<'_, T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.guard
	}
}

/// Exclusive borrow of an implementation.
pub struct WriteGuard<'a, T: ?Sized> {
	guard: MappedRwLockWriteGuard<'a, T>,
	_borrow: Borrow,
}

impl<T: ?Sized> Deref for WriteGuard<'_, T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.guard
	}
}

impl<T: ?Sized> DerefMut for WriteGuard<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		&mut self.guard
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
	Shared,
	Exclusive,
}

impl core::fmt::Display for Access {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(match self {
			Self::Shared => "shared",
			Self::Exclusive => "exclusive",
		})
	}
}

thread_local! {
	/// Cells borrowed by the current thread, innermost last.
	static HELD: RefCell<Vec<(usize, Access)>> = const { RefCell::new(Vec::new()) };
}

/// One entry in [`HELD`], removed when the guard owning it drops.
struct Borrow {
	cell: usize,
	access: Access,
}

impl Borrow {
	/// Panics if taking `access` on `cell` would wait on this thread's own borrow.
	fn check<T: Interface + ?Sized>(cell: usize, access: Access, boss: &str) {
		let blocked = HELD.with_borrow(|held| {
			held.iter().any(|&(held_cell, held_access)| {
				held_cell == cell && (held_access == Access::Exclusive || access == Access::Exclusive)
			})
		});
		if blocked {
			tracing::error!(
				boss,
				capability = %T::ID,
				%access,
				"capability re-entered by the thread that borrows it"
			);
			panic!(
				"capability {} on boss {boss:?} re-entered for {access} access while this thread already borrows it",
				T::ID
			);
		}
	}

	fn enter(cell: usize, access: Access) -> Self {
		HELD.with_borrow_mut(|held| held.push((cell, access)));
		Self { cell, access }
	}
}

impl Drop for Borrow {
	fn drop(&mut self) {
		let _ = HELD.try_with(|held| {
			let mut held = held.borrow_mut();
			if let Some(pos) = held
				.iter()
				.rposition(|&entry| entry == (self.cell, self.access))
			{
				held.remove(pos);
			}
		});
	}
}
