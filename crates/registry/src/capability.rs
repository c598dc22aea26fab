//! Capability identifiers and the contract every implementation shares.
//!
//! A capability is a Rust trait. The trait object type (`dyn Undo`) is bound to
//! a stable string identifier through [`Interface`], usually via the
//! [`interface!`](crate::interface) macro. Every capability trait has
//! [`Unknown`] as a supertrait, which gives the owning root a uniform way to
//! hand out back-references and run teardown hooks.

use std::any::TypeId;
use std::borrow::{Borrow, Cow};

use crate::root::BossLink;

/// Stable token naming one capability contract.
///
/// Identifiers compare by their string form, so a name read from a config
/// document matches the identifier bound by [`interface!`](crate::interface).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityId(Cow<'static, str>);

impl CapabilityId {
	/// Creates an identifier from a static name.
	pub const fn new(name: &'static str) -> Self {
		Self(Cow::Borrowed(name))
	}

	/// Returns the identifier as a string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&'static str> for CapabilityId {
	fn from(name: &'static str) -> Self {
		Self::new(name)
	}
}

impl From<String> for CapabilityId {
	fn from(name: String) -> Self {
		Self(Cow::Owned(name))
	}
}

impl Borrow<str> for CapabilityId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl PartialEq<str> for CapabilityId {
	fn eq(&self, other: &str) -> bool {
		self.as_str() == other
	}
}

impl PartialEq<&str> for CapabilityId {
	fn eq(&self, other: &&str) -> bool {
		self.as_str() == *other
	}
}

impl core::fmt::Display for CapabilityId {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(&self.0)
	}
}

impl core::fmt::Debug for CapabilityId {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_tuple("CapabilityId").field(&self.as_str()).finish()
	}
}

/// Base contract shared by every capability implementation.
///
/// Implementations never manage their own lifetime. The owning root calls
/// [`Unknown::attach`] once construction of the whole boss has finished and
/// [`Unknown::teardown`] exactly once when the last handle into the boss is
/// released.
pub trait Unknown: Send + Sync + 'static {
	/// Receives the non-owning back-reference to the owning boss.
	///
	/// The link cannot be upgraded from inside this call; siblings become
	/// reachable once the boss is live.
	fn attach(&mut self, link: BossLink) {
		let _ = link;
	}

	/// Runs before the implementation's memory is reclaimed.
	///
	/// Sibling lookups through a [`BossLink`] return `None` from here on.
	fn teardown(&mut self) {}
}

/// Binds a capability contract type to its stable identifier.
///
/// Implemented for trait object types such as `dyn Undo`. Prefer the
/// [`interface!`](crate::interface) macro over a manual impl.
pub trait Interface: Unknown {
	/// Identifier used as registry, descriptor and persistence key.
	const ID: CapabilityId;
}

/// Returns the [`TypeId`] of a possibly unsized contract type.
///
/// Exists as a named function so static registrations can store it as a
/// function pointer.
pub fn type_id_of<T: ?Sized + 'static>() -> TypeId {
	TypeId::of::<T>()
}
