//! Boss/interface component object model.
//!
//! A *boss* is a runtime object assembled from several independently
//! implemented capabilities. Clients never hold the implementations; they hold
//! typed [`Handle`]s obtained from the boss's [`Root`], and ask one capability
//! for another with [`Handle::query`].
//!
//! # Modules
//!
//! - [`capability`] - identifiers and the [`Unknown`]/[`Interface`] contracts
//! - [`descriptor`] - boss descriptors, helpers and inheritance
//! - [`registry`] - factories and descriptors, and boss creation
//! - [`root`] - the per-instance owner of every implementation
//! - [`handle`] - typed, reference-counted capability handles
//! - [`db`] - the process-wide registry built from static registrations
//!
//! # Example
//!
//! ```
//! use whisper_registry::{BossDescriptor, Component, DescriptorEntry, Registry, Unknown, interface};
//!
//! trait Counter: Unknown {
//!     fn bump(&mut self) -> u32;
//! }
//! interface!(dyn Counter => "Counter");
//!
//! #[derive(Default)]
//! struct Simple(u32);
//! impl Unknown for Simple {}
//! impl Counter for Simple {
//!     fn bump(&mut self) -> u32 {
//!         self.0 += 1;
//!         self.0
//!     }
//! }
//!
//! let registry = Registry::new("doc");
//! registry
//!     .define_boss(BossDescriptor::define("Tally", [DescriptorEntry::of::<dyn Counter>()]).unwrap())
//!     .unwrap();
//! registry
//!     .register::<dyn Counter, _>("Tally", |_| Ok(Component::new::<dyn Counter>(Box::new(Simple::default()))))
//!     .unwrap();
//!
//! let counter = registry.create::<dyn Counter>("Tally").unwrap();
//! assert_eq!(counter.write().bump(), 1);
//! drop(counter);
//! assert_eq!(registry.live_bosses(), 0);
//! ```

pub mod capability;
pub mod component;
pub mod db;
pub mod descriptor;
pub mod error;
pub mod handle;
mod macros;
pub mod registry;
pub mod root;

#[doc(hidden)]
pub use inventory;

pub use capability::{CapabilityId, Interface, Unknown, type_id_of};
pub use component::{Component, Factory, FactoryContext, FactoryFn};
pub use db::{get_registry, try_get_registry};
pub use descriptor::{BossDescriptor, DescriptorEntry, ResolvedBoss, SlotKey};
pub use error::{BoxError, ComponentError, Error, Result};
pub use handle::{ConstHandle, Handle, ReadGuard, WriteGuard};
pub use registry::{FactoryInfo, OverridePolicy, Registry, RegistrySource};
pub use root::{BossLink, Root, RootBuilder};
