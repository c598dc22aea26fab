//! Declaration macros for contracts, bosses and static factories.

/// Binds capability trait objects to their identifiers.
///
/// ```
/// use whisper_registry::{Interface, Unknown, interface};
///
/// trait Undo: Unknown {
///     fn undo(&mut self) -> bool;
/// }
/// interface!(dyn Undo => "IUndoManager");
///
/// assert_eq!(<dyn Undo as Interface>::ID, "IUndoManager");
/// ```
#[macro_export]
macro_rules! interface {
	($(dyn $($path:ident)::+ => $id:literal),+ $(,)?) => {
		$(
			impl $crate::Interface for dyn $($path)::+ {
				const ID: $crate::CapabilityId = $crate::CapabilityId::new($id);
			}
		)+
	};
}

/// Submits a boss descriptor for the global registry.
///
/// Entries are `dyn Contract`; a helper is written `dyn Helper => dyn Primary`.
///
/// ```ignore
/// boss!("TextDocument" extends "Document" {
///     dyn Spell,
///     dyn SpellPolicy => dyn Spell,
/// });
/// ```
#[macro_export]
macro_rules! boss {
	($name:literal $(extends $base:literal)? {
		$(dyn $($cap:ident)::+ $(=> dyn $($primary:ident)::+)?),* $(,)?
	}) => {
		$crate::inventory::submit! {
			$crate::db::BossReg {
				name: $name,
				extends: $crate::__opt!($($base)?),
				entries: &[$($crate::__entry!(dyn $($cap)::+ $(=> dyn $($primary)::+)?)),*],
				crate_name: ::core::env!("CARGO_PKG_NAME"),
			}
		}
	};
}

/// Submits a factory for the global registry.
///
/// `$ctor` is called with the [`FactoryContext`](crate::FactoryContext) and
/// returns `Result<Impl, ComponentError>` for some concrete `Impl` of the
/// contract.
///
/// ```ignore
/// factory!("Document", dyn Undo, |_cx| Ok(LinearUndo::default()));
/// ```
#[macro_export]
macro_rules! factory {
	($boss:literal, dyn $($cap:ident)::+, $ctor:expr $(,)?) => {
		$crate::inventory::submit! {
			$crate::db::FactoryReg {
				boss: $boss,
				capability: <dyn $($cap)::+ as $crate::Interface>::ID,
				type_id: $crate::type_id_of::<dyn $($cap)::+>,
				type_name: ::core::any::type_name::<dyn $($cap)::+>,
				crate_name: ::core::env!("CARGO_PKG_NAME"),
				build: {
					fn build(
						cx: &$crate::FactoryContext<'_>,
					) -> ::core::result::Result<$crate::Component, $crate::ComponentError> {
						let built: ::core::result::Result<_, $crate::ComponentError> = ($ctor)(cx);
						::core::result::Result::Ok($crate::Component::new::<dyn $($cap)::+>(::std::boxed::Box::new(built?)))
					}
					build
				},
			}
		}
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __opt {
	() => {
		::core::option::Option::None
	};
	($value:literal) => {
		::core::option::Option::Some($value)
	};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __entry {
	(dyn $($cap:ident)::+) => {
		$crate::DescriptorEntry::of::<dyn $($cap)::+>()
	};
	(dyn $($cap:ident)::+ => dyn $($primary:ident)::+) => {
		$crate::DescriptorEntry::helper_for::<dyn $($cap)::+, dyn $($primary)::+>()
	};
}
