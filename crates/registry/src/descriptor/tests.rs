use super::*;

fn cap(name: &'static str) -> DescriptorEntry {
	DescriptorEntry::new(CapabilityId::new(name))
}

fn helper(name: &'static str, primary: &'static str) -> DescriptorEntry {
	DescriptorEntry::helper(CapabilityId::new(name), CapabilityId::new(primary))
}

#[test]
fn test_define_keeps_declared_order() {
	let desc = BossDescriptor::define(
		"Document",
		[cap("Document"), cap("Undo"), helper("UndoPolicy", "Undo")],
	)
	.expect("valid descriptor");

	assert_eq!(desc.name(), "Document");
	assert_eq!(desc.extends(), None);
	let names: Vec<_> = desc.entries().iter().map(|e| e.capability.as_str()).collect();
	assert_eq!(names, ["Document", "Undo", "UndoPolicy"]);
	assert!(desc.entries()[2].is_helper());
}

#[test]
fn test_empty_descriptor_is_invalid() {
	let err = BossDescriptor::define("Empty", []).unwrap_err();
	assert!(matches!(err, Error::InvalidDescriptor { .. }), "{err}");
}

#[test]
fn test_duplicate_capability_is_rejected() {
	let err = BossDescriptor::define("Window", [cap("Window"), cap("Draw"), cap("Draw")]).unwrap_err();
	match err {
		Error::DuplicateCapability { boss, capability } => {
			assert_eq!(boss, "Window");
			assert_eq!(capability, "Draw");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn test_helper_of_distinct_primaries_is_allowed() {
	let desc = BossDescriptor::define(
		"Sorter",
		[
			cap("Sorter"),
			cap("Merge"),
			helper("Compare", "Sorter"),
			helper("Compare", "Merge"),
		],
	)
	.expect("helpers serving different primaries");

	let keys: FxHashSet<_> = desc.entries().iter().map(DescriptorEntry::slot_key).collect();
	assert_eq!(keys.len(), 4);
}

#[test]
fn test_helper_twice_for_same_primary_is_duplicate() {
	let err = BossDescriptor::define(
		"Sorter",
		[cap("Sorter"), helper("Compare", "Sorter"), helper("Compare", "Sorter")],
	)
	.unwrap_err();
	assert!(matches!(err, Error::DuplicateCapability { .. }), "{err}");
}

#[test]
fn test_capability_cannot_be_both_helper_and_primary() {
	let err = BossDescriptor::define(
		"Sorter",
		[cap("Sorter"), helper("Compare", "Sorter"), cap("Compare")],
	)
	.unwrap_err();
	assert!(matches!(err, Error::DuplicateCapability { .. }), "{err}");

	let err = BossDescriptor::define(
		"Sorter",
		[cap("Sorter"), cap("Compare"), helper("Compare", "Sorter")],
	)
	.unwrap_err();
	assert!(matches!(err, Error::DuplicateCapability { .. }), "{err}");
}

#[test]
fn test_entry_point_cannot_be_helper() {
	let err = BossDescriptor::define("Odd", [helper("Policy", "Algo"), cap("Algo")]).unwrap_err();
	assert!(matches!(err, Error::InvalidDescriptor { .. }), "{err}");
}

#[test]
fn test_helper_must_follow_its_primary() {
	let err = BossDescriptor::define(
		"Algo",
		[cap("Algo"), helper("Policy", "Search"), cap("Search")],
	)
	.unwrap_err();
	assert!(matches!(err, Error::InvalidDescriptor { .. }), "{err}");
}

#[test]
fn test_helper_of_a_helper_is_invalid() {
	let err = BossDescriptor::define(
		"Algo",
		[cap("Algo"), helper("Policy", "Algo"), helper("Tuning", "Policy")],
	)
	.unwrap_err();
	assert!(matches!(err, Error::InvalidDescriptor { .. }), "{err}");
}

#[test]
fn test_helper_of_itself_is_invalid() {
	let err = BossDescriptor::define("Algo", [cap("Algo"), helper("Algo", "Algo")]).unwrap_err();
	assert!(matches!(err, Error::InvalidDescriptor { .. }), "{err}");

	let err = BossDescriptor::extending("Fast", "Algo", [helper("Policy", "Policy")]).unwrap_err();
	assert!(matches!(err, Error::InvalidDescriptor { .. }), "{err}");
}

#[test]
fn test_extending_defers_primary_checks() {
	let desc = BossDescriptor::extending("TextDocument", "Document", [helper("UndoPolicy", "Undo")])
		.expect("primary lives in the base");
	assert_eq!(desc.extends(), Some("Document"));

	let bare = BossDescriptor::extending("Alias", "Document", []).expect("pure alias");
	assert!(bare.entries().is_empty());
}

#[test]
fn test_extending_itself_is_a_cycle() {
	let err = BossDescriptor::extending("Loop", "Loop", [cap("A")]).unwrap_err();
	assert!(matches!(err, Error::InheritanceCycle { .. }), "{err}");
}

#[test]
fn test_slot_key_display() {
	assert_eq!(cap("Undo").slot_key().to_string(), "Undo");
	assert_eq!(
		helper("UndoPolicy", "Undo").slot_key().to_string(),
		"UndoPolicy(helper of Undo)"
	);
	assert_eq!(SlotKey::of(CapabilityId::new("Undo")), cap("Undo").slot_key());
}
