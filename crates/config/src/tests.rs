use pretty_assertions::assert_eq;
use whisper_registry::{Component, Registry, Unknown, interface};

use super::*;

const WINDOWS: &str = r#"
boss "Window" {
    capability "IWindow"
    capability "IDrawable"
}

boss "Document" extends="Window" {
    capability "IUndoManager"
    capability "IUndoPolicy" helper-of="IUndoManager"
}
"#;

trait Window: Unknown {}
trait Drawable: Unknown {}
trait UndoManager: Unknown {}
trait UndoPolicy: Unknown {}

interface!(
	dyn Window => "IWindow",
	dyn Drawable => "IDrawable",
	dyn UndoManager => "IUndoManager",
	dyn UndoPolicy => "IUndoPolicy",
);

struct Stub;

impl Unknown for Stub {}
impl Window for Stub {}
impl Drawable for Stub {}
impl UndoManager for Stub {}
impl UndoPolicy for Stub {}

#[test]
fn test_parse_document() {
	let config = BossConfig::parse(WINDOWS).unwrap();
	assert!(config.warnings.is_empty());

	let names: Vec<_> = config.bosses.iter().map(|b| b.name.as_str()).collect();
	assert_eq!(names, ["Window", "Document"]);
	let document = config.get("Document").unwrap();
	assert_eq!(document.extends.as_deref(), Some("Window"));
	assert_eq!(document.capabilities[1].helper_of.as_deref(), Some("IUndoManager"));
}

#[test]
fn test_unknown_top_level_node_warns() {
	let config = BossConfig::parse("theme \"dark\"\nboss \"Window\" { capability \"IWindow\" }").unwrap();
	assert_eq!(config.bosses.len(), 1);
	assert_eq!(
		config.warnings,
		vec![ConfigWarning::UnknownNode {
			node: "theme".into(),
			found_in: "document",
		}]
	);
	assert_eq!(
		config.warnings[0].to_string(),
		"unknown node 'theme' in document will be ignored"
	);
}

#[test]
fn test_invalid_kdl_is_an_error() {
	let err = BossConfig::parse("boss \"Window\" {").unwrap_err();
	assert!(matches!(err, ConfigError::Kdl(_)), "{err}");
}

#[test]
fn test_merge_appends_new_bosses() {
	let mut base = BossConfig::parse(WINDOWS).unwrap();
	let overlay = BossConfig::parse("boss \"Dialog\" extends=\"Window\" {}\nlayout \"grid\"").unwrap();

	base.merge(overlay).unwrap();
	let names: Vec<_> = base.bosses.iter().map(|b| b.name.as_str()).collect();
	assert_eq!(names, ["Window", "Document", "Dialog"]);
	assert_eq!(base.warnings.len(), 1);
}

#[test]
fn test_merge_rejects_redefined_boss() {
	let mut base = BossConfig::parse(WINDOWS).unwrap();
	let overlay = BossConfig::parse(
		r#"
boss "Dialog" extends="Window" {}
boss "Window" {
    capability "IWindow"
}
"#,
	)
	.unwrap();

	let err = base.merge(overlay).unwrap_err();
	assert!(matches!(&err, ConfigError::DuplicateBoss { boss } if boss == "Window"), "{err}");
	assert_eq!(err.to_string(), "boss 'Window' is defined more than once");
	let names: Vec<_> = base.bosses.iter().map(|b| b.name.as_str()).collect();
	assert_eq!(names, ["Window", "Document"]);
	assert_eq!(base.get("Window").unwrap().capabilities.len(), 2);
}

#[test]
fn test_parse_rejects_boss_defined_twice() {
	let err = BossConfig::parse("boss \"Window\" {}\nboss \"Window\" {}").unwrap_err();
	assert!(matches!(err, ConfigError::DuplicateBoss { .. }), "{err}");
}

#[test]
fn test_load_missing_file_reports_path() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("absent.kdl");
	match BossConfig::load(&path).unwrap_err() {
		ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn test_load_dir_merges_in_name_order_and_skips_bad_files() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("20-windows.kdl"), WINDOWS).unwrap();
	std::fs::write(
		dir.path().join("10-dialog.kdl"),
		"boss \"Dialog\" extends=\"Window\" { capability \"IUndoManager\" }",
	)
	.unwrap();
	std::fs::write(dir.path().join("30-broken.kdl"), "boss \"Broken\" {").unwrap();
	std::fs::write(dir.path().join("notes.txt"), "boss \"Ignored\" {}").unwrap();

	let config = BossConfig::load_dir(dir.path()).unwrap();
	let names: Vec<_> = config.bosses.iter().map(|b| b.name.as_str()).collect();
	assert_eq!(names, ["Dialog", "Window", "Document"]);
	assert_eq!(config.get("Dialog").unwrap().capabilities.len(), 1);
}

#[test]
fn test_load_dir_rejects_boss_defined_in_two_files() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("10-windows.kdl"), WINDOWS).unwrap();
	std::fs::write(
		dir.path().join("20-override.kdl"),
		"boss \"Document\" extends=\"Window\" { capability \"IUndoManager\" }",
	)
	.unwrap();

	let err = BossConfig::load_dir(dir.path()).unwrap_err();
	assert!(matches!(&err, ConfigError::DuplicateBoss { boss } if boss == "Document"), "{err}");
}

#[test]
fn test_apply_defines_creatable_bosses() {
	let registry = Registry::new("config");
	let config = BossConfig::parse(WINDOWS).unwrap();
	assert_eq!(config.apply(&registry).unwrap(), 2);
	assert_eq!(registry.boss_names(), ["Document", "Window"]);

	registry
		.register::<dyn Window, _>("Window", |_| Ok(Component::new::<dyn Window>(Box::new(Stub))))
		.unwrap();
	registry
		.register::<dyn Drawable, _>("Window", |_| Ok(Component::new::<dyn Drawable>(Box::new(Stub))))
		.unwrap();
	registry
		.register::<dyn UndoManager, _>("Document", |_| Ok(Component::new::<dyn UndoManager>(Box::new(Stub))))
		.unwrap();
	registry
		.register::<dyn UndoPolicy, _>("Document", |_| Ok(Component::new::<dyn UndoPolicy>(Box::new(Stub))))
		.unwrap();

	let undo = registry.create_boss("Document").unwrap().query::<dyn UndoManager>().unwrap();
	assert!(undo.helper::<dyn UndoPolicy>().is_some());
	assert!(undo.query::<dyn Drawable>().is_some());
}

#[test]
fn test_apply_reports_registry_conflicts() {
	let registry = Registry::new("config");
	let config = BossConfig::parse(WINDOWS).unwrap();
	config.apply(&registry).unwrap();

	let err = config.apply(&registry).unwrap_err();
	assert!(
		matches!(err, ConfigError::Registry(whisper_registry::Error::DuplicateBoss { .. })),
		"{err}"
	);
}
