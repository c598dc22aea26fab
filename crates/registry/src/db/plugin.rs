use crate::error::Result;
use crate::registry::Registry;

/// A plugin that registers bosses and factories when the global registry is built.
///
/// Submit one with `inventory`:
///
/// ```ignore
/// whisper_registry::inventory::submit! {
///     whisper_registry::db::PluginDef::new("spell", 10, register_spell)
/// }
/// ```
pub struct PluginDef {
	pub name: &'static str,
	/// Lower runs first.
	pub priority: i16,
	/// Called once against the registry being built.
	pub register: fn(&Registry) -> Result<()>,
}

inventory::collect!(PluginDef);

impl PluginDef {
	/// Creates a new plugin definition.
	pub const fn new(name: &'static str, priority: i16, register: fn(&Registry) -> Result<()>) -> Self {
		Self {
			name,
			priority,
			register,
		}
	}
}

/// Runs every submitted [`PluginDef`] against `registry`, by priority then name.
pub fn run_plugins(registry: &Registry) -> Result<()> {
	let mut plugins: Vec<&'static PluginDef> = inventory::iter::<PluginDef>.into_iter().collect();
	plugins.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name)));

	for plugin in plugins {
		tracing::debug!(plugin = plugin.name, priority = plugin.priority, "running capability plugin");
		(plugin.register)(registry)?;
	}

	Ok(())
}
