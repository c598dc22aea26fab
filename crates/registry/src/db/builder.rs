//! Loads static registrations into a [`Registry`].

use super::{BossReg, FactoryReg, plugin};
use crate::error::Result;
use crate::registry::{OverridePolicy, Registry};

pub(super) fn build_global() -> Result<Registry> {
	let registry = Registry::new("global");
	load_static(&registry).inspect_err(|e| tracing::error!(error = %e, "static capability registration failed"))?;
	plugin::run_plugins(&registry).inspect_err(|e| tracing::error!(error = %e, "capability plugin failed"))?;
	Ok(registry)
}

/// Defines every submitted [`BossReg`] and registers every [`FactoryReg`].
///
/// Records are applied sorted by name so the outcome (and the first error
/// reported) does not depend on link order.
pub fn load_static(registry: &Registry) -> Result<()> {
	let mut bosses: Vec<&'static BossReg> = inventory::iter::<BossReg>.into_iter().collect();
	bosses.sort_by(|a, b| a.name.cmp(b.name).then_with(|| a.crate_name.cmp(b.crate_name)));

	let mut factories: Vec<&'static FactoryReg> = inventory::iter::<FactoryReg>.into_iter().collect();
	factories.sort_by(|a, b| {
		a.boss
			.cmp(b.boss)
			.then_with(|| a.capability.cmp(&b.capability))
			.then_with(|| a.crate_name.cmp(b.crate_name))
	});

	for reg in &bosses {
		registry.define_boss(reg.descriptor()?)?;
	}
	for reg in &factories {
		registry.insert_factory(reg.boss(), reg.entry(), OverridePolicy::Reject)?;
	}

	tracing::debug!(
		registry = registry.label(),
		bosses = bosses.len(),
		factories = factories.len(),
		"loaded static capability registrations"
	);
	Ok(())
}
