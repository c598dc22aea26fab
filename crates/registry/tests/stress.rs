//! Many threads creating, sharing and releasing bosses at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use whisper_registry::{BossDescriptor, BossLink, Component, DescriptorEntry, Handle, Registry, Unknown, interface};

trait Meter: Unknown {
	fn tick(&mut self) -> usize;
	fn count(&self) -> usize;
}

trait Gauge: Unknown {
	fn ticks(&self) -> Option<usize>;
	/// Reads the meter without ticking it.
	fn peek(&self) -> Option<usize>;
}

interface!(dyn Meter => "Meter", dyn Gauge => "Gauge");

#[derive(Default)]
struct Counters {
	built: AtomicUsize,
	torn: AtomicUsize,
}

struct Tick {
	count: usize,
	counters: Arc<Counters>,
}

impl Unknown for Tick {
	fn teardown(&mut self) {
		self.counters.torn.fetch_add(1, Ordering::SeqCst);
	}
}

impl Meter for Tick {
	fn tick(&mut self) -> usize {
		self.count += 1;
		self.count
	}

	fn count(&self) -> usize {
		self.count
	}
}

struct Reader {
	link: BossLink,
	counters: Arc<Counters>,
}

impl Unknown for Reader {
	fn attach(&mut self, link: BossLink) {
		self.link = link;
	}

	fn teardown(&mut self) {
		assert!(self.link.query::<dyn Meter>().is_none(), "sibling reachable during teardown");
		self.counters.torn.fetch_add(1, Ordering::SeqCst);
	}
}

impl Gauge for Reader {
	fn ticks(&self) -> Option<usize> {
		let meter: Handle<dyn Meter> = self.link.query()?;
		let mut meter = meter.write();
		Some(meter.tick())
	}

	fn peek(&self) -> Option<usize> {
		let meter: Handle<dyn Meter> = self.link.query()?;
		Some(meter.read().count())
	}
}

fn registry(counters: &Arc<Counters>) -> Registry {
	let registry = Registry::new("stress");
	registry
		.define_boss(
			BossDescriptor::define("Instrument", [DescriptorEntry::of::<dyn Meter>(), DescriptorEntry::of::<dyn Gauge>()]).unwrap(),
		)
		.unwrap();

	let c = counters.clone();
	registry
		.register::<dyn Meter, _>("Instrument", move |_| {
			c.built.fetch_add(1, Ordering::SeqCst);
			Ok(Component::new::<dyn Meter>(Box::new(Tick {
				count: 0,
				counters: c.clone(),
			})))
		})
		.unwrap();
	let c = counters.clone();
	registry
		.register::<dyn Gauge, _>("Instrument", move |_| {
			c.built.fetch_add(1, Ordering::SeqCst);
			Ok(Component::new::<dyn Gauge>(Box::new(Reader {
				link: BossLink::detached(),
				counters: c.clone(),
			})))
		})
		.unwrap();
	registry
}

#[test]
fn concurrent_sharing_tears_down_each_implementation_once() {
	let counters = Arc::new(Counters::default());
	let registry = registry(&counters);

	std::thread::scope(|scope| {
		for _ in 0..8 {
			scope.spawn(|| {
				for _ in 0..64 {
					let meter = registry.create::<dyn Meter>("Instrument").unwrap();
					let gauge = meter.query::<dyn Gauge>().unwrap();

					std::thread::scope(|inner| {
						for _ in 0..4 {
							let meter = meter.clone();
							let gauge = gauge.clone();
							inner.spawn(move || {
								meter.write().tick();
								assert!(gauge.read().ticks().is_some());

								// Reading the meter back through its sibling while
								// other threads queue for writes.
								let outer = meter.read();
								assert_eq!(gauge.read().peek(), Some(outer.count()));
							});
						}
					});

					assert_eq!(meter.read().count(), 8);
				}
			});
		}
	});

	assert_eq!(registry.live_bosses(), 0);
	assert_eq!(counters.built.load(Ordering::SeqCst), 8 * 64 * 2);
	assert_eq!(counters.torn.load(Ordering::SeqCst), counters.built.load(Ordering::SeqCst));
}
