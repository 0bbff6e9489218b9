/*!
 * Heap Supervisor Tests
 * Environment configuration and end-to-end shedding
 */

use arc_swap::ArcSwapOption;
use memshed::core::limits::HEAP_BAND_ENV;
use memshed::{Collector, HeapBand, ResetRegistry, Supervisor};
use serial_test::serial;
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn eventually(check: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(Instant::now() < deadline, "condition never held");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
#[serial]
fn test_band_from_env() {
    env::set_var(HEAP_BAND_ENV, "1024:8192");
    assert_eq!(
        HeapBand::from_env(),
        HeapBand {
            lo: Some(1024),
            hi: Some(8192)
        }
    );

    env::set_var(HEAP_BAND_ENV, "not a band");
    assert_eq!(HeapBand::from_env(), HeapBand::UNBOUNDED);

    env::remove_var(HEAP_BAND_ENV);
    assert_eq!(HeapBand::from_env(), HeapBand::UNBOUNDED);
}

#[test]
#[serial]
fn test_spawn_from_env_unconfigured_is_quiet() {
    env::remove_var(HEAP_BAND_ENV);

    let collector = Collector::with_min_interval(Duration::ZERO);
    collector.record_alloc(1 << 20);

    let mut supervisor = Supervisor::spawn_from_env(Arc::clone(&collector));
    assert!(supervisor.band().is_unbounded());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(collector.cycles(), 0);
    supervisor.shutdown();
}

#[test]
fn test_pressure_clears_watched_pointers() {
    let collector = Collector::with_min_interval(Duration::ZERO);
    let registry = ResetRegistry::new(Arc::clone(&collector));

    let cache: Arc<ArcSwapOption<Vec<u8>>> =
        Arc::new(ArcSwapOption::from_pointee(vec![0u8; 64 * 1024]));
    registry.watch(&cache).unwrap();
    collector.record_alloc(64 * 1024);

    let band = HeapBand {
        lo: None,
        hi: Some(4 * 1024),
    };
    let mut supervisor = Supervisor::spawn(
        Arc::clone(&collector),
        band,
        Duration::from_millis(5),
    );

    // Gauge over the hard bound: the supervisor forces a pressure cycle and
    // the registry clears the watched cache
    eventually(|| cache.load().is_none());

    supervisor.shutdown();
    registry.unwatch(&cache).unwrap();
}

#[test]
fn test_shutdown_is_idempotent() {
    let collector = Collector::with_min_interval(Duration::ZERO);
    let mut supervisor = Supervisor::spawn(
        collector,
        HeapBand::UNBOUNDED,
        Duration::from_millis(5),
    );
    supervisor.shutdown();
    supervisor.shutdown();
}
