/*!
 * Reset Registry Tests
 * Slot lifecycle, error taxonomy, dispatch fanout
 */

use memshed::{Collector, CycleReason, RegistryError, ResetRegistry};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn setup() -> (Arc<Collector>, ResetRegistry) {
    let collector = Collector::with_min_interval(Duration::ZERO);
    let registry = ResetRegistry::new(Arc::clone(&collector));
    (collector, registry)
}

fn eventually(check: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(Instant::now() < deadline, "condition never held");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_counters_track_cycles() {
    let (collector, registry) = setup();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));

    let a_count = Arc::clone(&a);
    registry
        .register("a", move || {
            a_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    let b_count = Arc::clone(&b);
    registry
        .register("b", move || {
            b_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    collector.collect(CycleReason::Manual);
    eventually(|| a.load(Ordering::SeqCst) == 1 && b.load(Ordering::SeqCst) == 1);

    registry.unregister("a").unwrap();
    collector.collect(CycleReason::Manual);
    eventually(|| b.load(Ordering::SeqCst) == 2);
    assert_eq!(a.load(Ordering::SeqCst), 1);

    registry.unregister("b").unwrap();
}

#[test]
fn test_empty_identity_leaves_table_untouched() {
    let (_collector, registry) = setup();

    let err = registry.register("", || {}).unwrap_err();
    assert_eq!(err, RegistryError::InvalidIdentity);
    assert!(registry.is_empty());
    assert!(!registry.has_active_subscription());
}

#[test]
fn test_duplicate_keeps_first_action() {
    let (collector, registry) = setup();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let first_count = Arc::clone(&first);
    registry
        .register("x", move || {
            first_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let second_count = Arc::clone(&second);
    let err = registry
        .register("x", move || {
            second_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap_err();
    assert_eq!(err, RegistryError::AlreadyRegistered("x".into()));

    collector.collect(CycleReason::Manual);
    eventually(|| first.load(Ordering::SeqCst) == 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);

    registry.unregister("x").unwrap();
}

#[test]
fn test_register_unregister_restores_state() {
    let (_collector, registry) = setup();
    assert!(registry.is_empty());
    assert!(!registry.has_active_subscription());

    registry.register("transient", || {}).unwrap();
    registry.unregister("transient").unwrap();

    assert!(registry.is_empty());
    assert!(!registry.has_active_subscription());

    // The identity is reusable after removal
    registry.register("transient", || {}).unwrap();
    registry.unregister("transient").unwrap();
}

#[test]
fn test_unregistered_slot_no_longer_fires() {
    let (collector, registry) = setup();
    let count = Arc::new(AtomicUsize::new(0));

    let action_count = Arc::clone(&count);
    registry
        .register("slot", move || {
            action_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    collector.collect(CycleReason::Manual);
    eventually(|| count.load(Ordering::SeqCst) == 1);

    registry.unregister("slot").unwrap();
    collector.collect(CycleReason::Manual);
    // The subscription is torn down; give the pipeline a moment to prove it
    thread::sleep(Duration::from_millis(100));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_register_unregister_storm() {
    let (collector, registry) = setup();
    let registry = Arc::new(registry);

    let churn = Arc::clone(&collector);
    let stop = Arc::new(AtomicUsize::new(0));
    let churn_stop = Arc::clone(&stop);
    let cycler = thread::spawn(move || {
        while churn_stop.load(Ordering::SeqCst) == 0 {
            churn.collect(CycleReason::Manual);
            thread::sleep(Duration::from_millis(1));
        }
    });

    let mut workers = Vec::new();
    for worker in 0..8 {
        let registry = Arc::clone(&registry);
        workers.push(thread::spawn(move || {
            for round in 0..100 {
                let id = format!("slot-{}-{}", worker, round);
                registry.register(id.as_str(), || {}).unwrap();
                registry.unregister(id.as_str()).unwrap();
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
    stop.store(1, Ordering::SeqCst);
    cycler.join().unwrap();

    // No slot survived, so no subscription may survive either
    assert!(registry.is_empty());
    assert!(!registry.has_active_subscription());
}

#[test]
#[serial]
fn test_global_registry_free_functions() {
    let count = Arc::new(AtomicUsize::new(0));

    let action_count = Arc::clone(&count);
    memshed::register("global-slot", move || {
        action_count.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    Collector::global().collect(CycleReason::Manual);
    eventually(|| count.load(Ordering::SeqCst) >= 1);

    memshed::unregister("global-slot").unwrap();
    assert!(matches!(
        memshed::unregister("global-slot"),
        Err(RegistryError::NotRegistered(_))
    ));
}

#[test]
#[serial]
fn test_global_pointer_watch() {
    use arc_swap::ArcSwapOption;

    let slot: Arc<ArcSwapOption<Vec<u8>>> =
        Arc::new(ArcSwapOption::from_pointee(vec![0u8; 512]));

    memshed::watch(&slot).unwrap();
    Collector::global().collect(CycleReason::Manual);
    eventually(|| slot.load().is_none());

    memshed::unwatch(&slot).unwrap();
}
