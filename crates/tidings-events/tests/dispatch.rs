//! End-to-end dispatch behaviour across threads and wall-clock time.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};
use std::thread;
use std::time::Duration;

use serde_json::json;
use tidings_events::{Bus, BusConfig, Event, FaultPolicy, event};
use tidings_telemetry::{LogFormat, LoggingConfig, init_logging};

const THREADS: usize = 8;
const EVENTS_PER_THREAD: usize = 500;

static LOGGING: Once = Once::new();

fn install_logging() {
    LOGGING.call_once(|| {
        let settings = json!({
            "log_level": "tidings_events=debug",
            "log_format": "pretty",
            "log_target": true
        });
        let config = LoggingConfig::from_json(&settings);
        assert_eq!(config.format, LogFormat::Pretty);
        let _ = init_logging(&config);
    });
}

fn counting_bus() -> (Bus, Arc<AtomicUsize>) {
    let bus = Bus::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    bus.subscribe(move |_: &Event| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (bus, hits)
}

#[test]
fn concurrent_publishers_are_counted_exactly_once() {
    install_logging();
    let (bus, hits) = counting_bus();
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let sink = Arc::clone(&seen);
    bus.subscribe(move |event: &Event| {
        let key = (event.id(), event.arg(0).and_then(tidings_events::Arg::as_u64));
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
    });

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let bus = bus.clone();
            scope.spawn(move || {
                let id = i64::try_from(worker).expect("worker index fits");
                for sequence in 0..EVENTS_PER_THREAD {
                    let sequence = u64::try_from(sequence).expect("sequence fits");
                    bus.publish(&event!(id, sequence));
                }
            });
        }
    });

    assert_eq!(hits.load(Ordering::SeqCst), THREADS * EVENTS_PER_THREAD);
    let distinct = seen.lock().unwrap_or_else(PoisonError::into_inner).len();
    assert_eq!(distinct, THREADS * EVENTS_PER_THREAD);
    assert_eq!(
        bus.stats().published,
        u64::try_from(THREADS * EVENTS_PER_THREAD).expect("total fits")
    );
}

#[test]
fn subscribing_while_publishing_loses_no_registrations() {
    install_logging();
    let bus = Bus::new();
    let late_hits = Arc::new(AtomicUsize::new(0));

    thread::scope(|scope| {
        let publisher = bus.clone();
        scope.spawn(move || {
            for _ in 0..1_000 {
                publisher.emit(1, [0_u8]);
            }
        });
        for _ in 0..50 {
            let counter = Arc::clone(&late_hits);
            bus.subscribe_to_id(2, move |_: &Event| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    });

    assert_eq!(bus.scoped_subscriber_count(2), 50);
    bus.publish(&Event::bare(2));
    assert_eq!(late_hits.load(Ordering::SeqCst), 50);
}

#[test]
fn limited_publish_honours_the_wall_clock_window() {
    install_logging();
    let (bus, hits) = counting_bus();

    bus.publish_limited(&Event::bare(1));
    bus.publish_limited(&Event::bare(1));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    thread::sleep(Duration::from_millis(210));
    bus.emit_limited(1, ["again"]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    bus.publish_limited(&Event::bare(2));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(bus.stats().throttled, 1);
}

#[test]
fn concurrent_limited_publishes_admit_a_single_event() {
    install_logging();
    let bus = Bus::with_config(BusConfig::default().with_throttle_window(Duration::from_secs(60)));
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    bus.subscribe(move |_: &Event| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let bus = bus.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    bus.publish_limited(&Event::bare(9));
                }
            });
        }
    });

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let stats = bus.stats();
    assert_eq!(stats.published, 1);
    assert_eq!(stats.throttled, u64::try_from(THREADS * 50 - 1).expect("fits"));
}

#[test]
fn subscribers_stay_registered_for_the_life_of_the_bus() {
    install_logging();
    let (bus, hits) = counting_bus();
    for round in 1..=20_usize {
        bus.publish(&Event::bare(0));
        assert_eq!(hits.load(Ordering::SeqCst), round);
    }
    assert_eq!(bus.subscriber_count(), 1);
}

#[test]
fn independent_buses_do_not_share_registrations() {
    install_logging();
    let (first, first_hits) = counting_bus();
    let (second, second_hits) = counting_bus();

    first.publish(&Event::bare(1));
    first.publish_limited(&Event::bare(1));
    second.publish_limited(&Event::bare(1));

    assert_eq!(first_hits.load(Ordering::SeqCst), 2);
    assert_eq!(second_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn isolated_faults_are_counted_across_threads() {
    install_logging();
    let bus = Bus::with_config(BusConfig::default().with_fault_policy(FaultPolicy::Isolate));
    let hits = Arc::new(AtomicUsize::new(0));
    bus.subscribe_to_id(
        3,
        tidings_events::named("always-fails", |event: &Event| {
            panic!("cannot handle event {}", event.id());
        }),
    );
    let counter = Arc::clone(&hits);
    bus.subscribe(move |_: &Event| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    thread::scope(|scope| {
        for _ in 0..4 {
            let bus = bus.clone();
            scope.spawn(move || {
                for _ in 0..10 {
                    bus.publish(&Event::bare(3));
                }
            });
        }
    });

    assert_eq!(hits.load(Ordering::SeqCst), 40);
    assert_eq!(bus.stats().faulted, 40);
}
