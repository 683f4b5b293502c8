//! Dispatch behaviour through the public subject API.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tidings::{
    reporter_fn, Callback, Scope, Subject, SubjectConfig, SubscribeOptions,
};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// No-argument callback appending `name` to `log`.
fn named(log: &Log, name: &'static str) -> Callback<&'static str, i64> {
    let log = Arc::clone(log);
    Callback::no_arg(move || log.lock().push(name))
}

/// Value callback appending `name` to `log`.
fn named_value(log: &Log, name: &'static str) -> Callback<&'static str, i64> {
    let log = Arc::clone(log);
    Callback::value(move |_| log.lock().push(name))
}

fn with_priority(priority: i32) -> SubscribeOptions<&'static str, i64> {
    SubscribeOptions::new().priority(priority)
}

// --- Fast Path ---

#[test]
fn test_fast_path_calls_exactly_the_subscribed_set() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();
    let a = named(&log, "a");
    let b = named(&log, "b");
    let c = named(&log, "c");

    subject.subscribe(a.clone(), &Scope::Global);
    subject.subscribe(b.clone(), &Scope::Global);
    subject.notify(&Scope::Global, None);
    assert_eq!(*log.lock(), vec!["a", "b"]);

    log.lock().clear();
    subject.unsubscribe(&a, &Scope::Global);
    subject.subscribe(c, &Scope::Global);
    subject.notify(&Scope::Global, None);

    let mut called = log.lock().clone();
    called.sort_unstable();
    assert_eq!(called, vec!["b", "c"]);
    assert_eq!(subject.stats().simple_listeners, 2);
}

#[test]
fn test_subscribe_twice_invokes_once() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();
    let a = named(&log, "a");
    let b = named_value(&log, "b");

    subject.subscribe(a.clone(), &Scope::Global);
    subject.subscribe(a, &Scope::Global);
    subject.subscribe_with(b.clone(), &Scope::Global, with_priority(3));
    subject.subscribe_with(b, &Scope::Global, with_priority(3));

    subject.notify(&Scope::Global, Some(&1));
    assert_eq!(*log.lock(), vec!["b", "a"]);
    assert_eq!(subject.listener_count(&Scope::Global), 2);
}

// --- Priority ---

#[test]
fn test_higher_priority_runs_first() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe_with(named_value(&log, "low"), &Scope::Global, with_priority(0));
    subject.subscribe_with(named_value(&log, "high"), &Scope::Global, with_priority(10));

    for _ in 0..3 {
        subject.notify(&Scope::Global, Some(&1));
    }
    assert_eq!(*log.lock(), vec!["high", "low", "high", "low", "high", "low"]);
}

#[test]
fn test_simple_listeners_run_at_priority_zero() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe_with(named_value(&log, "neg"), &Scope::Global, with_priority(-3));
    subject.subscribe(named(&log, "simple"), &Scope::Global);
    subject.subscribe_with(named_value(&log, "pos"), &Scope::Global, with_priority(2));

    subject.notify(&Scope::Global, None);
    assert_eq!(*log.lock(), vec!["pos", "simple", "neg"]);
}

#[test]
fn test_simple_listeners_run_last_when_all_records_are_positive() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe(named(&log, "simple"), &Scope::key("k"));
    subject.subscribe_with(named_value(&log, "p1"), &Scope::key("k"), with_priority(1));

    subject.notify_with(&Scope::key("k"), None, false);
    assert_eq!(*log.lock(), vec!["p1", "simple"]);
}

#[test]
fn test_equal_priorities_run_in_subscription_order() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();
    for name in ["first", "second", "third"] {
        subject.subscribe_with(named_value(&log, name), &Scope::Global, with_priority(5));
    }

    subject.notify(&Scope::Global, None);
    assert_eq!(*log.lock(), vec!["first", "second", "third"]);
}

// --- Topics ---

#[test]
fn test_key_isolation() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe(named(&log, "only-a"), &Scope::key("A"));
    subject.subscribe(named(&log, "global"), &Scope::Global);

    subject.notify(&Scope::key("B"), None);
    assert_eq!(*log.lock(), vec!["global"]);

    log.lock().clear();
    subject.notify_with(&Scope::key("B"), None, false);
    assert!(log.lock().is_empty());

    subject.notify_with(&Scope::key("A"), None, false);
    assert_eq!(*log.lock(), vec!["only-a"]);
}

#[test]
fn test_global_wins_ties_when_merged_with_topic() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe_with(named_value(&log, "g9"), &Scope::Global, with_priority(9));
    subject.subscribe_with(named_value(&log, "g5"), &Scope::Global, with_priority(5));
    subject.subscribe_with(named_value(&log, "g0"), &Scope::Global, with_priority(0));
    subject.subscribe_with(named_value(&log, "t7"), &Scope::key("t"), with_priority(7));
    subject.subscribe_with(named_value(&log, "t0"), &Scope::key("t"), with_priority(0));

    subject.notify(&Scope::key("t"), Some(&0));
    assert_eq!(*log.lock(), vec!["g9", "t7", "g5", "g0", "t0"]);
}

#[test]
fn test_simple_pair_calls_global_then_topic() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe(named(&log, "topic"), &Scope::key("t"));
    subject.subscribe(named(&log, "global"), &Scope::Global);

    subject.notify(&Scope::key("t"), None);
    let mut called = log.lock().clone();
    called.sort_unstable();
    assert_eq!(called, vec!["global", "topic"]);
}

#[test]
fn test_listeners_receive_the_topic_key() {
    let subject: Subject<&str, i64> = Subject::new();
    let seen: Arc<Mutex<Vec<(Option<&'static str>, Option<i64>)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    subject.subscribe(
        Callback::key_value(move |k, v| sink.lock().push((k.copied(), v.copied()))),
        &Scope::Global,
    );

    subject.notify(&Scope::Global, Some(&1));
    subject.notify(&Scope::key("price"), Some(&2));

    assert_eq!(*seen.lock(), vec![(None, Some(1)), (Some("price"), Some(2))]);
}

#[test]
fn test_fan_in_over_several_keys() {
    let subject: Subject<&str, i64> = Subject::new();
    let seen: Arc<Mutex<Vec<(&'static str, Option<&'static str>)>>> = Arc::new(Mutex::new(Vec::new()));

    let record = |name: &'static str| {
        let sink = Arc::clone(&seen);
        Callback::key_value(move |k, _| sink.lock().push((name, k.copied())))
    };

    subject.subscribe_with(record("a"), &Scope::key("a"), with_priority(1));
    subject.subscribe_with(record("b"), &Scope::key("b"), with_priority(4));
    subject.subscribe_with(record("global"), &Scope::Global, with_priority(2));
    subject.subscribe_with(record("c"), &Scope::key("c"), with_priority(9));

    subject.notify(&Scope::keys(["a", "b"]), Some(&0));
    assert_eq!(
        *seen.lock(),
        vec![("b", Some("b")), ("global", None), ("a", Some("a"))]
    );

    seen.lock().clear();
    subject.notify_with(&Scope::keys(["a", "b"]), Some(&0), false);
    assert_eq!(*seen.lock(), vec![("b", Some("b")), ("a", Some("a"))]);
}

#[test]
fn test_fan_out_subscribe_and_unsubscribe() {
    let subject: Subject<&str, i64> = Subject::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let cb: Callback<&str, i64> = Callback::no_arg(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    subject.subscribe(cb.clone(), &Scope::keys(["x", "y"]));
    assert_eq!(subject.listener_count(&Scope::key("x")), 1);
    assert_eq!(subject.listener_count(&Scope::key("y")), 1);

    subject.notify(&Scope::key("x"), None);
    subject.notify(&Scope::key("y"), None);
    assert_eq!(count.load(Ordering::SeqCst), 2);

    subject.unsubscribe(&cb, &Scope::keys(["x", "y"]));
    subject.notify(&Scope::keys(["x", "y"]), None);
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(!subject.has_listeners());
}

// --- Predicates ---

#[test]
fn test_predicate_gates_on_live_value() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe_with(
        named_value(&log, "big"),
        &Scope::Global,
        SubscribeOptions::<&str, i64>::new().predicate(|_, v| v.map_or(false, |v| *v > 100)),
    );

    subject.notify(&Scope::Global, Some(&50));
    assert!(log.lock().is_empty());

    subject.notify(&Scope::Global, Some(&150));
    assert_eq!(*log.lock(), vec!["big"]);
}

#[test]
fn test_predicate_sees_topic_key() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();

    subject.subscribe_with(
        named_value(&log, "hit"),
        &Scope::Global,
        SubscribeOptions::<&str, i64>::new().predicate(|k, _| k == Some(&"wanted")),
    );

    subject.notify(&Scope::key("other"), None);
    subject.notify(&Scope::key("wanted"), None);
    assert_eq!(*log.lock(), vec!["hit"]);
}

// --- Failure Isolation ---

#[test]
fn test_panicking_listener_is_reported_and_batch_continues() {
    init_tracing();
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let subject: Subject<&str, i64> = Subject::with_reporter(
        SubjectConfig::labelled("orders"),
        reporter_fn(move |error, ctx| {
            sink.lock().push((error.to_string(), ctx.subject.to_string(), ctx.position));
        }),
    );

    let log = log();
    subject.subscribe_with(named_value(&log, "one"), &Scope::Global, with_priority(3));
    subject.subscribe_with(
        Callback::value(|_| panic!("listener two failed")),
        &Scope::Global,
        with_priority(2),
    );
    subject.subscribe_with(named_value(&log, "three"), &Scope::Global, with_priority(1));

    subject.notify(&Scope::Global, Some(&1));

    assert_eq!(*log.lock(), vec!["one", "three"]);
    let reports = reports.lock();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "Listener panicked: listener two failed");
    assert_eq!(reports[0].1, "orders");
    assert_eq!(reports[0].2, 1);
}

#[test]
fn test_panicking_simple_listener_is_isolated() {
    init_tracing();
    let failures = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&failures);
    let subject: Subject<&str, i64> = Subject::with_reporter(
        SubjectConfig::default(),
        reporter_fn(move |_, _| {
            f.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let log = log();
    subject.subscribe(named(&log, "before"), &Scope::Global);
    subject.subscribe(Callback::no_arg(|| panic!("simple failure")), &Scope::Global);
    subject.subscribe(named(&log, "after"), &Scope::Global);

    subject.notify(&Scope::Global, None);
    assert_eq!(*log.lock(), vec!["before", "after"]);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_predicate_is_reported() {
    init_tracing();
    let failures = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&failures);
    let subject: Subject<&str, i64> = Subject::with_reporter(
        SubjectConfig::default(),
        reporter_fn(move |_, _| {
            f.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let log = log();
    subject.subscribe_with(
        named_value(&log, "never"),
        &Scope::Global,
        SubscribeOptions::new().predicate(|_, _| panic!("bad predicate")),
    );
    subject.subscribe(named(&log, "ok"), &Scope::Global);

    subject.notify(&Scope::Global, None);
    assert_eq!(*log.lock(), vec!["ok"]);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

// --- Lifecycle ---

#[test]
fn test_dispose_freezes_state() {
    let subject: Subject<&str, i64> = Subject::new();
    let log = log();
    let a = named(&log, "a");

    subject.subscribe(a.clone(), &Scope::Global);
    subject.subscribe(named(&log, "k"), &Scope::key("k"));
    subject.dispose();
    assert!(subject.is_disposed());

    assert_eq!(subject.listener_count(&Scope::Global), 0);
    assert_eq!(subject.listener_count(&Scope::key("k")), 0);

    subject.subscribe(named(&log, "late"), &Scope::Global);
    subject.unsubscribe(&a, &Scope::Global);
    subject.notify(&Scope::Global, None);
    subject.notify(&Scope::key("k"), None);

    assert!(log.lock().is_empty());
    assert_eq!(subject.listener_count(&Scope::Global), 0);
    assert!(subject.stats().disposed);

    // Idempotent.
    subject.dispose();
    assert!(subject.is_disposed());
}

#[test]
fn test_value_shapes() {
    let subject: Subject<&str, i64> = Subject::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    subject.subscribe(
        Callback::value(move |v| sink.lock().push(format!("value {:?}", v))),
        &Scope::Global,
    );
    let sink = Arc::clone(&seen);
    subject.subscribe_with(
        Callback::key_value_subject(move |k, v, s| {
            sink.lock().push(format!("{} {:?} {:?}", s.label(), k, v));
        }),
        &Scope::Global,
        with_priority(1),
    );

    subject.notify(&Scope::key("k"), Some(&7));
    assert_eq!(
        *seen.lock(),
        vec![
            "subject Some(\"k\") Some(7)".to_string(),
            "value Some(7)".to_string(),
        ]
    );
}
