//! Cross-context scenarios and invariants from the testable-properties
//! section: these inherently need multiple real OS threads and so cannot
//! be expressed as single-module unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use gls::{Data, Key};

static SHARED_KEY: Key = Key::new();

#[test]
fn scenario_d_cross_context_isolation_at_scale() {
    const CONTEXTS: usize = 1000;

    let ids: Arc<Mutex<HashSet<gls::ContextId>>> = Arc::new(Mutex::new(HashSet::new()));
    let mismatches: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));

    let handles: Vec<_> = (0..CONTEXTS)
        .map(|n| {
            let ids = ids.clone();
            let mismatches = mismatches.clone();
            std::thread::spawn(move || {
                gls::set(&SHARED_KEY, Data::new(n));
                ids.lock().unwrap().insert(gls::id());

                // Give other contexts a chance to race on the same key.
                std::thread::yield_now();

                match gls::get::<usize>(&SHARED_KEY) {
                    Some(v) if v == n => {}
                    _ => *mismatches.lock().unwrap() += 1,
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(ids.lock().unwrap().len(), CONTEXTS, "ids must all be distinct");
    assert_eq!(*mismatches.lock().unwrap(), 0, "no context observed another's value");
}

#[test]
fn p6_noninterference_under_n_parallel_contexts() {
    const CONTEXTS: usize = 32;
    const OPS: usize = 200;

    static LOCAL_KEY: Key = Key::new();

    let handles: Vec<_> = (0..CONTEXTS)
        .map(|n| {
            std::thread::spawn(move || {
                for i in 0..OPS {
                    let value = n * OPS + i;
                    gls::set(&LOCAL_KEY, Data::new(value));
                    assert_eq!(gls::get::<usize>(&LOCAL_KEY), Some(value));
                }
                gls::get::<usize>(&LOCAL_KEY)
            })
        })
        .collect();

    for (n, h) in handles.into_iter().enumerate() {
        let expected = n * OPS + (OPS - 1);
        assert_eq!(h.join().unwrap(), Some(expected));
    }
}

#[test]
fn scenario_e_profiler_overwrite_resilience() {
    static KEY: Key = Key::new();
    let ran = Arc::new(Mutex::new(false));
    let ran2 = ran.clone();

    std::thread::spawn(move || {
        gls::set(&KEY, Data::new(1));
        gls::at_exit(move || *ran2.lock().unwrap() = true);

        // A profiler replaces our sentinel while the context is still
        // alive and running this very call.
        gls::pprof::simulate_profiler_overwrite();

        // The context is still alive: nothing should have been swept yet.
        assert_eq!(gls::get::<i32>(&KEY), Some(1));
        assert!(!*ran.lock().unwrap());
    })
    .join()
    .unwrap();

    // The thread has since actually exited: the re-armed sentinel must
    // still fire the real sweep.
    assert!(*ran.lock().unwrap());
}

#[test]
fn scenario_f_unload_inside_at_exit_reentrancy() {
    let completed = Arc::new(Mutex::new(false));
    let completed2 = completed.clone();

    std::thread::spawn(move || {
        static KEY: Key = Key::new();
        gls::set(&KEY, Data::new(1));
        gls::at_exit(move || {
            gls::unload();
            *completed2.lock().unwrap() = true;
        });
    })
    .join()
    .unwrap();

    assert!(*completed.lock().unwrap());
}

#[test]
fn t1_t2_all_callbacks_run_exactly_once_in_reverse_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    std::thread::spawn({
        let order = order.clone();
        move || {
            for i in 0..5 {
                let order = order.clone();
                gls::at_exit(move || order.lock().unwrap().push(i));
            }
        }
    })
    .join()
    .unwrap();

    assert_eq!(*order.lock().unwrap(), vec![4, 3, 2, 1, 0]);
}

#[test]
fn t3_panicking_callback_does_not_stop_subsequent_callbacks() {
    let ran = Arc::new(Mutex::new(Vec::new()));

    std::thread::spawn({
        let ran = ran.clone();
        move || {
            gls::at_exit(|| panic!("first callback panics"));
            {
                let ran = ran.clone();
                gls::at_exit(move || ran.lock().unwrap().push("second"));
            }
        }
    })
    .join()
    .unwrap();

    assert_eq!(*ran.lock().unwrap(), vec!["second"]);
}
