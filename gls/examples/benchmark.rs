//! GLS Throughput Benchmark
//!
//! Demonstrates the sharded registry's behavior under concurrent load:
//! - Set/Get throughput within a single context
//! - Context spawn + teardown (sentinel arm + sweep) cost across many
//!   short-lived threads
//! - Registry contention across many concurrent contexts sharing shards

use gls::{GlsConfig, Key};
use std::time::Instant;

static COUNTER_KEY: Key = Key::new();

fn main() -> anyhow::Result<()> {
    gls::init(GlsConfig::default())?;

    println!("=== GLS Benchmark Suite ===\n");

    println!("Benchmark 1: Set/Get throughput (single context)");
    println!("=================================================");
    benchmark_set_get_throughput();
    println!();

    println!("Benchmark 2: Context spawn + teardown cost");
    println!("=================================================");
    benchmark_spawn_teardown();
    println!();

    println!("Benchmark 3: Concurrent contexts sharing the registry");
    println!("=================================================");
    benchmark_concurrent_contexts();
    println!();

    println!("Final metrics report");
    println!("=================================================");
    gls::metrics::global().snapshot().print_report();

    Ok(())
}

fn benchmark_set_get_throughput() {
    const ITERATIONS: usize = 100_000;

    let start = Instant::now();
    for i in 0..ITERATIONS {
        gls::set(&COUNTER_KEY, gls::Data::new(i));
        let _ = gls::get::<usize>(&COUNTER_KEY);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / ITERATIONS as u32;

    println!("{ITERATIONS} set+get cycles in {elapsed:?} ({per_iter:?}/iter)");
}

fn benchmark_spawn_teardown() {
    const ITERATIONS: usize = 1_000;

    let start = Instant::now();
    for i in 0..ITERATIONS {
        std::thread::spawn(move || {
            gls::set(&COUNTER_KEY, gls::Data::new(i));
            gls::at_exit(|| {});
        })
        .join()
        .unwrap();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / ITERATIONS as u32;

    println!(
        "{ITERATIONS} spawn+arm+sweep cycles in {elapsed:?} ({per_iter:?}/iter)"
    );
}

fn benchmark_concurrent_contexts() {
    const CONTEXTS: usize = 64;
    const OPS_PER_CONTEXT: usize = 2_000;

    let start = Instant::now();
    let handles: Vec<_> = (0..CONTEXTS)
        .map(|n| {
            std::thread::spawn(move || {
                for i in 0..OPS_PER_CONTEXT {
                    gls::set(&COUNTER_KEY, gls::Data::new(n * OPS_PER_CONTEXT + i));
                }
                gls::get::<usize>(&COUNTER_KEY)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(CONTEXTS);
    for h in handles {
        results.push(h.join().unwrap());
    }
    let elapsed = start.elapsed();

    println!(
        "{CONTEXTS} contexts x {OPS_PER_CONTEXT} ops in {elapsed:?} ({:?}/op)",
        elapsed / (CONTEXTS * OPS_PER_CONTEXT) as u32
    );
    assert!(results.iter().all(Option::is_some));
}
