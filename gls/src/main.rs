//! gls-demo — a small, concrete demonstration of goroutine-style
//! per-context local storage: each spawned thread sets a value, registers
//! LIFO exit callbacks, and its record is swept automatically the moment
//! it exits — no cooperation from the thread body required beyond the
//! GLS calls it already made.

use anyhow::Result;
use gls::{GlsConfig, Key};
use tracing::info;

static GREETING: Key = Key::new();

fn main() -> Result<()> {
    gls::init(GlsConfig::default())?;

    info!("GLS core started");
    info!("spawning {} worker contexts", 4);

    let handles: Vec<_> = (0..4)
        .map(|n| {
            std::thread::spawn(move || {
                gls::set(&GREETING, gls::Data::new(format!("worker-{n}")));
                gls::at_exit(move || info!("worker-{n}: exit callback A"));
                gls::at_exit(move || info!("worker-{n}: exit callback B (runs first)"));

                let greeting = gls::get::<String>(&GREETING).unwrap();
                info!("worker-{n}: {greeting}");
            })
        })
        .collect();

    for h in handles {
        h.join().expect("worker thread panicked");
    }

    let snapshot = gls::metrics::global().snapshot();
    snapshot.print_report();

    Ok(())
}
