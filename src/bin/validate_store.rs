// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Validation binary for the versioned store.
//!
//! Run this on a target machine to verify version resolution on the local
//! disk and measure operation latency.
//!
//! Usage:
//!   ./validate_store [path]          # Human-readable output
//!   ./validate_store [path] --json   # JSON output

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use strontiumkv::engine::{RocksVersionedStore, StoreError};
use strontiumkv::storage::{Key, StoreConfig, Value};
use strontiumkv::version::{ClockEntry, VectorClock, VersionError, Versioned};

const LATENCY_SAMPLES: usize = 10_000;

type CheckResult = Result<bool, Box<dyn Error>>;

struct Check {
    name: &'static str,
    passed: bool,
    error: Option<String>,
}

impl Check {
    fn record(name: &'static str, outcome: CheckResult) -> Self {
        match outcome {
            Ok(passed) => Self {
                name,
                passed,
                error: None,
            },
            Err(e) => Self {
                name,
                passed: false,
                error: Some(e.to_string()),
            },
        }
    }
}

struct Latency {
    p50_ns: u64,
    p99_ns: u64,
    max_ns: u64,
    failures: usize,
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json_mode = args.iter().any(|a| a == "--json");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("strontiumkv-validate"));

    let store = match RocksVersionedStore::open(&path, StoreConfig::default()) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("failed to open store at {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };
    // Leftovers from a previous run would show up as siblings
    if let Err(e) = store.truncate() {
        eprintln!("failed to reset store at {}: {}", path.display(), e);
        std::process::exit(1);
    }

    let checks = run_checks(&store);
    let put = measure_put(&store);
    let get = measure_get(&store);
    let cleanup = store.truncate().and_then(|()| store.close());

    if json_mode {
        print_json(&store, &checks, &put, &get);
    } else {
        print_human(&store, &checks, &put, &get);
    }

    if let Err(e) = cleanup {
        eprintln!("failed to clean up store: {}", e);
        std::process::exit(1);
    }
    if checks.iter().any(|p| !p.passed) || put.failures > 0 || get.failures > 0 {
        std::process::exit(2);
    }
}

fn clock(node: u16, counter: u64) -> Result<VectorClock, VersionError> {
    VectorClock::from_entries([ClockEntry::new(node, counter)], 0)
}

fn run_checks(store: &RocksVersionedStore) -> Vec<Check> {
    vec![
        Check::record("put_get_roundtrip", check_roundtrip(store)),
        Check::record("obsolete_write_rejected", check_obsolete(store)),
        Check::record("concurrent_siblings_kept", check_siblings(store)),
        Check::record("delete_removes_ancestors", check_delete(store)),
        Check::record("truncate_empties_store", check_truncate(store)),
    ]
}

fn check_roundtrip(store: &RocksVersionedStore) -> CheckResult {
    let key = Key::from("check:roundtrip");
    let versioned = Versioned::new(Value::from("value"), clock(1, 1)?);
    store.put(&key, versioned.clone())?;
    Ok(store.get(&key)? == vec![versioned])
}

fn check_obsolete(store: &RocksVersionedStore) -> CheckResult {
    let key = Key::from("check:obsolete");
    store.put(&key, Versioned::new(Value::from("new"), clock(1, 2)?))?;
    match store.put(&key, Versioned::new(Value::from("old"), clock(1, 1)?)) {
        Err(StoreError::ObsoleteVersion { .. }) => Ok(store.get(&key)?.len() == 1),
        Err(e) => Err(e.into()),
        Ok(()) => Ok(false),
    }
}

fn check_siblings(store: &RocksVersionedStore) -> CheckResult {
    let key = Key::from("check:siblings");
    store.put(&key, Versioned::new(Value::from("a"), clock(1, 1)?))?;
    store.put(&key, Versioned::new(Value::from("b"), clock(2, 1)?))?;
    Ok(store.get(&key)?.len() == 2)
}

fn check_delete(store: &RocksVersionedStore) -> CheckResult {
    let key = Key::from("check:delete");
    store.put(&key, Versioned::new(Value::from("a"), clock(1, 1)?))?;
    store.put(&key, Versioned::new(Value::from("b"), clock(2, 1)?))?;
    let deleted = store.delete(&key, &clock(1, 2)?)?;
    Ok(deleted && store.get(&key)?.len() == 1)
}

fn check_truncate(store: &RocksVersionedStore) -> CheckResult {
    store.truncate()?;
    Ok(store.keys()?.count() == 0)
}

/// Summarizes successful samples. All percentiles are zero if every call failed.
fn summarize(mut samples: Vec<u64>, failures: usize) -> Latency {
    samples.sort_unstable();
    let len = samples.len();
    if len == 0 {
        return Latency {
            p50_ns: 0,
            p99_ns: 0,
            max_ns: 0,
            failures,
        };
    }
    Latency {
        p50_ns: samples[len / 2],
        p99_ns: samples[len * 99 / 100],
        max_ns: samples[len - 1],
        failures,
    }
}

/// Times `op` once per sample, keeping only successful calls.
fn measure<T>(mut op: impl FnMut(usize) -> Result<T, StoreError>) -> Latency {
    let mut samples = Vec::with_capacity(LATENCY_SAMPLES);
    let mut failures = 0;
    let mut first_error = None;

    for i in 0..LATENCY_SAMPLES {
        let start = Instant::now();
        let outcome = std::hint::black_box(op(i));
        let elapsed = start.elapsed().as_nanos() as u64;
        match outcome {
            Ok(_) => samples.push(elapsed),
            Err(e) => {
                failures += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = first_error {
        eprintln!("{} of {} calls failed, first error: {}", failures, LATENCY_SAMPLES, e);
    }
    summarize(samples, failures)
}

fn measure_put(store: &RocksVersionedStore) -> Latency {
    let versioned = match clock(1, 1) {
        Ok(clock) => Versioned::new(Value::new(vec![0u8; 100]), clock),
        Err(e) => {
            eprintln!("failed to build clock: {}", e);
            return summarize(Vec::new(), LATENCY_SAMPLES);
        }
    };

    measure(|i| store.put(&Key::from(format!("latency:{:06}", i)), versioned.clone()))
}

fn measure_get(store: &RocksVersionedStore) -> Latency {
    measure(|i| store.get(&Key::from(format!("latency:{:06}", (i * 7919) % LATENCY_SAMPLES))))
}

fn json_string_or_null(s: &Option<String>) -> String {
    match s {
        Some(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
        None => "null".to_string(),
    }
}

fn print_json(store: &RocksVersionedStore, checks: &[Check], put: &Latency, get: &Latency) {
    println!("{{");
    println!("  \"store\": {},", json_string_or_null(&Some(store.name().to_string())));
    println!("  \"checks\": {{");
    for (i, check) in checks.iter().enumerate() {
        let comma = if i + 1 < checks.len() { "," } else { "" };
        println!(
            "    \"{}\": {{ \"passed\": {}, \"error\": {} }}{}",
            check.name,
            check.passed,
            json_string_or_null(&check.error),
            comma
        );
    }
    println!("  }},");
    println!("  \"put_latency_p50_ns\": {},", put.p50_ns);
    println!("  \"put_latency_p99_ns\": {},", put.p99_ns);
    println!("  \"put_latency_max_ns\": {},", put.max_ns);
    println!("  \"put_failures\": {},", put.failures);
    println!("  \"get_latency_p50_ns\": {},", get.p50_ns);
    println!("  \"get_latency_p99_ns\": {},", get.p99_ns);
    println!("  \"get_latency_max_ns\": {},", get.max_ns);
    println!("  \"get_failures\": {}", get.failures);
    println!("}}");
}

fn print_human(store: &RocksVersionedStore, checks: &[Check], put: &Latency, get: &Latency) {
    println!("═══════════════════════════════════════════════════════════════");
    println!("  StrontiumKV Store Validation");
    println!("═══════════════════════════════════════════════════════════════\n");

    println!("  Store: {}\n", store.name());

    println!("── Version Resolution ──────────────────────────────────────────\n");
    for check in checks {
        match (&check.error, check.passed) {
            (Some(e), _) => println!("  ✗ {}: {}", check.name, e),
            (None, true) => println!("  ✓ {}", check.name),
            (None, false) => println!("  ✗ {}", check.name),
        }
    }

    println!("\n── Latency ({} samples) ─────────────────────────────────────\n", LATENCY_SAMPLES);
    print_latency("put", put);
    print_latency("get", get);

    println!("\n═══════════════════════════════════════════════════════════════");
    println!("  Validation Complete");
    println!("═══════════════════════════════════════════════════════════════");
}

fn print_latency(op: &str, latency: &Latency) {
    println!(
        "  {:<4} P50: {:>10} ns  ({:.2} μs)",
        op,
        latency.p50_ns,
        latency.p50_ns as f64 / 1000.0
    );
    println!(
        "       P99: {:>10} ns  ({:.2} μs)",
        latency.p99_ns,
        latency.p99_ns as f64 / 1000.0
    );
    println!(
        "       Max: {:>10} ns  ({:.2} μs)",
        latency.max_ns,
        latency.max_ns as f64 / 1000.0
    );
    if latency.failures > 0 {
        println!("       ✗ {} failed calls excluded", latency.failures);
    }
}
