//! Async tasks, timers and the promise bridge

use crate::support::{i32_of, run};
use std::time::Instant;
use wavelet::runtime::{PromiseError, PromiseHandle, PromiseRegistry, PromiseState};
use wavelet::{Config, RuntimeConfig, Value};

const INTERLEAVE: &str = "async fn slow() { print(\"a start\"); await sleep(60); print(\"a done\"); }
    async fn fast() { print(\"b start\"); await sleep(10); print(\"b done\"); }
    async fn main() { let a = slow(); let b = fast(); await a; await b; }";

#[test]
fn test_two_tasks_interleave_around_timers() {
    assert_eq!(
        run(INTERLEAVE).output,
        vec!["a start", "b start", "b done", "a done"]
    );
}

#[test]
fn test_interleaving_survives_preemption() {
    let config = Config {
        runtime: RuntimeConfig {
            fuel: Some(3),
            ..RuntimeConfig::default()
        },
        ..Config::default()
    };
    let output = wavelet::run_with_config(INTERLEAVE, &config).unwrap().output;
    assert_eq!(output, vec!["a start", "b start", "b done", "a done"]);
}

#[test]
fn test_sleeps_overlap() {
    let source = "async fn nap(ms: i32) -> i32 { await sleep(ms); return ms; }
        async fn main() -> i32 {
            let a = nap(150);
            let b = nap(150);
            let c = nap(150);
            let x = await a;
            let y = await b;
            let z = await c;
            return x + y + z;
        }";
    let started = Instant::now();
    assert_eq!(i32_of(source), 450);
    assert!(started.elapsed().as_millis() < 400);
}

#[test]
fn test_await_chain() {
    let source = "async fn one() -> i64 { return 1; }
        async fn two() -> i64 { let a = await one(); return a + 1; }
        async fn three() -> i64 { let b = await two(); return b + 1; }
        async fn main() -> i64 { let c = await three(); return c * 100; }";
    assert_eq!(run(source).value, Some(Value::I64(300)));
}

#[test]
fn test_promise_awaited_twice() {
    let source = "async fn value() -> i32 { await sleep(1); return 21; }
        async fn main() -> i32 { let p = value(); let a = await p; let b = await p; return a + b; }";
    assert_eq!(i32_of(source), 42);
}

#[test]
fn test_awaiting_a_settled_promise() {
    let source = "async fn value() -> bool { return true; }
        async fn main() -> i32 {
            let p = value();
            await sleep(5);
            let v = await p;
            if v { return 1; }
            return 0;
        }";
    assert_eq!(i32_of(source), 1);
}

#[test]
fn test_sync_main_can_start_tasks() {
    let source = "async fn hello() { print(\"task\"); }
        fn main() { let p = hello(); print(\"main\"); }";
    // the run ends with main; the task never gets a turn
    assert_eq!(run(source).output, vec!["main".to_string()]);
}

#[test]
fn test_promise_state_machine() {
    let mut registry: PromiseRegistry<u32> = PromiseRegistry::new();
    let first = registry.create();
    let second = registry.create();
    assert_ne!(first, second);
    assert_eq!(registry.wait(first, 7).unwrap(), None);
    assert_eq!(registry.resolve(first, 42).unwrap(), vec![7]);
    assert_eq!(registry.state(first).unwrap(), PromiseState::Resolved(42));
    assert!(matches!(
        registry.resolve(first, 1),
        Err(PromiseError::AlreadySettled(h)) if h == first
    ));
    assert!(matches!(registry.reject(first, 1), Err(PromiseError::AlreadySettled(_))));
    registry.reject(second, -1).unwrap();
    assert_eq!(registry.wait(second, 8).unwrap(), Some(PromiseState::Rejected(-1)));
    assert!(matches!(
        registry.state(PromiseHandle(99)),
        Err(PromiseError::UnknownHandle(_))
    ));
    assert_eq!(registry.pending(), 0);
}
