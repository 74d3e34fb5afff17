use std::sync::atomic::AtomicUsize;
use std::sync::mpsc;
use std::time::Duration;

use super::*;

#[test]
fn zero_capacity_is_rejected() {
    assert!(BoundedExecutor::new(0).is_err());
}

#[test]
fn never_runs_more_than_capacity_jobs_at_once() {
    let exec = BoundedExecutor::new(3).unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    for i in 0..12 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        let tx = tx.clone();
        exec.submit(
            CancelFlag::new(),
            move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                running.fetch_sub(1, Ordering::SeqCst);
                i
            },
            move |out| {
                tx.send(out).unwrap();
            },
        );
    }

    let mut done = 0;
    for _ in 0..12 {
        if let JobOutcome::Done(_) = rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            done += 1;
        }
    }
    assert_eq!(done, 12);
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[test]
fn cancelled_queued_job_never_runs() {
    let exec = BoundedExecutor::new(1).unwrap();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (tx, rx) = mpsc::channel();

    // Occupy the only worker until the gate opens.
    let tx_block = tx.clone();
    exec.submit(
        CancelFlag::new(),
        move || {
            gate_rx.recv().ok();
            "blocker"
        },
        move |out| {
            tx_block.send(out).unwrap();
        },
    );

    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_job = Arc::clone(&ran);
    let cancel = CancelFlag::new();
    exec.submit(
        cancel.clone(),
        move || {
            ran_in_job.store(true, Ordering::SeqCst);
            "queued"
        },
        move |out| {
            tx.send(out).unwrap();
        },
    );
    cancel.cancel();
    gate_tx.send(()).unwrap();

    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(first, JobOutcome::Done("blocker")));
    assert!(matches!(second, JobOutcome::Cancelled));
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn cancel_during_run_suppresses_result() {
    let exec = BoundedExecutor::new(1).unwrap();
    let cancel = CancelFlag::new();
    let cancel_in_job = cancel.clone();
    let (tx, rx) = mpsc::channel();
    exec.submit(
        cancel,
        move || {
            cancel_in_job.cancel();
            42
        },
        move |out| {
            tx.send(out).unwrap();
        },
    );
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        JobOutcome::Cancelled
    ));
}

#[test]
fn panicking_job_is_reported_and_the_pool_survives() {
    let exec = BoundedExecutor::new(1).unwrap();
    let (tx, rx) = mpsc::channel();
    let tx_next = tx.clone();
    exec.submit(
        CancelFlag::new(),
        || -> u32 { panic!("node exploded") },
        move |out| {
            tx.send(out).unwrap();
        },
    );
    exec.submit(
        CancelFlag::new(),
        || 7u32,
        move |out| {
            tx_next.send(out).unwrap();
        },
    );

    match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
        JobOutcome::Panicked(msg) => assert_eq!(msg, "node exploded"),
        other => panic!("expected a panic outcome, got {other:?}"),
    }
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        JobOutcome::Done(7)
    ));
}
