use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Cheap deterministic jitter so sleeps differ per job without a rand dependency.
fn jitter_ms(i: u64) -> u64 {
    (i.wrapping_mul(2654435761) >> 7) % 25
}

#[test]
fn drain_waits_for_all_jobs() {
    let queue = TaskQueue::new(2);
    let done = Arc::new(AtomicUsize::new(0));
    for i in 0..12u64 {
        let done = Arc::clone(&done);
        queue
            .enqueue(Job::new(format!("sleep-{}", i), move || {
                std::thread::sleep(Duration::from_millis(jitter_ms(i)));
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
    }

    queue.drain();

    assert_eq!(done.load(Ordering::SeqCst), 12);
    assert_eq!(queue.pending(), 0);
    let report = queue.shutdown();
    assert_eq!(report.completed, 12);
    assert!(report.failures.is_empty());
}

#[test]
fn drain_on_empty_queue_returns() {
    let queue = TaskQueue::new(3);
    queue.drain();
    assert_eq!(queue.shutdown(), QueueReport::default());
}

#[test]
fn failing_job_does_not_stop_the_next() {
    let queue = TaskQueue::new(1);
    let ran = Arc::new(AtomicUsize::new(0));
    queue
        .enqueue(Job::new("bad", || anyhow::bail!("remote closed")))
        .unwrap();
    let r = Arc::clone(&ran);
    queue
        .enqueue(Job::new("good", move || {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();

    queue.drain();
    let report = queue.shutdown();

    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].label, "bad");
    assert!(report.failures[0].message.contains("remote closed"));
}

#[test]
fn panicking_job_is_isolated() {
    let queue = TaskQueue::new(1);
    queue
        .enqueue(Job::new("boom", || panic!("worker blew up")))
        .unwrap();
    queue.enqueue(Job::new("after", || Ok(()))).unwrap();

    queue.drain();
    let report = queue.shutdown();

    assert_eq!(report.completed, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("worker blew up"));
}

#[test]
fn concurrency_is_bounded_by_worker_count() {
    let queue = TaskQueue::new(2);
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    for i in 0..8 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        queue
            .enqueue(Job::new(format!("job-{}", i), move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
    }
    let report = queue.shutdown();
    assert_eq!(report.total(), 8);
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn single_worker_runs_in_fifo_order() {
    let queue = TaskQueue::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        let order = Arc::clone(&order);
        queue
            .enqueue(Job::new(format!("job-{}", i), move || {
                order.lock().unwrap().push(i);
                Ok(())
            }))
            .unwrap();
    }
    queue.drain();
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn enqueue_from_many_threads_then_drain() {
    let queue = TaskQueue::new(2);
    let done = Arc::new(AtomicUsize::new(0));
    std::thread::scope(|s| {
        for t in 0..4 {
            let queue = &queue;
            let done = Arc::clone(&done);
            s.spawn(move || {
                for i in 0..5 {
                    let done = Arc::clone(&done);
                    queue
                        .enqueue(Job::new(format!("t{}-{}", t, i), move || {
                            done.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }))
                        .unwrap();
                }
            });
        }
    });
    queue.drain();
    assert_eq!(done.load(Ordering::SeqCst), 20);
}

#[test]
fn shutdown_finishes_queued_jobs() {
    let queue = TaskQueue::new(1);
    let done = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let done = Arc::clone(&done);
        queue
            .enqueue(Job::new("slow", move || {
                std::thread::sleep(Duration::from_millis(5));
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
    }
    let report = queue.shutdown();
    assert_eq!(report.completed, 3);
    assert_eq!(done.load(Ordering::SeqCst), 3);
}
