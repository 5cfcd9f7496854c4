//! Tests for the job queue: ordering, backpressure, fence reuse, and shutdown drain.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel as channel;

use xian_job_queue::{Fence, JobQueue, JobQueueConfig, JobQueueError, SubmitError, flags};

/// Execute callback whose jobs block until the test releases them.
///
/// Each job first reports that it started, then waits for one gate token (or for the gate sender
/// to be dropped), then records its payload.
struct Gated {
    results: Arc<Mutex<Vec<u32>>>,
    gate: channel::Sender<()>,
    started: channel::Receiver<u32>,
}

fn gated_queue(config: JobQueueConfig) -> (JobQueue<u32>, Gated) {
    let results = Arc::new(Mutex::new(Vec::new()));
    let (gate_tx, gate_rx) = channel::unbounded::<()>();
    let (started_tx, started_rx) = channel::unbounded::<u32>();

    let results_in_worker = results.clone();
    let queue = JobQueue::with_config(config, move |payload: u32| {
        let _ = started_tx.send(payload);
        let _ = gate_rx.recv();
        results_in_worker.lock().unwrap().push(payload);
    })
    .unwrap();

    (
        queue,
        Gated {
            results,
            gate: gate_tx,
            started: started_rx,
        },
    )
}

fn fences(n: usize) -> Vec<Arc<Fence>> {
    (0..n).map(|_| Arc::new(Fence::new())).collect()
}

#[test]
fn test_jobs_execute_in_submission_order() {
    let results = Arc::new(Mutex::new(Vec::new()));
    let results_in_worker = results.clone();
    let queue = JobQueue::new(4, move |seq: u32| {
        results_in_worker.lock().unwrap().push(seq);
    })
    .unwrap();

    let pool = fences(8);
    for seq in 0..200u32 {
        queue.submit(seq, &pool[seq as usize % pool.len()]).unwrap();
    }
    for fence in &pool {
        fence.wait();
    }

    assert_eq!(*results.lock().unwrap(), (0..200).collect::<Vec<_>>());
    assert_eq!(queue.stats().executed, 200);
    assert_eq!(queue.stats().submitted, 200);
}

#[test]
fn test_third_submission_blocks_until_first_completes() {
    let (queue, gated) = gated_queue(JobQueueConfig::new(2));
    let queue = Arc::new(queue);
    let [f1, f2, f3]: [Arc<Fence>; 3] = fences(3).try_into().unwrap();

    queue.submit(1, &f1).unwrap();
    queue.submit(2, &f2).unwrap();
    assert_eq!(gated.started.recv().unwrap(), 1);
    assert_eq!(queue.outstanding(), 2);

    let third_done = Arc::new(AtomicBool::new(false));
    let producer = {
        let queue = queue.clone();
        let f3 = f3.clone();
        let third_done = third_done.clone();
        thread::spawn(move || {
            queue.submit(3, &f3).unwrap();
            third_done.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!third_done.load(Ordering::SeqCst));
    assert!(!f1.is_idle());

    gated.gate.send(()).unwrap();
    f1.wait();
    producer.join().unwrap();
    assert!(third_done.load(Ordering::SeqCst));

    gated.gate.send(()).unwrap();
    gated.gate.send(()).unwrap();
    f2.wait();
    f3.wait();

    assert_eq!(*gated.results.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_outstanding_never_exceeds_capacity() {
    const CAPACITY: usize = 3;
    const PRODUCERS: u32 = 4;
    const JOBS_PER_PRODUCER: u32 = 100;

    let results = Arc::new(Mutex::new(Vec::new()));
    let results_in_worker = results.clone();
    let handle: Arc<OnceLock<Weak<JobQueue<(u32, u32)>>>> = Arc::new(OnceLock::new());
    let handle_in_worker = handle.clone();
    let max_in_worker = Arc::new(AtomicUsize::new(0));
    let max_seen_by_worker = max_in_worker.clone();
    let queue = Arc::new(
        JobQueue::new(CAPACITY, move |(producer, seq): (u32, u32)| {
            if let Some(queue) = handle_in_worker.get().and_then(Weak::upgrade) {
                max_in_worker.fetch_max(queue.outstanding(), Ordering::SeqCst);
            }
            thread::yield_now();
            results_in_worker.lock().unwrap().push((producer, seq));
        })
        .unwrap(),
    );
    handle.set(Arc::downgrade(&queue)).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let monitor = {
        let queue = queue.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut max_seen = 0;
            while running.load(Ordering::SeqCst) {
                max_seen = max_seen.max(queue.outstanding());
                thread::yield_now();
            }
            max_seen
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = queue.clone();
            thread::spawn(move || {
                let pool = fences(2);
                for seq in 0..JOBS_PER_PRODUCER {
                    queue.submit((producer, seq), &pool[seq as usize % 2]).unwrap();
                }
                for fence in &pool {
                    fence.wait();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    running.store(false, Ordering::SeqCst);
    assert!(monitor.join().unwrap() <= CAPACITY);
    let max_in_worker = max_seen_by_worker.load(Ordering::SeqCst);
    assert!(max_in_worker >= 1);
    assert!(max_in_worker <= CAPACITY);
    assert_eq!(queue.stats().panicked, 0);

    let results = results.lock().unwrap();
    assert_eq!(results.len(), (PRODUCERS * JOBS_PER_PRODUCER) as usize);
    for producer in 0..PRODUCERS {
        let seqs: Vec<u32> = results
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(seqs, (0..JOBS_PER_PRODUCER).collect::<Vec<_>>());
    }
}

#[test]
fn test_signaled_fence_is_reusable() {
    let queue = JobQueue::new(1, |_: u32| {}).unwrap();
    let fence = Arc::new(Fence::new());

    for payload in 0..10 {
        queue.submit(payload, &fence).unwrap();
        fence.wait();
        assert!(fence.is_idle());
        fence.wait();
    }
}

#[test]
fn test_destroy_with_no_jobs_is_prompt() {
    let queue = JobQueue::new(4, |_: u32| {}).unwrap();
    let started = Instant::now();
    drop(queue);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_destroy_right_after_submit_releases_fence() {
    let queue = JobQueue::new(4, |_: u32| thread::sleep(Duration::from_millis(5))).unwrap();
    let fence = Arc::new(Fence::new());

    queue.submit(1, &fence).unwrap();
    drop(queue);

    assert!(fence.is_idle());
    fence.wait();
}

#[test]
fn test_destroy_signals_pending_fences_without_executing() {
    let (queue, gated) = gated_queue(JobQueueConfig::new(4));
    let queue = Arc::new(queue);
    let pool = fences(3);

    queue.submit(0, &pool[0]).unwrap();
    assert_eq!(gated.started.recv().unwrap(), 0);
    queue.submit(1, &pool[1]).unwrap();
    queue.submit(2, &pool[2]).unwrap();

    let destroyer = {
        let queue = queue.clone();
        thread::spawn(move || queue.shutdown())
    };
    while !queue.is_shutdown() {
        thread::yield_now();
    }
    drop(gated.gate);
    destroyer.join().unwrap();

    for fence in &pool {
        assert!(fence.is_idle());
    }
    assert_eq!(*gated.results.lock().unwrap(), vec![0]);

    let stats = queue.stats();
    assert_eq!(stats.executed, 1);
    assert_eq!(stats.discarded, 2);
    assert_eq!(queue.outstanding(), 0);
}

#[test]
fn test_execute_on_drain_runs_pending_jobs() {
    let config = JobQueueConfig::new(4).flags(flags::XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN);
    let (queue, gated) = gated_queue(config);
    let queue = Arc::new(queue);
    let pool = fences(3);

    queue.submit(0, &pool[0]).unwrap();
    assert_eq!(gated.started.recv().unwrap(), 0);
    queue.submit(1, &pool[1]).unwrap();
    queue.submit(2, &pool[2]).unwrap();

    let destroyer = {
        let queue = queue.clone();
        thread::spawn(move || queue.shutdown())
    };
    while !queue.is_shutdown() {
        thread::yield_now();
    }
    drop(gated.gate);
    destroyer.join().unwrap();

    for fence in &pool {
        assert!(fence.is_idle());
    }
    assert_eq!(*gated.results.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(queue.stats().discarded, 0);
}

#[test]
fn test_blocked_producer_is_rejected_at_shutdown() {
    let (queue, gated) = gated_queue(JobQueueConfig::new(1));
    let queue = Arc::new(queue);
    let [f0, f1]: [Arc<Fence>; 2] = fences(2).try_into().unwrap();

    queue.submit(0, &f0).unwrap();
    assert_eq!(gated.started.recv().unwrap(), 0);

    let producer = {
        let queue = queue.clone();
        let f1 = f1.clone();
        thread::spawn(move || queue.submit(1, &f1))
    };
    thread::sleep(Duration::from_millis(20));

    let destroyer = {
        let queue = queue.clone();
        thread::spawn(move || queue.shutdown())
    };
    while !queue.is_shutdown() {
        thread::yield_now();
    }
    drop(gated.gate);

    assert_eq!(producer.join().unwrap(), Err(SubmitError::ShuttingDown(1)));
    destroyer.join().unwrap();

    assert!(f0.is_idle());
    assert!(f1.is_idle());
    assert_eq!(*gated.results.lock().unwrap(), vec![0]);
}

#[test]
fn test_try_submit_reports_full_and_busy_fence() {
    let (queue, gated) = gated_queue(JobQueueConfig::new(2));
    let pool = fences(3);

    queue.try_submit(0, &pool[0]).unwrap();
    assert_eq!(gated.started.recv().unwrap(), 0);

    assert_eq!(
        queue.try_submit(1, &pool[0]),
        Err(SubmitError::FenceBusy(1))
    );
    queue.try_submit(1, &pool[1]).unwrap();
    assert_eq!(queue.try_submit(2, &pool[2]), Err(SubmitError::Full(2)));
    assert!(pool[2].is_idle());

    drop(gated.gate);
    pool[0].wait();
    pool[1].wait();
    assert_eq!(*gated.results.lock().unwrap(), vec![0, 1]);
}

#[test]
fn test_submit_timeout_gives_payload_back() {
    let (queue, gated) = gated_queue(JobQueueConfig::new(1));
    let [f0, f1]: [Arc<Fence>; 2] = fences(2).try_into().unwrap();

    queue.submit(0, &f0).unwrap();
    assert_eq!(gated.started.recv().unwrap(), 0);

    let err = queue
        .submit_timeout(1, &f1, Duration::from_millis(30))
        .unwrap_err();
    assert_eq!(err, SubmitError::Timeout(1));
    assert!(f1.is_idle());

    let err = queue
        .submit_timeout(2, &f0, Duration::from_millis(30))
        .unwrap_err();
    assert_eq!(err.into_inner(), 2);

    gated.gate.send(()).unwrap();
    f0.wait();
    queue
        .submit_timeout(3, &f1, Duration::from_secs(5))
        .unwrap();
    gated.gate.send(()).unwrap();
    f1.wait();

    assert_eq!(*gated.results.lock().unwrap(), vec![0, 3]);
}

#[test]
fn test_panicking_job_still_signals_fence() {
    let results = Arc::new(Mutex::new(Vec::new()));
    let results_in_worker = results.clone();
    let queue = JobQueue::new(2, move |payload: u32| {
        if payload == 1 {
            panic!("job {payload} failed");
        }
        results_in_worker.lock().unwrap().push(payload);
    })
    .unwrap();

    let pool = fences(2);
    queue.submit(1, &pool[0]).unwrap();
    queue.submit(2, &pool[1]).unwrap();
    pool[0].wait();
    pool[1].wait();

    assert_eq!(*results.lock().unwrap(), vec![2]);
    let stats = queue.stats();
    assert_eq!(stats.panicked, 1);
    assert_eq!(stats.executed, 1);
}

#[test]
fn test_worker_uses_configured_thread_name() {
    let name = Arc::new(Mutex::new(None));
    let name_in_worker = name.clone();
    let queue = JobQueue::with_config(
        JobQueueConfig::new(1).thread_name("decode-worker"),
        move |_: ()| {
            *name_in_worker.lock().unwrap() = thread::current().name().map(str::to_string);
        },
    )
    .unwrap();

    let fence = Arc::new(Fence::new());
    queue.submit((), &fence).unwrap();
    fence.wait();

    assert_eq!(name.lock().unwrap().as_deref(), Some("decode-worker"));
}

#[test]
fn test_invalid_construction_is_reported() {
    assert!(matches!(
        JobQueue::<u32>::new(0, |_| {}),
        Err(JobQueueError::ZeroCapacity)
    ));
    assert!(matches!(
        JobQueue::<u32>::with_config(JobQueueConfig::new(2).flags(1 << 5), |_| {}),
        Err(JobQueueError::InvalidFlags(_))
    ));
}

#[test]
fn test_oversized_capacity_is_reported_not_aborted() {
    assert!(matches!(
        JobQueue::<u32>::new(usize::MAX / 2, |_| {}),
        Err(JobQueueError::Alloc(_))
    ));
    assert!(matches!(
        JobQueue::<[u8; 4096]>::new(usize::MAX / 4096, |_| {}),
        Err(JobQueueError::Alloc(_))
    ));
}
