use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use vista_scene::{AnimationEvent, AnimationScheduler, Stage, TaskStatus, ValueMode};

type Recorded = Arc<Mutex<Vec<f64>>>;

fn spy() -> (Recorded, impl FnMut(f64) + Send + 'static) {
    let values: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = values.clone();
    (values, move |v| sink.lock().unwrap().push(v))
}

fn completions() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let done = Arc::new(AtomicUsize::new(0));
    let d = done.clone();
    (done, move || {
        d.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn values_are_monotonic_and_bounded() -> Result<()> {
    let scheduler = AnimationScheduler::new();
    let (values, on_update) = spy();
    scheduler.start(0.0, 90.0, 2000.0, ValueMode::Discrete, on_update, || {});

    // Irregular frame spacing, including a dropped frame.
    for now in [3.0, 19.0, 35.0, 120.0, 121.0, 900.0, 1999.0, 2003.0, 2050.0] {
        scheduler.tick(now);
    }

    let values = values.lock().unwrap().clone();
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
    assert!(values.iter().all(|v| (0.0..=90.0).contains(v)));
    assert!(values.iter().all(|v| v.fract() == 0.0));
    assert_eq!(values.last().copied(), Some(90.0));
    Ok(())
}

#[test]
fn completes_exactly_once_at_end_value() -> Result<()> {
    let scheduler = AnimationScheduler::new();
    let (values, on_update) = spy();
    let (done, on_complete) = completions();
    let handle = scheduler.start(0.0, 7.0, 300.0, ValueMode::Continuous, on_update, on_complete);

    for frame in 0..40 {
        scheduler.tick(f64::from(frame) * 16.0);
    }

    let values = values.lock().unwrap().clone();
    let ends = values.iter().filter(|v| **v == 7.0).count();
    assert_eq!(ends, 1);
    assert_eq!(values.last().copied(), Some(7.0));
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert!(!handle.is_active());
    assert!(scheduler.status(handle.id()).is_none());

    let events = scheduler.drain_events();
    assert_eq!(events.iter().filter(|e| e.is_completed()).count(), 1);
    assert!(matches!(
        events.last(),
        Some(AnimationEvent::Completed { value, .. }) if *value == 7.0
    ));
    Ok(())
}

#[test]
fn zero_duration_emits_end_once() -> Result<()> {
    let stage = Stage::new();
    let (values, on_tick) = spy();
    let (done, on_done) = completions();
    stage.animate_value(0.0, 100.0, 0.0, ValueMode::Discrete, on_tick, on_done);

    let layout = vista_scene::ScrollLayout::new(800.0, 600.0);
    stage.frame(500.0, &layout);
    stage.frame(516.0, &layout);

    assert_eq!(*values.lock().unwrap(), vec![100.0]);
    assert_eq!(done.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn cancelled_task_never_calls_back() -> Result<()> {
    let scheduler = AnimationScheduler::new();
    let (values, on_update) = spy();
    let (done, on_complete) = completions();
    let handle = scheduler.start(0.0, 100.0, 1000.0, ValueMode::Discrete, on_update, on_complete);

    scheduler.tick(0.0);
    scheduler.tick(400.0);
    let seen = values.lock().unwrap().len();

    handle.cancel();
    for now in [500.0, 1000.0, 5000.0] {
        scheduler.tick(now);
    }
    handle.cancel();

    assert_eq!(values.lock().unwrap().len(), seen);
    assert_eq!(done.load(Ordering::SeqCst), 0);
    assert!(!scheduler.has_active_tasks());
    Ok(())
}

#[test]
fn origin_is_the_first_tick() -> Result<()> {
    let scheduler = AnimationScheduler::new();
    let (values, on_update) = spy();
    let handle = scheduler.start(0.0, 100.0, 1000.0, ValueMode::Discrete, on_update, || {});

    // A task scheduled long before its first frame still starts from zero.
    scheduler.tick(1_000_000.0);
    assert_eq!(scheduler.status(handle.id()), Some(TaskStatus::Running));
    scheduler.tick(1_000_250.0);

    assert_eq!(*values.lock().unwrap(), vec![0.0, 25.0]);
    Ok(())
}
