//! Timer Integration Tests
//!
//! Covers one-shot and periodic delivery, cancellation, zero-delay and
//! zero-period edge cases, and sleep.

// Layer 1: Standard library imports
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use filament_rt::{self as rt, RtError, RuntimeConfig, Timeout};

fn config() -> RuntimeConfig {
    RuntimeConfig::builder()
        .with_max_actors(4)
        .with_stack_arena_size(256 * 1024)
        .build()
        .unwrap()
}

// ============================================================================
// TEST GROUP 1: One-Shot Timers
// ============================================================================

#[test]
fn test_one_shot_fires_once() {
    rt::init(config()).unwrap();
    let fired = Rc::new(RefCell::new(0u32));

    let counter = Rc::clone(&fired);
    rt::spawn(move || {
        let timer = rt::after(Duration::from_millis(20)).unwrap();
        let msg = rt::recv(Timeout::after_millis(500)).unwrap();
        assert!(rt::is_timer(&msg));
        assert_eq!(rt::tick_timer(&msg), Some(timer));
        *counter.borrow_mut() += 1;
        // No second tick.
        assert_eq!(
            rt::recv(Timeout::after_millis(100)).unwrap_err(),
            RtError::Timeout
        );
        rt::exit();
    })
    .unwrap();

    rt::run().unwrap();
    rt::cleanup().unwrap();
    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn test_zero_delay_fires_next_iteration() {
    rt::init(config()).unwrap();
    rt::spawn(|| {
        let timer = rt::after(Duration::ZERO).unwrap();
        let msg = rt::recv(Timeout::after_millis(200)).unwrap();
        assert_eq!(rt::tick_timer(&msg), Some(timer));
        rt::exit();
    })
    .unwrap();
    rt::run().unwrap();
    rt::cleanup().unwrap();
}

#[test]
fn test_one_shot_fires_at_or_after_deadline() {
    rt::init(config()).unwrap();
    let observed = Rc::new(RefCell::new(None));

    let slot = Rc::clone(&observed);
    rt::spawn(move || {
        let started = Instant::now();
        rt::after(Duration::from_millis(40)).unwrap();
        let _ = rt::recv(Timeout::after_millis(500)).unwrap();
        *slot.borrow_mut() = Some(started.elapsed());
        rt::exit();
    })
    .unwrap();

    rt::run().unwrap();
    rt::cleanup().unwrap();
    assert!(observed.borrow().unwrap() >= Duration::from_millis(40));
}

// ============================================================================
// TEST GROUP 2: Periodic Timers
// ============================================================================

#[test]
fn test_periodic_cancel_stops_ticks() {
    rt::init(config()).unwrap();
    let ticks = Rc::new(RefCell::new(0u32));

    let counter = Rc::clone(&ticks);
    rt::spawn(move || {
        let timer = rt::every(Duration::from_millis(20)).unwrap();
        for _ in 0..5 {
            let msg = rt::recv(Timeout::after_millis(1000)).unwrap();
            assert!(rt::is_timer(&msg));
            *counter.borrow_mut() += 1;
        }
        rt::cancel(timer).unwrap();
        // No further ticks for three periods.
        assert_eq!(
            rt::recv(Timeout::after_millis(60)).unwrap_err(),
            RtError::Timeout
        );
        rt::exit();
    })
    .unwrap();

    rt::run().unwrap();
    rt::cleanup().unwrap();
    assert_eq!(*ticks.borrow(), 5);
}

#[test]
fn test_periodic_ticks_never_early() {
    rt::init(config()).unwrap();
    let arrivals: Rc<RefCell<Vec<Duration>>> = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&arrivals);
    rt::spawn(move || {
        let started = Instant::now();
        let timer = rt::every(Duration::from_millis(30)).unwrap();
        for _ in 0..3 {
            let _ = rt::recv(Timeout::after_millis(1000)).unwrap();
            log.borrow_mut().push(started.elapsed());
        }
        rt::cancel(timer).unwrap();
        rt::exit();
    })
    .unwrap();

    rt::run().unwrap();
    rt::cleanup().unwrap();

    // Tick k is scheduled at (k+1) * period from the start and must never
    // arrive early.
    let arrivals = arrivals.borrow();
    for (k, arrival) in arrivals.iter().enumerate() {
        let scheduled = Duration::from_millis(30) * (k as u32 + 1);
        assert!(
            *arrival >= scheduled,
            "tick {k} arrived at {arrival:?}, scheduled {scheduled:?}"
        );
    }
}

#[test]
fn test_zero_period_rejected() {
    rt::init(config()).unwrap();
    rt::spawn(|| {
        assert!(matches!(
            rt::every(Duration::ZERO),
            Err(RtError::Invalid(_))
        ));
        rt::exit();
    })
    .unwrap();
    rt::run().unwrap();
    rt::cleanup().unwrap();
}

// ============================================================================
// TEST GROUP 3: Cancellation and Sleep
// ============================================================================

#[test]
fn test_cancel_pending_one_shot() {
    rt::init(config()).unwrap();
    rt::spawn(|| {
        let timer = rt::after(Duration::from_millis(30)).unwrap();
        rt::cancel(timer).unwrap();
        // Cancelled: the wait must time out instead of ticking.
        assert_eq!(
            rt::recv(Timeout::after_millis(80)).unwrap_err(),
            RtError::Timeout
        );
        // And the handle is now stale.
        assert!(matches!(rt::cancel(timer), Err(RtError::Invalid(_))));
        rt::exit();
    })
    .unwrap();
    rt::run().unwrap();
    rt::cleanup().unwrap();
}

#[test]
fn test_sleep_blocks_for_duration() {
    rt::init(config()).unwrap();
    let observed = Rc::new(RefCell::new(None));

    let slot = Rc::clone(&observed);
    rt::spawn(move || {
        let started = Instant::now();
        rt::sleep(Duration::from_millis(30)).unwrap();
        *slot.borrow_mut() = Some(started.elapsed());
        rt::exit();
    })
    .unwrap();

    rt::run().unwrap();
    rt::cleanup().unwrap();
    assert!(observed.borrow().unwrap() >= Duration::from_millis(30));
}

#[test]
fn test_dying_actor_timers_are_reclaimed() {
    rt::init(config()).unwrap();
    let observed = Rc::new(RefCell::new(None));

    rt::spawn(|| {
        let _ = rt::every(Duration::from_millis(10)).unwrap();
        let _ = rt::after(Duration::from_millis(10)).unwrap();
        rt::exit(); // both timers die with the owner
    })
    .unwrap();

    let slot = Rc::clone(&observed);
    rt::spawn(move || {
        rt::yield_now().unwrap(); // let the first actor die
        let snapshot = rt::pool_snapshot().unwrap();
        *slot.borrow_mut() = Some(snapshot.timers.in_use);
        rt::exit();
    })
    .unwrap();

    rt::run().unwrap();
    rt::cleanup().unwrap();
    assert_eq!(observed.borrow().unwrap(), 0);
}
