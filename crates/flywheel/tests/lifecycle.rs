//! Entity lifecycle integration tests.
//!
//! Scenarios A-D drive [`Scheduler`] passes synchronously for exact
//! frame-by-frame control; the pacing and threaded-loop tests go
//! through [`Ticker`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use flywheel::{
    DrawTick, Entity, EntityHandle, GameTick, GroupSchedule, NoDrawHooks, Scheduler, SlotState,
    TickError, Ticker, TickerConfig,
};

struct Counting {
    game: Arc<AtomicU32>,
}

impl Entity for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn tick_game(&mut self, _tick: &mut GameTick<'_>) {
        self.game.fetch_add(1, Ordering::Relaxed);
    }
}

fn uncapped() -> Scheduler {
    let config = TickerConfig {
        fps: 0.0,
        ..TickerConfig::default()
    };
    Scheduler::new(config, GroupSchedule::default())
}

fn counting(sched: &Scheduler) -> (EntityHandle, Arc<AtomicU32>) {
    let game = Arc::new(AtomicU32::new(0));
    let handle = sched
        .register_default(Box::new(Counting {
            game: Arc::clone(&game),
        }))
        .unwrap();
    (handle, game)
}

// Unclaimed registration: admitted on the first pass, autorelease
// expires on the second, slot freed on the third. The entity ticks
// exactly once.
#[test]
fn unclaimed_entity_is_reclaimed_after_one_tick() {
    let sched = uncapped();
    let (handle, game) = counting(&sched);

    assert_eq!(sched.status(handle).unwrap().state, SlotState::Pending);

    sched.tick_game_pass();
    let status = sched.status(handle).unwrap();
    assert_eq!(status.state, SlotState::Active);
    assert!(status.autorelease);
    assert_eq!(game.load(Ordering::Relaxed), 1);

    sched.tick_game_pass();
    let status = sched.status(handle).unwrap();
    assert_eq!(status.state, SlotState::Destroying);
    assert!(!status.autorelease);
    assert_eq!(status.ref_count, 0);
    // Marked entities no longer tick.
    assert_eq!(game.load(Ordering::Relaxed), 1);

    sched.tick_game_pass();
    assert!(sched.status(handle).is_none());
    assert!(sched.finished());
    assert_eq!(game.load(Ordering::Relaxed), 1);
}

// A claimed entity lives for as long as its reference does, and a
// handle outlives its slot only as a stale, rejected name.
#[test]
fn claimed_entity_lives_until_released() {
    let sched = uncapped();
    let (handle, game) = counting(&sched);
    sched.ref_entity(handle).unwrap();

    for _ in 0..5 {
        sched.tick_game_pass();
    }
    assert_eq!(game.load(Ordering::Relaxed), 5);
    assert_eq!(sched.status(handle).unwrap().state, SlotState::Active);

    assert_eq!(sched.unref(handle).unwrap(), 0);
    sched.tick_game_pass(); // marked
    sched.tick_game_pass(); // reaped
    assert!(sched.status(handle).is_none());

    // The handle is now stale, not recycled into someone else's entity.
    assert!(matches!(
        sched.ref_entity(handle),
        Err(TickError::StaleHandle(_))
    ));
    let (other, _) = counting(&sched);
    assert_ne!(handle, other);
    sched.shutdown();
    let mut frames = 0u32;
    while !sched.finished() {
        sched.tick_game_pass();
        frames += 1;
        assert!(frames < 10, "shutdown failed to drain");
    }
}

// Tearing down a scheduler that still owns live entities must not
// panic; leaked entities are reported, not fatal.
#[test]
fn drop_with_live_entities_does_not_panic() {
    let sched = uncapped();
    let (handle, _) = counting(&sched);
    sched.ref_entity(handle).unwrap();
    sched.tick_game_pass();
    drop(sched);
}

struct SelfReleasing {
    release_at: u64,
}

impl Entity for SelfReleasing {
    fn name(&self) -> &str {
        "self-releasing"
    }

    fn tick_game(&mut self, tick: &mut GameTick<'_>) {
        if tick.frame >= self.release_at {
            // Re-enters the scheduler from inside our own callback.
            let _ = tick.scheduler().unref(tick.handle);
        }
    }
}

// An entity may release its own last reference from inside its tick
// callback; destruction is still deferred to the following passes.
#[test]
fn entity_can_release_itself_mid_tick() {
    let sched = uncapped();
    let handle = sched
        .register_default(Box::new(SelfReleasing { release_at: 3 }))
        .unwrap();
    sched.ref_entity(handle).unwrap();

    sched.tick_game_pass(); // frame 1
    sched.tick_game_pass(); // frame 2
    assert_eq!(sched.status(handle).unwrap().ref_count, 1);

    sched.tick_game_pass(); // frame 3: releases itself
    assert_eq!(sched.status(handle).unwrap().ref_count, 0);

    sched.tick_game_pass(); // marked
    sched.tick_game_pass(); // reaped
    assert!(sched.finished());
}

// Stuck shutdown: a reference that is never released must not hang
// termination. The escalation pokes the leaked reference loose and the
// loop drains in bounded time.
#[test]
fn leaked_reference_cannot_stall_shutdown() {
    let sched = uncapped();
    let (handle, _) = counting(&sched);
    sched.ref_entity(handle).unwrap();
    sched.ref_entity(handle).unwrap(); // second reference, never released

    sched.tick_game_pass();
    sched.shutdown();

    let mut frames = 0u32;
    while !sched.finished() {
        sched.tick_game_pass();
        frames += 1;
        assert!(frames < 200, "shutdown failed to drain");
    }
    assert!(sched.status(handle).is_none());
}

// Shutdown releases still-autoreleased entities immediately and stops
// game ticks from that point on.
#[test]
fn shutdown_releases_autoreleased_entities() {
    let sched = uncapped();
    let (handle, game) = counting(&sched);

    sched.tick_game_pass();
    assert_eq!(game.load(Ordering::Relaxed), 1);

    sched.shutdown();
    let status = sched.status(handle).unwrap();
    assert!(!status.autorelease);
    assert_eq!(status.ref_count, 0);

    sched.tick_game_pass();
    sched.tick_game_pass();
    assert!(sched.finished());
    // No ticks ran after the shutdown request.
    assert_eq!(game.load(Ordering::Relaxed), 1);
}

struct DrawProbe {
    draws: Arc<AtomicU32>,
}

impl Entity for DrawProbe {
    fn tick_draw(&mut self, _tick: &mut DrawTick<'_>) {
        self.draws.fetch_add(1, Ordering::Relaxed);
    }
}

// Entities registered without a draw group are skipped by the draw
// pass but still drain like everything else.
#[test]
fn game_only_entities_skip_the_draw_pass() {
    let sched = uncapped();
    let draws = Arc::new(AtomicU32::new(0));
    let schedule = sched.schedule().clone();

    let handle = sched
        .register(
            Box::new(DrawProbe {
                draws: Arc::clone(&draws),
            }),
            flywheel::GroupAssignment {
                game: schedule.game_group("default").unwrap(),
                draw: None,
            },
        )
        .unwrap();
    sched.ref_entity(handle).unwrap();

    sched.tick_game_pass();
    sched.tick_draw_pass(&mut NoDrawHooks);
    assert_eq!(draws.load(Ordering::Relaxed), 0);

    sched.unref(handle).unwrap();
    sched.tick_game_pass();
    sched.tick_game_pass();
    assert!(sched.finished());
}

// Pacing: at a capped framerate the threaded loop must average close
// to the target interval. The band is wide to absorb scheduler noise
// on loaded machines.
#[test]
fn capped_loop_paces_near_target_interval() {
    let config = TickerConfig {
        fps: 60.0,
        ..TickerConfig::default()
    };
    let mut ticker = Ticker::new(config, GroupSchedule::default());

    let (handle, _) = {
        let game = Arc::new(AtomicU32::new(0));
        let handle = ticker
            .register_default(Box::new(Counting {
                game: Arc::clone(&game),
            }))
            .unwrap();
        (handle, game)
    };
    ticker.ref_entity(handle).unwrap();

    // Warm up the handshake before measuring.
    for _ in 0..5 {
        ticker.tick_draw();
    }

    let frames = 30;
    let start = Instant::now();
    for _ in 0..frames {
        ticker.tick_draw();
    }
    let mean = start.elapsed().as_secs_f64() / f64::from(frames);

    // 60 fps nominal is ~16.7ms; accept anything clearly paced rather
    // than free-running or stalled.
    assert!(mean > 0.008, "loop ran uncapped: mean {mean:.4}s");
    assert!(mean < 0.033, "loop overshot pacing: mean {mean:.4}s");

    ticker.unref(handle).unwrap();
    ticker.shutdown();
    for _ in 0..20 {
        if ticker.finished() {
            break;
        }
        ticker.tick_draw();
    }
    assert!(ticker.finished());
}

// Refs must be rejected once the entity is marked for destruction;
// resurrection would race the reaper.
#[test]
fn ref_is_rejected_on_a_destroying_entity() {
    let sched = uncapped();
    let (handle, _) = counting(&sched);
    sched.ref_entity(handle).unwrap();

    sched.tick_game_pass(); // admitted
    assert_eq!(sched.unref(handle).unwrap(), 0);

    sched.tick_game_pass(); // marked
    assert_eq!(sched.status(handle).unwrap().state, SlotState::Destroying);
    assert!(matches!(
        sched.ref_entity(handle),
        Err(TickError::RefWhileDestroying { .. })
    ));

    sched.tick_game_pass(); // reaped
    assert!(matches!(
        sched.ref_entity(handle),
        Err(TickError::StaleHandle(_))
    ));
    assert!(sched.finished());
}

struct SecondsProbe {
    seconds: Arc<std::sync::Mutex<Vec<f32>>>,
}

impl Entity for SecondsProbe {
    fn name(&self) -> &str {
        "seconds-probe"
    }

    fn tick_game(&mut self, tick: &mut GameTick<'_>) {
        self.seconds.lock().unwrap().push(tick.seconds);
    }
}

// While recording at a fixed framerate, delta time is pinned to 1/fps
// no matter how much wall time a frame actually took, and the pacing
// bookkeeping in frame_wait leaves the fixed delta undisturbed.
#[test]
fn recording_pins_delta_to_frame_interval() {
    let config = TickerConfig {
        fps: 60.0,
        ..TickerConfig::default()
    };
    let sched = Scheduler::new(config, GroupSchedule::default());

    let seconds = Arc::new(std::sync::Mutex::new(Vec::new()));
    let handle = sched
        .register_default(Box::new(SecondsProbe {
            seconds: Arc::clone(&seconds),
        }))
        .unwrap();
    sched.ref_entity(handle).unwrap();

    sched.start_recording();
    assert!(sched.is_recording());

    for _ in 0..4 {
        sched.tick_game_pass();
        // Pacing bookkeeping runs between passes as in the real loop;
        // it must not disturb the recorded delta.
        let _ = sched.frame_wait();
        // Wall time varies per frame; the recorded delta must not.
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    let recorded = seconds.lock().unwrap().clone();
    assert_eq!(recorded.len(), 4);
    for delta in recorded {
        assert_eq!(delta, 1.0 / 60.0);
    }

    sched.stop_recording();
    assert!(!sched.is_recording());

    seconds.lock().unwrap().clear();
    sched.tick_game_pass();
    // Back on the wall clock: ~2ms of sleep plus pass overhead, never
    // the pinned interval again.
    let live = seconds.lock().unwrap()[0];
    assert_ne!(live, 1.0 / 60.0);
    assert!(live > 0.0);

    sched.unref(handle).unwrap();
    sched.shutdown();
    sched.tick_game_pass();
    sched.tick_game_pass();
    assert!(sched.finished());
}

// Recording nests: the mode only ends when every start has been
// matched, and surplus stops saturate instead of wrapping.
#[test]
fn recording_counter_nests_and_saturates() {
    let sched = uncapped();

    sched.start_recording();
    sched.start_recording();
    sched.stop_recording();
    assert!(sched.is_recording());
    sched.stop_recording();
    assert!(!sched.is_recording());

    // Surplus stops are ignored; a fresh start still works.
    sched.stop_recording();
    sched.stop_recording();
    assert!(!sched.is_recording());
    sched.start_recording();
    assert!(sched.is_recording());
    sched.stop_recording();
}

// Full threaded loop end to end: frames advance, entities tick, and
// the loop drains after shutdown.
#[test]
fn threaded_loop_runs_and_drains() {
    let config = TickerConfig {
        fps: 0.0,
        ..TickerConfig::default()
    };
    let mut ticker = Ticker::new(config, GroupSchedule::default());

    let game = Arc::new(AtomicU32::new(0));
    let handle = ticker
        .register_default(Box::new(Counting {
            game: Arc::clone(&game),
        }))
        .unwrap();
    ticker.ref_entity(handle).unwrap();

    for _ in 0..20 {
        ticker.tick_draw();
    }
    assert!(ticker.frame_num() >= 20);
    assert!(game.load(Ordering::Relaxed) >= 19);

    ticker.unref(handle).unwrap();
    ticker.shutdown();
    for _ in 0..20 {
        if ticker.finished() {
            break;
        }
        ticker.tick_draw();
    }
    assert!(ticker.finished());
}
