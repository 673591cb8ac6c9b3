//! # The Ticker
//!
//! Threaded frontend over [`Scheduler`]. Owns the game thread and the
//! disk thread, and runs the draw pass on whichever thread calls
//! [`Ticker::tick_draw`] (normally the thread that owns the rendering
//! context).
//!
//! Game and draw alternate in strict ping-pong over two handshake
//! queues:
//!
//! ```text
//!   caller thread                        game thread
//!        |                                    |
//!        |            gametick: Proceed       |
//!        |  ..........................------> |  game pass N
//!        |            drawtick: Proceed       |
//!   draw | <------..........................  |
//! pass N |            gametick: Proceed       |
//!        |  ..........................------> |  game pass N+1
//! ```
//!
//! The caller releases the game thread *before* its pacing sleep, so
//! game pass N+1 simulates while the caller is still blitting and
//! waiting out frame N. One `Proceed` is pre-seeded at construction to
//! bootstrap the cycle.

use std::thread::{self, JoinHandle};

use flywheel_core::{EntityHandle, GroupAssignment, GroupSchedule, TickResult};
use std::sync::Arc;

use crate::arena::EntityStatus;
use crate::config::TickerConfig;
use crate::entity::Entity;
use crate::hooks::{DrawHooks, NoDrawHooks};
use crate::profiler::Stat;
use crate::queue::{Queue, Signal};
use crate::scheduler::Scheduler;

/// Threaded game/draw loop driver.
///
/// Construct one, register entities, call [`Ticker::tick_draw`] once
/// per displayed frame, then [`Ticker::shutdown`] and keep ticking
/// until [`Ticker::finished`]. Dropping the ticker terminates and
/// joins its threads.
pub struct Ticker {
    sched: Arc<Scheduler>,
    hooks: Box<dyn DrawHooks>,
    gametick: Queue<Signal>,
    drawtick: Queue<Signal>,
    disktick: Queue<Signal>,
    game_thread: Option<JoinHandle<()>>,
    disk_thread: Option<JoinHandle<()>>,
    draw_terminated: bool,
}

impl Ticker {
    /// Spawns the game and disk threads and arms the handshake.
    #[must_use]
    pub fn new(config: TickerConfig, schedule: GroupSchedule) -> Self {
        Self::with_hooks(config, schedule, Box::new(NoDrawHooks))
    }

    /// Like [`Ticker::new`], with scene hooks invoked around each draw
    /// group.
    #[must_use]
    pub fn with_hooks(
        config: TickerConfig,
        schedule: GroupSchedule,
        hooks: Box<dyn DrawHooks>,
    ) -> Self {
        let sched = Arc::new(Scheduler::new(config, schedule));
        let gametick = Queue::new();
        let drawtick = Queue::new();
        let disktick = Queue::new();

        let game_thread = {
            let sched = Arc::clone(&sched);
            let gametick = gametick.clone();
            let drawtick = drawtick.clone();
            thread::Builder::new()
                .name("ticker-game".into())
                .spawn(move || game_thread_main(&sched, &gametick, &drawtick))
                .expect("failed to spawn game thread")
        };

        let disk_thread = {
            let disktick = disktick.clone();
            thread::Builder::new()
                .name("ticker-disk".into())
                .spawn(move || disk_thread_main(&disktick))
                .expect("failed to spawn disk thread")
        };

        // Bootstrap: let the game thread simulate frame 1 while the
        // caller is still setting up.
        gametick.push(Signal::Proceed);

        Self {
            sched,
            hooks,
            gametick,
            drawtick,
            disktick,
            game_thread: Some(game_thread),
            disk_thread: Some(disk_thread),
            draw_terminated: false,
        }
    }

    /// The scheduler driven by this ticker.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.sched
    }

    /// Runs one draw pass, releases the game thread for the next game
    /// pass, then sleeps out the remainder of the frame.
    ///
    /// Blocks until the matching game pass has finished. Once the game
    /// thread has terminated this becomes a no-op.
    pub fn tick_draw(&mut self) {
        if self.draw_terminated {
            return;
        }
        match self.drawtick.pop() {
            Signal::Terminate => {
                self.draw_terminated = true;
                tracing::info!("draw passes terminated");
                return;
            }
            Signal::Proceed => {}
        }

        self.sched.tick_draw_pass(&mut *self.hooks);

        // Hand the next frame to the game thread before pacing; the
        // blit is the only remaining frame-N work.
        self.sched.profiler().start(Stat::Blit);
        self.gametick.push(Signal::Proceed);
        self.sched.profiler().stop(Stat::Blit);

        if let Some(wait) = self.sched.frame_wait() {
            thread::sleep(wait);
        }
    }

    // Thin forwarders; see [`Scheduler`] for semantics.

    /// Registers an entity. See [`Scheduler::register`].
    ///
    /// # Errors
    ///
    /// Group ids outside this ticker's schedule.
    pub fn register(
        &self,
        entity: Box<dyn Entity>,
        groups: GroupAssignment,
    ) -> TickResult<EntityHandle> {
        self.sched.register(entity, groups)
    }

    /// Registers an entity into the default groups.
    ///
    /// # Errors
    ///
    /// Same as [`Ticker::register`].
    pub fn register_default(&self, entity: Box<dyn Entity>) -> TickResult<EntityHandle> {
        self.sched.register_default(entity)
    }

    /// Takes ownership of an entity. See [`Scheduler::ref_entity`].
    ///
    /// # Errors
    ///
    /// Invalid handle or entity already being destroyed.
    pub fn ref_entity(&self, handle: EntityHandle) -> TickResult<()> {
        self.sched.ref_entity(handle)
    }

    /// Releases one reference. See [`Scheduler::unref`].
    ///
    /// # Errors
    ///
    /// Invalid handle, underflow, or unclaimed autorelease.
    pub fn unref(&self, handle: EntityHandle) -> TickResult<i32> {
        self.sched.unref(handle)
    }

    /// Lifecycle snapshot of an entity.
    #[must_use]
    pub fn status(&self, handle: EntityHandle) -> Option<EntityStatus> {
        self.sched.status(handle)
    }

    /// Requests cooperative termination.
    pub fn shutdown(&self) {
        self.sched.shutdown();
    }

    /// True once every entity has drained.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.sched.finished()
    }

    /// Frame number of the most recent game pass.
    #[must_use]
    pub fn frame_num(&self) -> u64 {
        self.sched.frame_num()
    }

    /// Enters recording mode (nestable).
    pub fn start_recording(&self) {
        self.sched.start_recording();
    }

    /// Leaves one level of recording mode.
    pub fn stop_recording(&self) {
        self.sched.stop_recording();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.gametick.push(Signal::Terminate);
        self.disktick.push(Signal::Terminate);
        if let Some(handle) = self.game_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.disk_thread.take() {
            let _ = handle.join();
        }
    }
}

fn game_thread_main(sched: &Scheduler, gametick: &Queue<Signal>, drawtick: &Queue<Signal>) {
    tracing::info!("game thread initialised");
    loop {
        match gametick.pop() {
            Signal::Terminate => break,
            Signal::Proceed => {}
        }
        sched.tick_game_pass();
        drawtick.push(Signal::Proceed);
    }
    drawtick.push(Signal::Terminate);
    tracing::info!("game thread terminated");
}

/// Placeholder for asynchronous asset I/O; parks until told to quit.
fn disk_thread_main(disktick: &Queue<Signal>) {
    tracing::info!("disk thread initialised");
    loop {
        if disktick.pop() == Signal::Terminate {
            break;
        }
    }
    tracing::info!("disk thread terminated");
}
