//! # The Scheduler
//!
//! Owner of every registered entity and of the per-pass pipeline:
//!
//! 1. advance the frame counter, sample and clamp delta time
//! 2. stuck-shutdown escalation (poke referenced entities so a
//!    forgotten reference can never deadlock process exit)
//! 3. reaper: free slots marked during the previous pass
//! 4. garbage collection: expire unclaimed autoreleases, mark zero-ref
//!    entities for destruction
//! 5. admission: move pending registrations into their group lists
//! 6. game tick pass in group order
//!
//! The draw pass ([`Scheduler::tick_draw_pass`]) walks the draw groups
//! the same way on the caller thread. All state sits behind one mutex;
//! an entity's box is taken out of its slot for the duration of its own
//! callback, so callbacks can re-enter the scheduler to register
//! children or transfer ownership without deadlocking.
//!
//! This is an explicit object with an injected lifetime. Applications
//! normally drive it through [`Ticker`](crate::Ticker); tests drive the
//! pass methods directly for deterministic frame-by-frame control.

use std::time::Duration;

use parking_lot::Mutex;

use flywheel_core::{
    DrawGroup, EntityHandle, GroupAssignment, GroupSchedule, TickError, TickPhase, TickResult,
};

use crate::arena::{EntityArena, EntityStatus, Slot, SlotState};
use crate::config::TickerConfig;
use crate::entity::{DrawTick, Entity, GameTick};
use crate::hooks::DrawHooks;
use crate::profiler::{Profiler, Stat};
use crate::timer::Timer;

/// Seconds of simulated time between keepalive log lines.
const KEEPALIVE_PERIOD: f32 = 10.0;

struct State {
    arena: EntityArena,
    /// Registered entities awaiting admission into the group lists.
    pending: Vec<EntityHandle>,
    /// Entities whose initial reference is still scheduler-owned.
    autorelease: Vec<EntityHandle>,
    /// Per-game-group handle lists, in schedule order.
    game_lists: Vec<Vec<EntityHandle>>,
    /// Per-draw-group handle lists, in schedule order.
    draw_lists: Vec<Vec<EntityHandle>>,
    frame: u64,
    recording: u32,
    delta: f32,
    bias: f32,
    keepalive: f32,
    timer: Timer,
    quit: bool,
    quit_frame: u64,
    quit_delay: u32,
    panic: u32,
}

/// Priority-grouped, reference-counted entity scheduler.
pub struct Scheduler {
    schedule: GroupSchedule,
    config: TickerConfig,
    profiler: Profiler,
    state: Mutex<State>,
}

impl Scheduler {
    /// Creates a scheduler with the given timing parameters and group
    /// schedule.
    #[must_use]
    pub fn new(config: TickerConfig, schedule: GroupSchedule) -> Self {
        let state = State {
            arena: EntityArena::new(),
            pending: Vec::new(),
            autorelease: Vec::new(),
            game_lists: vec![Vec::new(); schedule.game_count()],
            draw_lists: vec![Vec::new(); schedule.draw_count()],
            frame: 0,
            recording: 0,
            delta: 0.0,
            bias: 0.0,
            keepalive: 0.0,
            timer: Timer::new(),
            quit: false,
            quit_frame: 0,
            quit_delay: config.quit_delay,
            panic: 0,
        };
        Self {
            schedule,
            config,
            profiler: Profiler::new(),
            state: Mutex::new(state),
        }
    }

    /// The group schedule this scheduler runs.
    #[must_use]
    pub fn schedule(&self) -> &GroupSchedule {
        &self.schedule
    }

    /// The timing configuration this scheduler runs.
    #[must_use]
    pub fn config(&self) -> &TickerConfig {
        &self.config
    }

    /// Pass timing counters.
    #[must_use]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    // =========================================================================
    // Registration and reference counting
    // =========================================================================

    /// Registers an entity with the scheduler.
    ///
    /// The entity starts with one implicit, autoreleased reference and
    /// joins the group lists on the next pass. Claim it with
    /// [`Self::ref_entity`] before the garbage-collection pass after
    /// admission, or it is destroyed automatically.
    ///
    /// # Errors
    ///
    /// Group ids outside this scheduler's schedule.
    pub fn register(
        &self,
        entity: Box<dyn Entity>,
        groups: GroupAssignment,
    ) -> TickResult<EntityHandle> {
        self.schedule.check(groups)?;
        let mut guard = self.state.lock();
        let st = &mut *guard;
        let handle = st.arena.insert(entity, groups);
        st.pending.push(handle);
        st.autorelease.push(handle);
        tracing::debug!("registered {}", handle);
        Ok(handle)
    }

    /// Registers an entity into each phase's default group.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub fn register_default(&self, entity: Box<dyn Entity>) -> TickResult<EntityHandle> {
        self.register(entity, self.schedule.default_assignment())
    }

    /// Takes ownership of an entity.
    ///
    /// For an autoreleased entity this claims the initial implicit
    /// reference (no count change); otherwise the count is incremented.
    ///
    /// # Errors
    ///
    /// Null or stale handle, or entity already scheduled for
    /// destruction.
    pub fn ref_entity(&self, handle: EntityHandle) -> TickResult<()> {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        let slot = st.arena.get_mut(handle)?;
        if slot.state == SlotState::Destroying {
            return Err(TickError::RefWhileDestroying {
                handle,
                name: slot.name.clone(),
            });
        }
        if slot.autorelease {
            slot.autorelease = false;
            // The most recent registration sits at the tail, so this
            // scan is usually one comparison.
            if let Some(pos) = st.autorelease.iter().rposition(|&h| h == handle) {
                st.autorelease.swap_remove(pos);
            }
        } else {
            slot.ref_count += 1;
        }
        Ok(())
    }

    /// Releases one reference and returns the new count.
    ///
    /// The caller must stop touching the entity once 0 is returned;
    /// actual destruction is deferred to the scheduler's next passes.
    ///
    /// # Errors
    ///
    /// Null or stale handle, count already zero, or entity still
    /// autoreleased (claim it with [`Self::ref_entity`] first).
    pub fn unref(&self, handle: EntityHandle) -> TickResult<i32> {
        let mut guard = self.state.lock();
        let slot = guard.arena.get_mut(handle)?;
        if slot.autorelease {
            return Err(TickError::UnrefAutoreleased {
                handle,
                name: slot.name.clone(),
            });
        }
        if slot.ref_count <= 0 {
            return Err(TickError::UnrefUnderflow {
                handle,
                name: slot.name.clone(),
            });
        }
        slot.ref_count -= 1;
        Ok(slot.ref_count)
    }

    /// Lifecycle snapshot of an entity, `None` once the slot was
    /// reaped. This is the weak back-reference used by overlays and
    /// tests to observe deferred destruction.
    #[must_use]
    pub fn status(&self, handle: EntityHandle) -> Option<EntityStatus> {
        self.state.lock().arena.status(handle)
    }

    /// Number of registered, not-yet-reaped entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.state.lock().arena.len()
    }

    /// True once every entity has been reaped.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.state.lock().arena.is_empty()
    }

    /// Frame number of the most recent game pass.
    #[must_use]
    pub fn frame_num(&self) -> u64 {
        self.state.lock().frame
    }

    // =========================================================================
    // Recording control
    // =========================================================================

    /// Enters recording mode (nestable). While any recorder is active
    /// and the framerate is fixed, delta time is pinned to `1/fps` and
    /// pacing stops compensating for lag, so captured frames get a
    /// deterministic duration.
    pub fn start_recording(&self) {
        self.state.lock().recording += 1;
    }

    /// Leaves one level of recording mode.
    pub fn stop_recording(&self) {
        let mut st = self.state.lock();
        st.recording = st.recording.saturating_sub(1);
    }

    /// Whether any recorder is currently active.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.state.lock().recording > 0
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Requests cooperative termination.
    ///
    /// Releases every still-autoreleased entity and arms the stuck
    /// shutdown escalation. Entities drain through the normal garbage
    /// collection over the following passes; poll [`Self::finished`].
    pub fn shutdown(&self) {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        while let Some(handle) = st.autorelease.pop() {
            if let Ok(slot) = st.arena.get_mut(handle) {
                slot.autorelease = false;
                slot.ref_count -= 1;
            }
        }
        st.quit = true;
        st.quit_frame = st.frame;
        tracing::info!("shutdown requested at frame {}", st.frame);
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.state.lock().quit
    }

    // =========================================================================
    // Game pass
    // =========================================================================

    /// Runs one full game pass: timing, escalation, reaper, garbage
    /// collection, admission, then the group-ordered game ticks.
    ///
    /// Normally invoked by the ticker's game thread; callable directly
    /// for synchronous, frame-by-frame control.
    pub fn tick_game_pass(&self) {
        self.profiler.stop(Stat::Frame);
        self.profiler.start(Stat::Frame);
        self.profiler.start(Stat::Game);

        {
            let mut guard = self.state.lock();
            let st = &mut *guard;
            st.frame += 1;

            // Recorders need a fixed, deterministic per-frame duration.
            if st.recording > 0 && self.config.fps > 0.0 {
                st.delta = self.config.frame_interval();
            } else {
                st.delta = st.timer.get();
                st.bias += st.delta;
            }

            // Never simulate more than the floor framerate allows.
            if st.delta > self.config.max_delta() {
                st.delta = self.config.max_delta();
                st.bias = 0.0;
            }

            st.keepalive += st.delta;
            if st.keepalive > KEEPALIVE_PERIOD {
                tracing::info!(
                    "scheduler keepalive: frame {}, {} entities",
                    st.frame,
                    st.arena.len()
                );
                st.keepalive = 0.0;
            }

            Self::escalate_stuck_shutdown(st);
            Self::collect_garbage(st);
            Self::admit_pending(st);
        }

        self.run_game_ticks();

        self.profiler.stop(Stat::Game);
    }

    /// Stuck-shutdown escalation: once `quit_delay` frames have passed
    /// since the shutdown request without draining, force-release up to
    /// `panic` references across the lists, doubling the allowance and
    /// halving the delay each round. Liveness trumps ownership here: a
    /// referenced-but-forgotten entity must not hang process exit.
    fn escalate_stuck_shutdown(st: &mut State) {
        if !st.quit || (st.frame - st.quit_frame) % u64::from(st.quit_delay) != 0 {
            return;
        }
        st.panic = 2 * (st.panic + 1);

        let order: Vec<EntityHandle> = st
            .game_lists
            .iter()
            .chain(st.draw_lists.iter())
            .flatten()
            .copied()
            .collect();

        let mut poked = 0u32;
        for handle in order {
            if poked >= st.panic {
                break;
            }
            if let Ok(slot) = st.arena.get_mut(handle) {
                if slot.ref_count > 0 {
                    tracing::error!("poking {} ({})", slot.name, handle);
                    slot.ref_count -= 1;
                    poked += 1;
                }
            }
        }

        if poked > 0 {
            tracing::error!(
                "{} entities stuck after {} frames, poked {}",
                st.arena.len(),
                st.quit_delay,
                poked
            );
        }
        st.quit_delay = (st.quit_delay / 2).max(1);
    }

    /// Reaper + garbage collection. Slots marked `Destroying` on a
    /// previous pass are unlinked from every group list and freed
    /// exactly once; then unclaimed autoreleases are expired and
    /// zero-ref entities are marked for the next reaper run. The
    /// mark/free split gives every entity one full pass of grace
    /// between reaching ref count zero and actual destruction.
    fn collect_garbage(st: &mut State) {
        for list in st.game_lists.iter_mut().chain(st.draw_lists.iter_mut()) {
            list.retain(|&handle| {
                st.arena
                    .get(handle)
                    .is_ok_and(|slot| slot.state != SlotState::Destroying)
            });
        }

        let doomed: Vec<EntityHandle> = st
            .arena
            .handles()
            .into_iter()
            .filter(|&h| {
                st.arena
                    .get(h)
                    .is_ok_and(|slot| slot.state == SlotState::Destroying)
            })
            .collect();
        for handle in doomed {
            if let Some(name) = st.arena.remove(handle) {
                tracing::debug!("reaped {} ({})", name, handle);
            }
        }

        let mut expired = Vec::new();
        for handle in st.arena.handles() {
            let Ok(slot) = st.arena.get_mut(handle) else {
                continue;
            };
            if slot.state != SlotState::Active {
                continue;
            }
            if slot.autorelease {
                // Nobody claimed the initial reference in time.
                slot.autorelease = false;
                slot.ref_count -= 1;
                expired.push(handle);
            }
            if slot.ref_count <= 0 {
                slot.state = SlotState::Destroying;
                tracing::debug!("marked {} ({}) for destruction", slot.name, handle);
            }
        }
        if !expired.is_empty() {
            st.autorelease.retain(|h| !expired.contains(h));
        }
    }

    /// Moves pending registrations into their group lists. Deferred to
    /// the pass so registration itself stays O(1) and never touches the
    /// lists a tick pass may be walking.
    fn admit_pending(st: &mut State) {
        let pending = std::mem::take(&mut st.pending);
        for handle in pending {
            let Ok(slot) = st.arena.get_mut(handle) else {
                continue;
            };
            slot.state = SlotState::Active;
            let groups = slot.groups;
            st.game_lists[groups.game.0 as usize].push(handle);
            if let Some(draw) = groups.draw {
                st.draw_lists[draw.0 as usize].push(handle);
            }
        }
    }

    fn run_game_ticks(&self) {
        for g in 0..self.schedule.game_count() {
            let handles = {
                let st = self.state.lock();
                // Stop as soon as shutdown is requested.
                if st.quit {
                    return;
                }
                st.game_lists[g].clone()
            };
            for handle in handles {
                self.tick_one(handle, TickKind::Game);
            }
        }
    }

    // =========================================================================
    // Draw pass
    // =========================================================================

    /// Runs one draw pass on the calling thread: for each draw group in
    /// schedule order, the begin hook, every live entity's draw tick,
    /// then the end hook.
    pub fn tick_draw_pass(&self, hooks: &mut dyn DrawHooks) {
        self.profiler.start(Stat::Draw);

        for d in 0..self.schedule.draw_count() {
            let group = DrawGroup(d as u32);
            let handles = {
                let st = self.state.lock();
                // Stop as soon as shutdown is requested.
                if st.quit {
                    break;
                }
                st.draw_lists[d].clone()
            };

            let name = self.schedule.draw_name(group).unwrap_or("?");
            hooks.begin_group(group, name);
            for handle in handles {
                self.tick_one(handle, TickKind::Draw(group));
            }
            hooks.end_group(group, name);
        }

        self.profiler.stop(Stat::Draw);
    }

    /// Computes the pacing sleep for the frame just drawn and applies
    /// the bias bookkeeping. The sleep itself is the caller's job so no
    /// lock is held while sleeping.
    ///
    /// The sleep is capped at `bias + max_lag` so a lagging engine
    /// never paces itself below the floor framerate, and bias is not
    /// compensated while recording.
    pub fn frame_wait(&self) -> Option<Duration> {
        let mut guard = self.state.lock();
        let st = &mut *guard;

        let mut frametime = self.config.frame_interval();
        if frametime > st.bias + self.config.max_lag {
            frametime = st.bias + self.config.max_lag;
        }
        let wait = if frametime > st.bias {
            st.timer.remaining(frametime - st.bias)
        } else {
            None
        };
        if st.recording == 0 {
            st.bias -= frametime;
        }
        wait
    }

    // =========================================================================
    // Tick plumbing
    // =========================================================================

    /// Ticks one entity: phase bookkeeping and box extraction under the
    /// lock, the callback itself outside it. Entities whose slot is
    /// missing, not yet admitted, or marked for destruction are
    /// silently skipped.
    fn tick_one(&self, handle: EntityHandle, kind: TickKind) {
        let pre = kind.pre_phase();
        let (mut entity, seconds, frame) = {
            let mut guard = self.state.lock();
            let st = &mut *guard;
            let Ok(slot) = st.arena.get_mut(handle) else {
                return;
            };
            if slot.state != SlotState::Active {
                return;
            }
            let Some(entity) = slot.entity.take() else {
                return;
            };
            Self::advance_phase(slot, pre, handle);
            (entity, st.delta, st.frame)
        };

        match kind {
            TickKind::Game => {
                let mut tick = GameTick::new(seconds, frame, handle, self);
                entity.tick_game(&mut tick);
            }
            TickKind::Draw(group) => {
                let mut tick = DrawTick::new(seconds, frame, handle, group, self);
                entity.tick_draw(&mut tick);
            }
        }

        let mut guard = self.state.lock();
        let st = &mut *guard;
        if let Ok(slot) = st.arena.get_mut(handle) {
            slot.entity = Some(entity);
            Self::advance_phase(slot, kind.post_phase(), handle);
            Self::advance_phase(slot, TickPhase::Idle, handle);
        }
    }

    /// Applies one phase transition, logging (not crashing) on a
    /// sequencing violation and forcing the target phase so one bad
    /// transition does not cascade.
    fn advance_phase(slot: &mut Slot, next: TickPhase, handle: EntityHandle) {
        match slot.phase.advance(next) {
            Ok(phase) => slot.phase = phase,
            Err(err) => {
                tracing::error!("entity {} ({}): {}", slot.name, handle, err);
                slot.phase = next;
            }
        }
    }
}

#[derive(Clone, Copy)]
enum TickKind {
    Game,
    Draw(DrawGroup),
}

impl TickKind {
    fn pre_phase(self) -> TickPhase {
        match self {
            Self::Game => TickPhase::PreTickGame,
            Self::Draw(_) => TickPhase::PreTickDraw,
        }
    }

    fn post_phase(self) -> TickPhase {
        match self {
            Self::Game => TickPhase::PostTickGame,
            Self::Draw(_) => TickPhase::PostTickDraw,
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        if !st.arena.is_empty() {
            tracing::error!(
                "{} entities still registered at scheduler teardown",
                st.arena.len()
            );
        }
        if !st.autorelease.is_empty() {
            tracing::error!(
                "{} autoreleased entities at scheduler teardown",
                st.autorelease.len()
            );
        }
        if st.quit {
            tracing::debug!("{} frames required to quit", st.frame - st.quit_frame);
        }
    }
}
