//! # SKYHOP Game Loop
//!
//! One rendered frame:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. ACCUMULATE                                                       │
//! │    └─ elapsed wall time, clamped to max_frame_time                  │
//! │                                                                     │
//! │ 2. DRAIN (zero or more fixed ticks, same InputSnapshot)             │
//! │    ├─ MovementSystem                                                │
//! │    ├─ PhysicsSystem                                                 │
//! │    └─ Fall check: reset world, repopulate, invalidate presenter,    │
//! │       drop the rest of the budget                                   │
//! │                                                                     │
//! │ 3. PRESENT (once, read-only)                                        │
//! │                                                                     │
//! │ 4. STATS                                                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use skyhop_core::{EntityId, Position, World};

use crate::assets::ModelLoader;
use crate::config::{SimulationConfig, TimingConfig};
use crate::error::GameResult;
use crate::input::InputSnapshot;
use crate::presentation::Presenter;
use crate::scene::{self, SceneHandles};
use crate::systems::{MovementSystem, PhysicsSystem};

/// Frames slower than this get logged.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

// ============================================================================
// FIXED TIMESTEP
// ============================================================================

/// Time accumulator that hands out fixed-size ticks.
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    step: f64,
    max_frame_time: f64,
    accumulator: f64,
}

impl FixedTimestep {
    /// Creates an accumulator for ticks of `step` seconds.
    #[must_use]
    pub fn new(step: f32, max_frame_time: f32) -> Self {
        Self {
            step: f64::from(step),
            max_frame_time: f64::from(max_frame_time),
            accumulator: 0.0,
        }
    }

    /// Creates an accumulator from the `[timing]` section.
    #[must_use]
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.tick_seconds(), timing.max_frame_time)
    }

    /// Adds one frame's elapsed time.
    ///
    /// Anything above `max_frame_time` is dropped, so a stall never turns
    /// into a burst of catch-up ticks. Negative or NaN input counts as zero.
    pub fn advance(&mut self, elapsed: f32) {
        let elapsed = f64::from(elapsed);
        let elapsed = if elapsed.is_nan() {
            0.0
        } else {
            elapsed.clamp(0.0, self.max_frame_time)
        };
        self.accumulator += elapsed;
    }

    /// Consumes one tick if the budget allows.
    pub fn try_tick(&mut self) -> bool {
        if self.accumulator >= self.step {
            self.accumulator -= self.step;
            true
        } else {
            false
        }
    }

    /// Throws away the remaining budget.
    pub fn discard(&mut self) {
        self.accumulator = 0.0;
    }

    /// Seconds waiting in the accumulator.
    #[must_use]
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    /// Tick length in seconds.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn step_seconds(&self) -> f32 {
        self.step as f32
    }
}

// ============================================================================
// FRAME STATISTICS
// ============================================================================

/// What happened during one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Fixed ticks drained.
    pub ticks: u32,
    /// The world was reset during the drain.
    pub reset: bool,
    /// Simulation time in microseconds.
    pub logic_us: u64,
    /// Presentation time in microseconds.
    pub render_us: u64,
    /// Total frame time in microseconds.
    pub total_us: u64,
}

/// Running totals over an [`App`] session.
///
/// Frames and ticks are counted separately: a frame may drain zero ticks
/// (display faster than the simulation) or several (catching up after a
/// slow frame).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames presented.
    pub frames: u64,
    /// Fixed ticks simulated.
    pub ticks: u64,
    /// Level restarts after a fall.
    pub resets: u64,
    /// Frames that drained no tick.
    pub idle_frames: u64,
    /// Frames that drained more than one tick.
    pub catch_up_frames: u64,
    /// Time spent in systems, microseconds.
    pub logic_us: u64,
    /// Time spent presenting, microseconds.
    pub render_us: u64,
    /// Slowest frame, microseconds.
    pub worst_frame_us: u64,
}

impl SessionStats {
    /// Folds one frame into the totals.
    pub fn record(&mut self, frame: &FrameStats) {
        self.frames += 1;
        self.ticks += u64::from(frame.ticks);
        self.resets += u64::from(frame.reset);
        match frame.ticks {
            0 => self.idle_frames += 1,
            1 => {}
            _ => self.catch_up_frames += 1,
        }
        self.logic_us += frame.logic_us;
        self.render_us += frame.render_us;
        self.worst_frame_us = self.worst_frame_us.max(frame.total_us);
    }

    /// Mean ticks drained per frame.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn ticks_per_frame(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.ticks as f64 / self.frames as f64
    }

    /// Seconds of game time covered by the ticks, for a tick of `step` seconds.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn simulated_seconds(&self, step: f32) -> f64 {
        self.ticks as f64 * f64::from(step)
    }

    /// Fraction of measured frame time spent in systems rather than presenting.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn logic_share(&self) -> f64 {
        let busy = self.logic_us + self.render_us;
        if busy == 0 {
            return 0.0;
        }
        self.logic_us as f64 / busy as f64
    }

    /// Logs the totals at info level.
    #[allow(clippy::cast_precision_loss)]
    pub fn log_summary(&self, step: f32) {
        tracing::info!(
            frames = self.frames,
            ticks = self.ticks,
            resets = self.resets,
            idle_frames = self.idle_frames,
            catch_up_frames = self.catch_up_frames,
            simulated_s = format_args!("{:.2}", self.simulated_seconds(step)),
            ticks_per_frame = format_args!("{:.2}", self.ticks_per_frame()),
            logic_share = format_args!("{:.1}%", self.logic_share() * 100.0),
            worst_ms = format_args!("{:.3}", self.worst_frame_us as f64 / 1000.0),
            "session statistics"
        );
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

// ============================================================================
// APP
// ============================================================================

/// The running game: world, systems, presenter and clock in one place.
pub struct App<P: Presenter> {
    world: World,
    config: SimulationConfig,
    loader: Box<dyn ModelLoader>,
    presenter: P,
    scene: SceneHandles,
    timestep: FixedTimestep,
    frame_count: u64,
    stats: SessionStats,
}

impl<P: Presenter> App<P> {
    /// Validates the config and builds the first scene.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`](crate::GameError::InvalidConfig) for a
    /// bad config, or any error from [`scene::populate`].
    pub fn new(
        config: SimulationConfig,
        loader: Box<dyn ModelLoader>,
        presenter: P,
    ) -> GameResult<Self> {
        config.validate()?;
        let mut world = World::new();
        let scene = scene::populate(&mut world, loader.as_ref(), &config.scene)?;
        let timestep = FixedTimestep::from_config(&config.timing);

        Ok(Self {
            world,
            config,
            loader,
            presenter,
            scene,
            timestep,
            frame_count: 0,
            stats: SessionStats::default(),
        })
    }

    /// Runs one rendered frame.
    ///
    /// `elapsed` is the wall time since the previous frame in seconds;
    /// `input` is the key state captured for this frame.
    ///
    /// # Errors
    ///
    /// Propagates system and repopulation failures. The world is left
    /// between ticks either way.
    pub fn frame(&mut self, elapsed: f32, input: &InputSnapshot) -> GameResult<FrameStats> {
        let started = Instant::now();
        let dt = self.timestep.step_seconds();
        self.timestep.advance(elapsed);

        let mut ticks = 0u32;
        let mut reset = false;
        while self.timestep.try_tick() {
            MovementSystem::run(dt, &mut self.world, input, &self.config.movement)?;
            PhysicsSystem::run(dt, &mut self.world, &self.config.physics)?;
            ticks += 1;

            if self.player_fell() {
                self.restart()?;
                self.timestep.discard();
                reset = true;
                break;
            }
        }
        let logic = started.elapsed();

        self.presenter.present(&self.world);
        let total = started.elapsed();

        let stats = FrameStats {
            frame: self.frame_count,
            ticks,
            reset,
            logic_us: micros(logic),
            render_us: micros(total.saturating_sub(logic)),
            total_us: micros(total),
        };
        self.frame_count += 1;
        self.stats.record(&stats);

        if total > MAX_FRAME_TIME {
            tracing::warn!(
                frame = stats.frame,
                ticks,
                ms = format_args!("{:.2}", total.as_secs_f64() * 1000.0),
                "frame exceeded budget"
            );
        }
        Ok(stats)
    }

    /// Resets the world and builds a fresh scene.
    ///
    /// # Errors
    ///
    /// Any error from [`scene::populate`].
    pub fn restart(&mut self) -> GameResult<()> {
        self.world.reset();
        self.scene = scene::populate(&mut self.world, self.loader.as_ref(), &self.config.scene)?;
        self.presenter.invalidate();
        tracing::info!(epoch = self.world.epoch(), frame = self.frame_count, "level restarted");
        Ok(())
    }

    fn player_fell(&self) -> bool {
        self.world
            .get_component::<Position>(self.scene.player)
            .is_some_and(|position| position.y < self.config.scene.fall_reset_height)
    }

    /// The simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access between frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The player entity of the current scene.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.scene.player
    }

    /// Ids created by the latest population.
    #[must_use]
    pub fn scene(&self) -> &SceneHandles {
        &self.scene
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The presenter.
    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Totals over every frame run so far.
    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}
