//! Spawn scheduler: the repeating tick, the capacity gate and timed removal

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, trace, warn};

use crate::config::{Configuration, ParticleSettings};
use crate::error::{EngineError, Result};
use crate::factory::{ParticleFactory, Spawned};
use crate::host::{AnimationExecutor, Container};
use crate::schedule::{TaskId, Timeline};
use crate::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

/// Identity of a spawned particle, unique per engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(u64);

#[derive(Debug, Clone, Copy)]
enum Job {
    Spawn,
    Expire(ParticleId),
}

struct LiveParticle<R> {
    handle: R,
    expiry: TaskId,
}

/// Counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub spawned: u64,
    pub expired: u64,
    /// Ticks that found the engine at capacity
    pub skipped: u64,
    /// Particles removed early by [`Engine::stop_and_clear`]
    pub cleared: u64,
}

/// Drives one particle effect over a virtual clock.
///
/// Nothing happens until the host advances time with [`Engine::advance_to`]
/// or [`Engine::advance_by`]; due ticks and removals then fire in
/// chronological order. Every engine owns its own state.
pub struct Engine<C: Container, A: AnimationExecutor> {
    container: C,
    executor: A,
    factory: ParticleFactory,
    rng: StdRng,
    timeline: Timeline<Job>,
    tick: Option<TaskId>,
    live: HashMap<ParticleId, LiveParticle<C::Ref>>,
    next_particle: u64,
    fault: Option<String>,
    stats: EngineStats,
}

impl<C: Container, A: AnimationExecutor> Engine<C, A> {
    /// Validates `settings`, loads the template from `template_source` and
    /// resolves its aspect ratio. Fails before anything is spawned.
    pub fn new(
        mut container: C,
        executor: A,
        template_source: &str,
        settings: &ParticleSettings,
    ) -> Result<Self> {
        let config = settings.validate()?;
        let mut template = Template::load(template_source)?;
        if template.needs_measurement() {
            let measured = container.measure(&template.clone_shape());
            template.resolve_measured(measured);
        }
        Ok(Self::from_parts(container, executor, template, config))
    }

    /// Builds an engine from an already loaded template and validated
    /// configuration. The template is trusted as given; a clone without a
    /// fillable part faults the engine on the tick that creates it.
    pub fn from_parts(
        container: C,
        executor: A,
        template: Template,
        config: Configuration,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            container,
            executor,
            factory: ParticleFactory::new(template, config),
            rng,
            timeline: Timeline::new(),
            tick: None,
            live: HashMap::new(),
            next_particle: 0,
            fault: None,
            stats: EngineStats::default(),
        }
    }

    /// Begin spawning every `timeout`. Calling it while running is ignored.
    pub fn start(&mut self) -> Result<()> {
        if let Some(fault) = &self.fault {
            return Err(EngineError::Faulted(fault.clone()));
        }
        if self.tick.is_some() {
            debug!("start ignored: engine already running");
            return Ok(());
        }
        let timeout = self.config().timeout;
        self.tick = Some(self.timeline.schedule_every(timeout, Job::Spawn));
        info!(
            "particle engine started: every {:?}, max {} particles",
            timeout,
            self.config().max_particles
        );
        Ok(())
    }

    /// Stop spawning. Live particles keep their scheduled removal.
    pub fn stop(&mut self) {
        if let Some(tick) = self.tick.take() {
            self.timeline.cancel(tick);
            info!(
                "particle engine stopped with {} live particle(s)",
                self.live.len()
            );
        }
    }

    /// Stop spawning and remove every live particle now, cancelling the
    /// removals still pending for them.
    pub fn stop_and_clear(&mut self) {
        self.stop();
        let live = std::mem::take(&mut self.live);
        if live.is_empty() {
            return;
        }
        info!("clearing {} live particle(s)", live.len());
        for (id, particle) in live {
            self.timeline.cancel(particle.expiry);
            self.stats.cleared += 1;
            if let Err(err) = self.container.remove(particle.handle) {
                warn!("failed to remove particle {}: {err}", id.0);
            }
        }
    }

    pub fn state(&self) -> EngineState {
        if self.tick.is_some() {
            EngineState::Running
        } else {
            EngineState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Particles currently in the container
    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    /// True once stopped with no particle left to remove
    pub fn is_idle(&self) -> bool {
        !self.is_running() && self.live.is_empty()
    }

    pub fn config(&self) -> &Configuration {
        self.factory.config()
    }

    pub fn template(&self) -> &Template {
        self.factory.template()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Reason the engine stopped itself, if it did
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn executor(&self) -> &A {
        &self.executor
    }

    /// Current position of the engine clock
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// When the next tick or removal is due
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.timeline.next_deadline()
    }

    pub fn advance_by(&mut self, delta: Duration) -> Result<()> {
        let target = self.now() + delta;
        self.advance_to(target)
    }

    /// Fire every task due up to `now`.
    ///
    /// A failing spawn stops the engine; removals already scheduled still
    /// fire. The first such failure is returned once `now` is reached.
    pub fn advance_to(&mut self, now: Duration) -> Result<()> {
        let mut first_error = None;
        while let Some((_, job)) = self.timeline.pop_due(now) {
            match job {
                Job::Spawn => {
                    if let Err(err) = self.spawn_tick() {
                        self.halt(&err);
                        first_error.get_or_insert(err);
                    }
                }
                Job::Expire(id) => self.expire(id),
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn spawn_tick(&mut self) -> Result<()> {
        if self.live.len() >= self.config().max_particles {
            self.stats.skipped += 1;
            trace!("spawn skipped: {} particles live", self.live.len());
            return Ok(());
        }

        let Spawned {
            shape,
            particle,
            plan,
        } = self.factory.create(&mut self.rng)?;
        let id = ParticleId(self.next_particle);

        // Only shapes in the container are ever played
        let handle = self
            .container
            .insert(shape.clone())
            .map_err(EngineError::Host)?;
        if let Err(err) = self.executor.play(&shape, &plan) {
            if let Err(remove_err) = self.container.remove(handle) {
                warn!("failed to remove unplayed particle {}: {remove_err}", id.0);
            }
            return Err(EngineError::Host(err));
        }

        self.next_particle += 1;
        let lifetime = particle.lifetime;
        let expiry = self.timeline.schedule_once(lifetime, Job::Expire(id));
        self.live.insert(id, LiveParticle { handle, expiry });
        self.stats.spawned += 1;

        debug!(
            "spawned particle {} at {:?} for {:?} ({} live)",
            id.0,
            self.now(),
            lifetime,
            self.live.len()
        );
        Ok(())
    }

    fn expire(&mut self, id: ParticleId) {
        let Some(particle) = self.live.remove(&id) else {
            return;
        };
        debug_assert!(!self.timeline.is_scheduled(particle.expiry));
        self.stats.expired += 1;
        if let Err(err) = self.container.remove(particle.handle) {
            warn!("failed to remove particle {}: {err}", id.0);
        }
    }

    fn halt(&mut self, err: &EngineError) {
        error!("particle engine fault, stopping: {err}");
        self.stop();
        self.fault.get_or_insert_with(|| err.to_string());
    }
}
