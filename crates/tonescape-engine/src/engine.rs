//! Mode state machine and engine context.
//!
//! The [`Engine`] owns the only live mode and its scene. Every transition is a
//! full teardown followed by a fresh build, and bumps a generation counter:
//! ticks carry the [`TickHandle`] of the generation they were started for, so
//! a tick scheduled against a torn-down scene is refused instead of touching
//! the new one.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{EngineError, ModeError};
use crate::modes::{BuildContext, ModeKind, Viewport, Visualization};
use crate::scene::SceneObjectSet;
use crate::settings::{EngineSettings, FALLBACK_MODE};
use crate::spectrum::{AnalysisTap, SpectrumFrame, SpectrumSampler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Uninitialized,
    Running(ModeKind),
    /// The selected mode failed to build; nothing is drawn until the next
    /// successful transition
    Stalled(ModeKind),
}

/// Transitions raised by UI events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SelectMode(ModeKind),
    CycleNext,
    AudioSourceChanged,
}

/// Token tying a tick chain to one generation of the live mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickHandle {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    /// The update failed; the scene keeps its previous state
    Failed,
    /// No live mode to update
    Idle,
    /// The handle belongs to a torn-down generation
    Cancelled,
}

struct LiveMode {
    routine: Box<dyn Visualization>,
    scene: SceneObjectSet,
    generation: u64,
    /// Host clock at the first tick of this generation
    started_at: Option<f32>,
}

pub struct Engine {
    settings: EngineSettings,
    selected: ModeKind,
    state: MachineState,
    live: Option<LiveMode>,
    sampler: SpectrumSampler,
    viewport: Viewport,
    generation: u64,
    pending: Option<ModeKind>,
    reset_sampler: bool,
}

impl Engine {
    pub fn new(settings: EngineSettings, viewport: Viewport) -> Self {
        let sampler = SpectrumSampler::new(settings.analyser());
        Self {
            selected: settings.default_mode(),
            settings,
            state: MachineState::Uninitialized,
            live: None,
            sampler,
            viewport,
            generation: 0,
            pending: None,
            reset_sampler: false,
        }
    }

    /// Initial load: the configured mode, or the fallback if it cannot be
    /// built
    pub fn start(&mut self) -> Result<TickHandle, EngineError> {
        let target = self.settings.default_mode();
        match self.select_mode(target) {
            Ok(handle) => Ok(handle),
            Err(EngineError::Construction { source, .. }) if target == FALLBACK_MODE => {
                Err(EngineError::NoFallback(source))
            }
            Err(err) => {
                log::warn!("{}; falling back to {}", err, FALLBACK_MODE);
                self.select_mode(FALLBACK_MODE).map_err(|err| match err {
                    EngineError::Construction { source, .. } => EngineError::NoFallback(source),
                    other => other,
                })
            }
        }
    }

    /// Tear down the live mode and build `target` from scratch, even when it
    /// is already the live mode
    pub fn select_mode(&mut self, target: ModeKind) -> Result<TickHandle, EngineError> {
        if let Some(old) = self.live.take() {
            log::debug!(
                "tearing down {} ({} objects)",
                old.scene.owner(),
                old.scene.len()
            );
        }

        self.generation += 1;
        self.selected = target;

        if std::mem::take(&mut self.reset_sampler) {
            self.sampler.reset();
        }

        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut ctx = BuildContext {
            rng: &mut rng,
            viewport: self.viewport,
            settings: &self.settings,
        };

        match target.build(&mut ctx) {
            Ok((routine, scene)) => {
                log::info!("{} ready ({} objects)", target, scene.len());
                self.live = Some(LiveMode {
                    routine,
                    scene,
                    generation: self.generation,
                    started_at: None,
                });
                self.state = MachineState::Running(target);
                Ok(TickHandle {
                    generation: self.generation,
                })
            }
            Err(source) => {
                log::error!("failed to build {}: {}", target, source);
                self.state = MachineState::Stalled(target);
                Err(EngineError::Construction {
                    mode: target,
                    source,
                })
            }
        }
    }

    /// Rebuild the selected mode against a new audio source
    pub fn audio_source_changed(&mut self) -> Result<TickHandle, EngineError> {
        self.reset_sampler = true;
        self.select_mode(self.selected)
    }

    pub fn cycle_next(&mut self) -> Result<TickHandle, EngineError> {
        self.select_mode(self.selected.next())
    }

    /// Defer a transition to the next [`Engine::apply_pending`] call, so the
    /// tick in flight finishes drawing the scene it started with
    pub fn queue(&mut self, transition: Transition) {
        let base = self.pending.unwrap_or(self.selected);
        self.pending = Some(match transition {
            Transition::SelectMode(mode) => mode,
            Transition::CycleNext => base.next(),
            Transition::AudioSourceChanged => {
                self.reset_sampler = true;
                base
            }
        });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run the queued transition, if any
    pub fn apply_pending(&mut self) -> Option<Result<TickHandle, EngineError>> {
        self.pending.take().map(|target| self.select_mode(target))
    }

    /// Sample the tap (when connected) and update the live mode.
    ///
    /// `elapsed` is the host clock in seconds. The mode sees the time since
    /// its first tick, so a rebuilt scene always starts from zero.
    pub fn tick(
        &mut self,
        handle: TickHandle,
        tap: Option<&dyn AnalysisTap>,
        elapsed: f32,
    ) -> TickOutcome {
        if let Some(outcome) = self.refuse(handle) {
            return outcome;
        }
        if let Some(tap) = tap {
            self.sampler.sample(tap);
        }
        match self.live.as_mut() {
            Some(live) => run_update(live, self.sampler.frame(), elapsed),
            None => TickOutcome::Idle,
        }
    }

    /// Update the live mode with an explicit frame
    pub fn tick_frame(
        &mut self,
        handle: TickHandle,
        frame: &SpectrumFrame,
        elapsed: f32,
    ) -> TickOutcome {
        if let Some(outcome) = self.refuse(handle) {
            return outcome;
        }
        match self.live.as_mut() {
            Some(live) => run_update(live, frame, elapsed),
            None => TickOutcome::Idle,
        }
    }

    fn refuse(&self, handle: TickHandle) -> Option<TickOutcome> {
        match &self.live {
            None => Some(TickOutcome::Idle),
            Some(live) if live.generation != handle.generation => {
                log::debug!(
                    "dropping tick for generation {} (live is {})",
                    handle.generation,
                    live.generation
                );
                Some(TickOutcome::Cancelled)
            }
            Some(_) => None,
        }
    }

    /// Projection update only; never a transition
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        if let Some(live) = self.live.as_mut() {
            live.scene.camera.set_viewport(width, height);
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn selected(&self) -> ModeKind {
        self.selected
    }

    /// Handle of the live generation
    pub fn handle(&self) -> Option<TickHandle> {
        self.live.as_ref().map(|live| TickHandle {
            generation: live.generation,
        })
    }

    pub fn scene(&self) -> Option<&SceneObjectSet> {
        self.live.as_ref().map(|live| &live.scene)
    }

    /// Last sampled spectrum
    pub fn frame(&self) -> &SpectrumFrame {
        self.sampler.frame()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

fn run_update(live: &mut LiveMode, frame: &SpectrumFrame, elapsed: f32) -> TickOutcome {
    let kind = live.routine.kind();
    let since_start = elapsed - *live.started_at.get_or_insert(elapsed);
    match live.routine.update(&mut live.scene, frame, since_start) {
        Ok(()) => TickOutcome::Rendered,
        Err(err) => {
            log_tick_failure(kind, &err);
            TickOutcome::Failed
        }
    }
}

fn log_tick_failure(kind: ModeKind, err: &ModeError) {
    log::warn!("{} tick failed: {}", kind, err);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> EngineSettings {
        EngineSettings {
            seed: Some(7),
            ..EngineSettings::default()
        }
    }

    #[test]
    fn test_starts_uninitialized() {
        let engine = Engine::new(seeded(), Viewport::default());
        assert_eq!(engine.state(), MachineState::Uninitialized);
        assert!(engine.scene().is_none());
        assert!(engine.handle().is_none());
    }

    #[test]
    fn test_reselecting_same_mode_rebuilds() {
        let mut engine = Engine::new(seeded(), Viewport::default());
        let first = engine.select_mode(ModeKind::Shader).unwrap();
        let second = engine.select_mode(ModeKind::Shader).unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.state(), MachineState::Running(ModeKind::Shader));
    }

    #[test]
    fn test_stale_handle_is_cancelled() {
        let mut engine = Engine::new(seeded(), Viewport::default());
        let old = engine.select_mode(ModeKind::Mosaic).unwrap();
        let new = engine.select_mode(ModeKind::Mosaic).unwrap();
        let frame = SpectrumFrame::silent(256);
        assert_eq!(engine.tick_frame(old, &frame, 0.0), TickOutcome::Cancelled);
        assert_eq!(engine.tick_frame(new, &frame, 0.0), TickOutcome::Rendered);
    }

    #[test]
    fn test_queued_transitions_wait_for_apply() {
        let mut engine = Engine::new(seeded(), Viewport::default());
        engine.select_mode(ModeKind::Mosaic).unwrap();
        engine.queue(Transition::SelectMode(ModeKind::Sphere));
        engine.queue(Transition::CycleNext);
        assert_eq!(engine.state(), MachineState::Running(ModeKind::Mosaic));
        assert!(engine.has_pending());

        let handle = engine.apply_pending().unwrap().unwrap();
        assert_eq!(engine.state(), MachineState::Running(ModeKind::Shader));
        assert_eq!(engine.handle(), Some(handle));
        assert!(engine.apply_pending().is_none());
    }

    #[test]
    fn test_mode_clock_restarts_on_rebuild() {
        use crate::scene::LightKind;

        let first_point_light_y = |engine: &Engine| {
            engine
                .scene()
                .unwrap()
                .lights()
                .find(|l| matches!(l.kind, LightKind::Point { .. }))
                .unwrap()
                .position
                .y
        };

        let mut engine = Engine::new(seeded(), Viewport::default());
        let frame = SpectrumFrame::silent(256);
        let handle = engine.select_mode(ModeKind::Sphere).unwrap();
        engine.tick_frame(handle, &frame, 100.0);
        engine.tick_frame(handle, &frame, 101.0);
        // cos(1) * 50
        assert!((first_point_light_y(&engine) - 27.015).abs() < 1e-2);

        let handle = engine.select_mode(ModeKind::Sphere).unwrap();
        assert_eq!(engine.tick_frame(handle, &frame, 250.0), TickOutcome::Rendered);
        assert!((first_point_light_y(&engine) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_resize_is_not_a_transition() {
        let mut engine = Engine::new(seeded(), Viewport::default());
        let handle = engine.select_mode(ModeKind::Sphere).unwrap();
        engine.resize(1000.0, 500.0);
        assert_eq!(engine.handle(), Some(handle));
        assert_eq!(engine.state(), MachineState::Running(ModeKind::Sphere));
        let camera = engine.scene().unwrap().camera;
        assert!((camera.aspect - 2.0).abs() < 1e-6);
    }
}
