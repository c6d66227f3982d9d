//! Observers that receive the particle state once per step.
//!
//! A sink never feeds back into the simulation; it only reads what it is given.

use std::thread;
use std::time::{Duration, Instant};

use crate::core::vector::Vec3;

/// Static scene description, sent once before the first step.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Full edge length of the cubic box centred on the origin.
    pub box_size: f64,
    /// Radius of the confinement sphere, when confinement is enabled.
    pub confinement_radius: Option<f64>,
    pub num_particles: usize,
}

/// What a renderer needs to draw one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub position: Vec3,
    pub core_radius: f64,
    pub shell_radius: f64,
    /// Opaque cluster label; equal labels mean the bodies are stuck together.
    pub cluster: usize,
}

pub trait FrameSink {
    /// Called once before stepping starts.
    fn setup(&mut self, _scene: &Scene) {}

    /// Called after every step with the updated bodies.
    fn frame(&mut self, step: u64, bodies: &[BodyView]);

    /// Frame pacing hook between steps. No-op unless the sink throttles.
    fn pace(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn frame(&mut self, _step: u64, _bodies: &[BodyView]) {}
}

/// Emits every frame at `trace` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn setup(&mut self, scene: &Scene) {
        log::debug!(
            "scene: box {} confinement {:?} particles {}",
            scene.box_size,
            scene.confinement_radius,
            scene.num_particles
        );
    }

    fn frame(&mut self, step: u64, bodies: &[BodyView]) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        for (i, b) in bodies.iter().enumerate() {
            log::trace!(
                "step {step} body {i} pos [{:.4}, {:.4}, {:.4}] cluster {}",
                b.position[0],
                b.position[1],
                b.position[2],
                b.cluster
            );
        }
    }
}

/// Wraps another sink and sleeps so that frames arrive no faster than `fps`.
#[derive(Debug)]
pub struct PacedSink<S> {
    inner: S,
    period: Duration,
    last: Option<Instant>,
}

impl<S: FrameSink> PacedSink<S> {
    /// `fps == 0` disables pacing.
    pub fn new(inner: S, fps: u32) -> Self {
        let period = if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(fps))
        };
        Self {
            inner,
            period,
            last: None,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSink> FrameSink for PacedSink<S> {
    fn setup(&mut self, scene: &Scene) {
        self.inner.setup(scene);
    }

    fn frame(&mut self, step: u64, bodies: &[BodyView]) {
        self.inner.frame(step, bodies);
    }

    fn pace(&mut self) {
        self.inner.pace();
        if self.period.is_zero() {
            return;
        }
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.period {
                thread::sleep(self.period - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub scene: Option<Scene>,
    pub frames: Vec<(u64, Vec<BodyView>)>,
}

impl FrameSink for RecordingSink {
    fn setup(&mut self, scene: &Scene) {
        self.scene = Some(scene.clone());
    }

    fn frame(&mut self, step: u64, bodies: &[BodyView]) {
        self.frames.push((step, bodies.to_vec()));
    }
}
