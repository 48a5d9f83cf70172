//! Experiment driver: owns the particles, the density volume and the
//! generator, and sequences one simulation step per frame.

use glam::{UVec3, Vec3};
use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::DEFAULT_VOLUME_DIM;
use crate::grid::NeighborGrid;
use crate::integrator::{Integrator, SimBounds};
use crate::particle::{GpuParticle, Particle, Particles};
use crate::settings::{FluidSettings, SeedMode, SphParams};
use crate::solver::SphSolver;
use crate::stats::FluidStats;
use crate::volume::{DensityVolume, VolumeConfig, VolumeSnapshot};

/// Single-owner simulation state.
pub struct FluidExperiment {
    settings: FluidSettings,
    params: SphParams,
    volume_config: VolumeConfig,
    volume: DensityVolume,
    particles: Particles,
    solver: SphSolver,
    integrator: Integrator,
    stats: FluidStats,
    rng: ChaCha8Rng,
    steps: u64,
}

impl Default for FluidExperiment {
    fn default() -> Self {
        Self::new(FluidSettings::default())
    }
}

impl FluidExperiment {
    /// Build the volume, seed particles and compute the initial density and stats.
    pub fn new(settings: FluidSettings) -> Self {
        let settings = sanitize_with_warning(&settings);
        let params = SphParams::default();
        let volume_config = VolumeConfig::new(
            UVec3::splat(DEFAULT_VOLUME_DIM),
            settings.voxel_size,
            Vec3::ZERO,
        );

        let mut experiment = Self {
            settings,
            params,
            volume_config,
            volume: DensityVolume::default(),
            particles: Particles::with_capacity(settings.particle_count),
            solver: SphSolver::new(params.stiffness),
            integrator: Integrator::new(settings.gravity_y, params),
            stats: FluidStats::default(),
            rng: make_rng(settings.seed),
            steps: 0,
        };
        experiment.rebuild_volume();
        experiment.reseed_particles();
        experiment.resplat_density();
        experiment.compute_stats();
        experiment
    }

    /// Apply new settings, refreshing only what they invalidate.
    ///
    /// - voxel size changed: volume rebuilt, particles reseeded
    /// - particle count changed: particles reseeded
    /// - kernel radius changed alone: density re-splatted
    /// - seed changed: generator recreated (no reseed)
    ///
    /// Unchanged settings leave particles untouched.
    pub fn configure(&mut self, new_settings: FluidSettings) {
        let new_settings = sanitize_with_warning(&new_settings);
        let old = self.settings;

        let volume_changed = new_settings.voxel_size != old.voxel_size;
        let count_changed = new_settings.particle_count != old.particle_count;
        let kernel_changed = new_settings.kernel_radius != old.kernel_radius;
        let seed_changed = new_settings.seed != old.seed;

        self.settings = new_settings;
        self.integrator.gravity.y = new_settings.gravity_y;

        if seed_changed {
            debug!("configure: seed {:?} -> {:?}", old.seed, new_settings.seed);
            self.rng = make_rng(new_settings.seed);
        }

        if volume_changed {
            debug!(
                "configure: voxel size {} -> {}, rebuilding volume",
                old.voxel_size, new_settings.voxel_size
            );
            self.volume_config.voxel_size = new_settings.voxel_size;
            self.rebuild_volume();
        }

        if volume_changed || count_changed {
            self.reseed_particles();
            self.resplat_density();
            self.compute_stats();
        } else if kernel_changed {
            debug!(
                "configure: kernel radius {} -> {}, re-splatting",
                old.kernel_radius, new_settings.kernel_radius
            );
            self.resplat_density();
            self.compute_stats();
        }
    }

    /// Reseed particles without touching settings.
    pub fn reset(&mut self) {
        self.reseed_particles();
        self.resplat_density();
        self.compute_stats();
        self.steps = 0;
    }

    /// Advance by `dt` unless paused. Non-finite or non-positive `dt` is ignored.
    pub fn update(&mut self, dt: f32) {
        if self.settings.paused {
            return;
        }
        if !dt.is_finite() || dt <= 0.0 {
            trace!("update: ignoring dt = {}", dt);
            return;
        }
        self.step(dt);
    }

    /// Run one full step regardless of the paused flag.
    pub fn step(&mut self, dt: f32) {
        self.integrate_particles(dt);
        self.resplat_density();
        self.compute_stats();
        self.steps += 1;

        trace!(
            "step {}: rest density {:.3}, max density {:.3}, max speed {:.3}, avg height {:.3}",
            self.steps,
            self.solver.rest_density(),
            self.stats.max_density,
            self.stats.max_speed,
            self.stats.avg_height
        );
    }

    /// Replace the particle set (e.g. a hand-built layout) and refresh density and stats.
    pub fn set_particles(&mut self, particles: Vec<Particle>) {
        self.particles.list = particles;
        self.resplat_density();
        self.compute_stats();
    }

    /// Replace solver and integrator tunables.
    pub fn set_params(&mut self, params: SphParams) {
        let params = params.sanitized();
        self.params = params;
        self.solver.stiffness = params.stiffness;
        self.integrator.params = params;
    }

    pub fn settings(&self) -> &FluidSettings {
        &self.settings
    }

    pub fn params(&self) -> &SphParams {
        &self.params
    }

    pub fn stats(&self) -> &FluidStats {
        &self.stats
    }

    pub fn volume(&self) -> &DensityVolume {
        &self.volume
    }

    pub fn volume_config(&self) -> &VolumeConfig {
        &self.volume_config
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    /// Densities and pressures from the last step.
    pub fn solver(&self) -> &SphSolver {
        &self.solver
    }

    /// Steps taken since construction or the last `reset`.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// World-space size of the volume: `dims * voxel_size`.
    pub fn volume_extent(&self) -> Vec3 {
        self.volume_config.extent()
    }

    /// Box particles are confined to.
    pub fn bounds(&self) -> SimBounds {
        SimBounds::new(
            self.volume_config.origin,
            self.volume_extent(),
            self.settings.kernel_radius,
        )
    }

    pub fn snapshot(&self) -> VolumeSnapshot<'_> {
        self.volume.snapshot()
    }

    pub fn gpu_particles(&self) -> Vec<GpuParticle> {
        self.particles.to_gpu()
    }

    fn rebuild_volume(&mut self) {
        self.volume.resize(self.volume_config);
        self.volume_config = *self.volume.config();
        debug!(
            "volume rebuilt: {:?} voxels of {}",
            self.volume_config.dims, self.volume_config.voxel_size
        );
    }

    fn reseed_particles(&mut self) {
        let ext = self.volume_extent();
        let origin = self.volume_config.origin;
        let radius = self.settings.kernel_radius;

        self.particles.clear();
        for _ in 0..self.settings.particle_count {
            let position = origin
                + Vec3::new(
                    self.rng.gen_range(0.05 * ext.x..0.95 * ext.x),
                    self.rng.gen_range(0.2 * ext.y..0.9 * ext.y),
                    self.rng.gen_range(0.05 * ext.z..0.95 * ext.z),
                );
            self.particles.spawn_at(position, radius);
        }
        debug!("reseeded {} particles", self.particles.len());
    }

    fn integrate_particles(&mut self, dt: f32) {
        let h = self.settings.kernel_radius;
        let bounds = self.bounds();
        let origin = self.volume_config.origin;
        let extent = self.volume_extent();

        let grid = NeighborGrid::build(&self.particles.list, origin, extent, h);
        self.solver.solve(&grid, h);
        self.integrator.accumulate_forces(&grid, &self.solver, h);
        self.integrator.advance(&mut self.particles.list, dt, &bounds);
    }

    fn resplat_density(&mut self) {
        self.volume.clear();
        self.volume
            .splat_particles(&self.particles.list, self.settings.kernel_radius);
    }

    fn compute_stats(&mut self) {
        self.stats = FluidStats::compute(self.volume.density(), &self.particles.list);
    }
}

fn make_rng(seed: SeedMode) -> ChaCha8Rng {
    match seed {
        SeedMode::Fixed(seed) => ChaCha8Rng::seed_from_u64(seed),
        SeedMode::Entropy => ChaCha8Rng::from_entropy(),
    }
}

fn sanitize_with_warning(settings: &FluidSettings) -> FluidSettings {
    let sanitized = settings.sanitized();
    if sanitized != *settings {
        warn!("settings out of range, using {:?} (requested {:?})", sanitized, settings);
    }
    sanitized
}
