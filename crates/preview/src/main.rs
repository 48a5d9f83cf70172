//! Headless SPH preview.
//!
//! Runs the fluid experiment for a fixed number of frames, periodically
//! ray marches the density volume into a PPM image and logs statistics.
//!
//! Usage:
//!   sph-preview [config.json]
//!   sph-preview --write-default <config.json>

mod config;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use log::{info, warn};
use sph3d::{render_frame, FluidExperiment};

use config::PreviewConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--write-default") {
        let path = args.get(pos + 1).ok_or("--write-default needs a path")?;
        PreviewConfig::default().save_json(Path::new(path))?;
        info!("wrote default config to {}", path);
        return Ok(());
    }

    let config = match args.get(1) {
        Some(path) => {
            info!("loading config from {}", path);
            PreviewConfig::load_json(Path::new(path))?
        }
        None => PreviewConfig::default(),
    };

    run(&config)
}

fn run(config: &PreviewConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut experiment = FluidExperiment::new(config.settings);
    experiment.set_params(config.params);
    let camera = config.camera_for(experiment.volume_extent());

    if config.render_every > 0 {
        std::fs::create_dir_all(&config.output_dir)?;
    }
    info!(
        "simulating {} particles for {} frames (volume {:?} x {})",
        experiment.particles().len(),
        config.frames,
        experiment.volume_config().dims,
        experiment.volume_config().voxel_size
    );

    let start = Instant::now();
    for frame in 1..=config.frames {
        experiment.update(config.dt);

        if config.render_every > 0 && frame % config.render_every == 0 {
            let stats = experiment.stats();
            info!(
                "frame {}: max density {:.2}, avg density {:.4}, max speed {:.3}, avg speed {:.3}, avg height {:.3}",
                frame, stats.max_density, stats.avg_density, stats.max_speed, stats.avg_speed, stats.avg_height
            );

            let image = render_frame(
                experiment.volume(),
                &camera,
                &config.raymarch,
                config.width,
                config.height,
            );
            let path = config.output_dir.join(format!("frame_{:05}.ppm", frame));
            image.write_ppm(BufWriter::new(File::create(&path)?), config.background)?;
            info!("wrote {}", path.display());
        }
    }

    let elapsed = start.elapsed().as_secs_f32();
    if config.frames > 0 {
        info!(
            "done: {} frames in {:.2}s ({:.1} ms/frame)",
            config.frames,
            elapsed,
            1000.0 * elapsed / config.frames as f32
        );
    } else {
        warn!("no frames requested");
    }
    Ok(())
}
