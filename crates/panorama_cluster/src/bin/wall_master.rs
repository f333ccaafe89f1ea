//! # PANORAMA Wall Master
//!
//! Headless master driver: loads a cluster configuration, connects the
//! wall, and drives a synthetic camera orbit through the synchronized
//! coordinator. Pairs with `display_server` for soak-testing a cluster
//! layout without a scene.
//!
//! ## Usage
//!
//! ```bash
//! wall_master --config wall.toml --frames 600
//! ```

use panorama_cluster::{install_synced, ClusterConfig, SyncedCoordinator};
use panorama_core::{CameraPose, CooperativeScheduler, HostEngine, Vec3};
use std::cell::Cell;
use std::path::Path;
use std::time::Instant;

/// Host stub for a master without a scene: a camera orbiting the origin
/// and a swap that only counts.
struct OrbitHost {
    /// Orbit radius in world units.
    radius: f64,
    /// Degrees advanced per frame.
    step_degrees: f64,
    /// Frames sampled so far.
    frame: Cell<u64>,
    /// Local swaps performed.
    swaps: u64,
}

impl HostEngine for OrbitHost {
    fn world_camera_pose(&self) -> CameraPose {
        let frame = self.frame.get();
        self.frame.set(frame + 1);
        #[allow(clippy::cast_precision_loss)]
        let heading = (frame as f64 * self.step_degrees) % 360.0;
        let radians = heading.to_radians();
        CameraPose::new(
            Vec3::new(
                self.radius * radians.sin(),
                -self.radius * radians.cos(),
                0.0,
            ),
            Vec3::new(heading, 0.0, 0.0),
        )
    }

    fn apply_camera_pose(&mut self, _pose: CameraPose) {}

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         PANORAMA WALL MASTER                                     ║");
    println!("║         THE LOCKSTEP DRIVER                                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = "wall.toml".to_string();
    let mut frames = 600_u64;
    let mut radius = 10.0_f64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--frames" | "-f" => {
                if i + 1 < args.len() {
                    frames = args[i + 1].parse().unwrap_or(600);
                    i += 1;
                }
            }
            "--radius" | "-r" => {
                if i + 1 < args.len() {
                    radius = args[i + 1].parse().unwrap_or(10.0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: wall_master [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>    Cluster config TOML (default: wall.toml)");
                println!("  -f, --frames <N>       Frames to drive before exiting (default: 600)");
                println!("  -r, --radius <UNITS>   Camera orbit radius (default: 10)");
                println!("  -h, --help             Show this help");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    let config = match ClusterConfig::from_path(Path::new(&config_path)) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("cannot load {config_path}: {error}");
            std::process::exit(1);
        }
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Config:             {config_path}");
    println!("│ Displays:           {}", config.displays.len());
    for display in &config.displays {
        println!(
            "│   '{}' at {}:{} offset ({}, {}, {})",
            display.role,
            display.host,
            display.port,
            display.offset_pos[0],
            display.offset_pos[1],
            display.offset_pos[2]
        );
    }
    println!("│ Frames:             {frames}");
    println!("│ Connect timeout:    {} ms", config.game_server_timeout_ms);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let host = OrbitHost {
        radius,
        step_degrees: 0.5,
        frame: Cell::new(0),
        swaps: 0,
    };

    let coordinator = match SyncedCoordinator::new(&config, host) {
        Ok(coordinator) => coordinator,
        Err(error) => {
            eprintln!("cluster startup failed: {error}");
            std::process::exit(1);
        }
    };

    let mut scheduler = CooperativeScheduler::new();
    let shared = install_synced(coordinator, &mut scheduler);

    println!("Wall connected; driving {frames} frames.");
    let start = Instant::now();

    for frame in 0..frames {
        if scheduler.run_tick() == 0 {
            eprintln!("every display dropped; stopping at frame {frame}");
            break;
        }

        if frame > 0 && frame % 300 == 0 {
            let coordinator = shared.borrow();
            let muted = coordinator
                .displays()
                .iter()
                .filter(|d| d.is_muted())
                .count();
            println!(
                "frame {frame}: {} packets out, {muted} display(s) muted, {:.1} fps",
                coordinator.packets_sent(),
                frame as f64 / start.elapsed().as_secs_f64()
            );
        }
    }

    let coordinator = shared.borrow();
    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    MASTER SHUTDOWN                               ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Frames swapped:     {:>10}                                   ║", coordinator.host().swaps);
    println!("║ Packets out:        {:>10}                                   ║", coordinator.packets_sent());
    println!(
        "║ Displays muted:     {:>10}                                   ║",
        coordinator.displays().iter().filter(|d| d.is_muted()).count()
    );
    println!("╚══════════════════════════════════════════════════════════════════╝");
}
