//! # PANORAMA Display Server
//!
//! Headless slave process for one screen of the wall: accepts the master,
//! applies camera updates, and answers the swap barrier. Useful for
//! soaking a cluster configuration without GPUs attached.
//!
//! ## Usage
//!
//! ```bash
//! display_server --port 5150 --sync
//! ```

use panorama_cluster::{install_display_server, install_synced_display_server, DisplayServer, SyncedDisplayServer};
use panorama_core::{CameraPose, CooperativeScheduler, HostEngine};
use std::time::{Duration, Instant};

/// Host stub standing in for a render window: counts what it is told.
struct HeadlessHost {
    /// Last view pose applied.
    pose: CameraPose,
    /// Camera updates applied so far.
    updates: u64,
    /// Frames presented so far.
    swaps: u64,
}

impl HostEngine for HeadlessHost {
    fn world_camera_pose(&self) -> CameraPose {
        self.pose
    }

    fn apply_camera_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
        self.updates += 1;
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         PANORAMA DISPLAY SERVER                                  ║");
    println!("║         ONE SCREEN OF THE WALL                                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut port = 5150_u16;
    let mut synced = true;
    let mut duration_secs: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or(5150);
                    i += 1;
                }
            }
            "--sync" => synced = true,
            "--no-sync" => synced = false,
            "--duration" | "-d" => {
                if i + 1 < args.len() {
                    duration_secs = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: display_server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>       TCP port to listen on (default: 5150)");
                println!("      --sync              Swap in lockstep with the master (default)");
                println!("      --no-sync           Free-running swaps, tearing allowed");
                println!("  -d, --duration <SECS>   Run for N seconds then exit");
                println!("  -h, --help              Show this help");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Port:               {port}");
    println!("│ Mode:               {}", if synced { "lockstep" } else { "free-running" });
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let listener = match DisplayServer::<HeadlessHost>::listen(port) {
        Ok(listener) => listener,
        Err(error) => {
            eprintln!("cannot listen on port {port}: {error}");
            std::process::exit(1);
        }
    };
    println!("Waiting for the master on port {port}...");

    let host = HeadlessHost {
        pose: CameraPose::IDENTITY,
        updates: 0,
        swaps: 0,
    };

    let mut scheduler = CooperativeScheduler::new();
    let shared_stats: Box<dyn Fn() -> (u64, u64, CameraPose)> = if synced {
        let server = match SyncedDisplayServer::accept(&listener, host) {
            Ok(server) => server,
            Err(error) => {
                eprintln!("accept failed: {error}");
                std::process::exit(1);
            }
        };
        let shared = install_synced_display_server(server, &mut scheduler);
        Box::new(move || {
            let server = shared.borrow();
            let host = server.host();
            (host.updates, host.swaps, host.pose)
        })
    } else {
        let server = match DisplayServer::accept(&listener, host) {
            Ok(server) => server,
            Err(error) => {
                eprintln!("accept failed: {error}");
                std::process::exit(1);
            }
        };
        let shared = install_display_server(server, &mut scheduler);
        Box::new(move || {
            let server = shared.borrow();
            let host = server.host();
            (host.updates, host.swaps, host.pose)
        })
    };
    println!("Master connected; serving.");
    println!();

    let start = Instant::now();
    let mut last_report = Instant::now();

    while scheduler.run_tick() > 0 {
        if let Some(limit) = duration_secs {
            if start.elapsed().as_secs() >= limit {
                break;
            }
        }

        if last_report.elapsed() >= Duration::from_secs(5) {
            last_report = Instant::now();
            let (updates, swaps, pose) = shared_stats();
            println!("┌─ DISPLAY STATUS ────────────────────────────────────────────────");
            println!("│ Uptime:             {:.1}s", start.elapsed().as_secs_f64());
            println!("│ Camera updates:     {updates}");
            println!("│ Frames presented:   {swaps}");
            println!(
                "│ View pose:          ({:.2}, {:.2}, {:.2})",
                pose.pos.x, pose.pos.y, pose.pos.z
            );
            println!("└──────────────────────────────────────────────────────────────────");
        }

        // The receive pump is non-blocking; don't spin the core.
        std::thread::sleep(Duration::from_millis(1));
    }

    let (updates, swaps, _) = shared_stats();
    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    DISPLAY SHUTDOWN                              ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Camera updates:     {updates:>10}                                   ║");
    println!("║ Frames presented:   {swaps:>10}                                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
}
