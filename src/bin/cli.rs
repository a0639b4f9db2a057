use crabsnap::testing::{SyntheticCamera, SyntheticDevices};
use crabsnap::{CameraSession, CrabSnapConfig, FacingMode};
use std::env;
use std::sync::Arc;

/// Drives a session against synthetic cameras.
///
/// Usage: crabsnap-cli [--cameras front,back] [--config <path>] [--toggle]
///                     [--zoom <value>] [--json]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    crabsnap::init_logging();

    let args: Vec<String> = env::args().collect();
    let mut cameras = vec![FacingMode::Front, FacingMode::Back];
    let mut config_path = None;
    let mut toggle = false;
    let mut zoom = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--cameras" => {
                i += 1;
                cameras = value(&args, i)?
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<FacingMode>)
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "--config" => {
                i += 1;
                config_path = Some(value(&args, i)?.to_string());
            }
            "--zoom" => {
                i += 1;
                zoom = Some(value(&args, i)?.parse::<f64>()?);
            }
            "--toggle" => toggle = true,
            "--json" => json = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => CrabSnapConfig::load_from_file(path)?,
        None => CrabSnapConfig::default(),
    };

    let devices = SyntheticDevices::new();
    for facing in cameras {
        devices.add_camera(
            SyntheticCamera::new(facing)
                .with_resolution(320, 240)
                .with_zoom(1.0, 5.0, 0.5),
        );
    }

    let session = CameraSession::new(Arc::new(devices), config);
    let facing = session.initialize().await?;
    println!("Opened {} camera", facing);

    if toggle {
        if session.toggle_facing_mode().await? {
            println!("Switched camera");
        } else {
            println!("Only one camera available, toggle ignored");
        }
    }

    if let Some(value) = zoom {
        let applied = session.set_zoom(value).await?;
        println!("Zoom set to {}", applied);
    }

    let photo = session.capture_photo().await?;
    println!(
        "Captured {}x{} {} ({} bytes)",
        photo.width,
        photo.height,
        photo.format.mime_type(),
        photo.size_bytes()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    }

    session.shutdown().await;
    Ok(())
}

fn value(args: &[String], i: usize) -> Result<&str, Box<dyn std::error::Error>> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {}", args[i - 1]).into())
}
