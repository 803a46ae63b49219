use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gcs_config::{decode, encode, ConfigModel};
use gcs_link::autodetect::{autodetect_port, default_candidate_bauds, default_candidate_devs};
use gcs_link::serial::ConfigLink;
use gcs_link::LinkConfig;

#[derive(Debug, Parser)]
#[command(name = "gcs", version, about = "Ground-station configuration tool for the autopilot")]
struct Cli {
    /// Link settings (TOML)
    #[arg(long, default_value = "gcs.toml")]
    config: String,

    /// Stored configuration model (TOML)
    #[arg(long, default_value = "model.toml")]
    model: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stored configuration model.
    Show,
    /// Encode the stored model and push it to the flight controller.
    Send,
    /// Request the controller's configuration and merge it into the stored model.
    Fetch,
    /// Probe serial ports/bauds for a responding flight controller.
    Probe,
    /// Sanity-check the link settings and model file.
    Doctor,
}

#[derive(Debug, serde::Deserialize)]
struct Settings {
    link: LinkConfig,
}

fn load_settings(path: &str) -> Result<Settings> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read settings {}", path))?;
    Ok(toml::from_str(&s).context("parse settings toml")?)
}

/// Missing model file means factory defaults; a present but unreadable one
/// is an error.
fn load_model(path: &str) -> Result<ConfigModel> {
    if !Path::new(path).exists() {
        info!("model file {} not found, using firmware defaults", path);
        return Ok(ConfigModel::default());
    }
    let s = std::fs::read_to_string(path).with_context(|| format!("read model {}", path))?;
    Ok(toml::from_str(&s).context("parse model toml")?)
}

fn save_model(path: &str, model: &ConfigModel) -> Result<()> {
    let s = toml::to_string_pretty(model).context("serialize model")?;
    std::fs::write(path, s).with_context(|| format!("write model {}", path))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Show => show(&cli.model)?,
        Command::Send => send(&cli.config, &cli.model).await?,
        Command::Fetch => fetch(&cli.config, &cli.model).await?,
        Command::Probe => probe(&cli.config).await?,
        Command::Doctor => doctor(&cli.config, &cli.model)?,
    }
    Ok(())
}

fn show(model_path: &str) -> Result<()> {
    let m = load_model(model_path)?;

    println!("PID roll->aileron    p={} i={} d={} imin={} imax={} dmin={}",
        m.pid_roll_to_aileron.p, m.pid_roll_to_aileron.i, m.pid_roll_to_aileron.d,
        m.pid_roll_to_aileron.i_min, m.pid_roll_to_aileron.i_max, m.pid_roll_to_aileron.d_min);
    println!("PID pitch->elevator  p={} i={} d={} imin={} imax={} dmin={}",
        m.pid_pitch_to_elevator.p, m.pid_pitch_to_elevator.i, m.pid_pitch_to_elevator.d,
        m.pid_pitch_to_elevator.i_min, m.pid_pitch_to_elevator.i_max, m.pid_pitch_to_elevator.d_min);
    println!("PID heading->roll    p={} i={} d={} imin={} imax={} dmin={}",
        m.pid_heading_to_roll.p, m.pid_heading_to_roll.i, m.pid_heading_to_roll.d,
        m.pid_heading_to_roll.i_min, m.pid_heading_to_roll.i_max, m.pid_heading_to_roll.d_min);
    println!("PID altitude->pitch  p={} i={} d={} imin={} imax={} dmin={}",
        m.pid_altitude_to_pitch.p, m.pid_altitude_to_pitch.i, m.pid_altitude_to_pitch.d,
        m.pid_altitude_to_pitch.i_min, m.pid_altitude_to_pitch.i_max, m.pid_altitude_to_pitch.d_min);

    println!("servo reverse = [{}, {}, {}, {}, {}, {}]  manual_trim={}",
        m.reverse_servo1, m.reverse_servo2, m.reverse_servo3,
        m.reverse_servo4, m.reverse_servo5, m.reverse_servo6, m.manual_trim);
    println!("servo min     = {:?}", m.servo_min);
    println!("servo max     = {:?}", m.servo_max);
    println!("servo neutral = {:?}", m.servo_neutral);

    println!("channels roll={} pitch={} yaw={} motor={} ap={} ppm={}",
        m.channel_roll, m.channel_pitch, m.channel_yaw, m.channel_motor, m.channel_ap, m.rc_from_ppm);
    println!("pitch limits [{:.3}, {:.3}] rad, max roll {:.3} rad, mixing={} aileron_diff={}",
        m.control_min_pitch, m.control_max_pitch, m.control_max_roll,
        m.control_mixing, m.control_aileron_diff);
    println!("cruise {} m/s, waypoint radius {} m, alt mode {}, stab+alt hold {}",
        m.cruising_speed, m.waypoint_radius, m.altitude_mode, m.stabilization_with_altitude_hold);
    println!("auto-throttle enabled={} min={}% max={}% cruise={}% p_gain={}",
        m.auto_throttle_enabled, m.auto_throttle_min_pct, m.auto_throttle_max_pct,
        m.auto_throttle_cruise_pct, m.auto_throttle_p_gain);
    println!("telemetry raw={} proc={} ppm={} gps={} press={} att={} ctrl={}",
        m.telemetry_gyro_acc_raw, m.telemetry_gyro_acc_proc, m.telemetry_ppm,
        m.telemetry_gps_basic, m.telemetry_pressure_temp, m.telemetry_attitude,
        m.telemetry_control);
    println!("gps initial={} operational={} waas={}",
        m.gps_initial_baudrate, m.gps_operational_baudrate, m.gps_enable_waas);
    println!("osd bitmask = {:#06x}", m.osd_bitmask);
    Ok(())
}

async fn send(config_path: &str, model_path: &str) -> Result<()> {
    let settings = load_settings(config_path)?;
    let model = load_model(model_path)?;

    let mut link = open_link(&settings.link).await?;
    let frame = encode(&model);
    link.send_config(&frame).await?;
    println!("configuration sent via {}", link.device());
    Ok(())
}

async fn fetch(config_path: &str, model_path: &str) -> Result<()> {
    let settings = load_settings(config_path)?;

    // Merge onto the stored model: fields the wire does not carry (the
    // operational GPS baudrate) keep their on-disk values.
    let mut model = load_model(model_path)?;

    let mut link = open_link(&settings.link).await?;
    let frame = link.request_config().await?;
    decode(&frame, &mut model).context("decode received configuration")?;

    save_model(model_path, &model)?;
    println!("configuration received and written to {}", model_path);
    Ok(())
}

async fn probe(config_path: &str) -> Result<()> {
    let settings = load_settings(config_path)?;
    let res = run_autodetect(&settings.link).await?;

    if let Some((dev, baud)) = &res.chosen {
        println!("CHOSEN: {} @ {}", dev, baud);
    } else {
        println!("CHOSEN: none");
    }
    for p in res.probes {
        println!(
            "probe dev={} baud={} ok={} {}ms note={}",
            p.dev, p.baud, p.responded, p.elapsed_ms, p.note.trim()
        );
    }
    Ok(())
}

fn doctor(config_path: &str, model_path: &str) -> Result<()> {
    let settings = load_settings(config_path)?;
    let link = &settings.link;

    if link.autodetect {
        let bauds = link.candidate_bauds.clone().unwrap_or_else(default_candidate_bauds);
        anyhow::ensure!(!bauds.is_empty(), "link.candidate_bauds empty");
        info!("doctor: autodetect enabled (OK)");
    } else {
        anyhow::ensure!(
            link.serial_dev.as_ref().map(|s| !s.is_empty()).unwrap_or(false),
            "link.serial_dev missing"
        );
        anyhow::ensure!(link.baud.unwrap_or(0) > 0, "link.baud invalid");
    }

    match load_model(model_path) {
        Ok(m) => {
            if m.pid_roll_to_aileron.i_min > m.pid_roll_to_aileron.i_max {
                warn!("doctor: roll PID has imin > imax");
            }
            info!("doctor: model OK");
        }
        Err(e) => warn!("doctor: model unreadable: {:#}", e),
    }

    info!("doctor: OK");
    Ok(())
}

async fn open_link(cfg: &LinkConfig) -> Result<ConfigLink> {
    let timeout = Duration::from_millis(cfg.response_timeout_ms.unwrap_or(1500));
    let (dev, baud) = resolve_port(cfg).await?;
    ConfigLink::open(&dev, baud, timeout)
}

async fn resolve_port(cfg: &LinkConfig) -> Result<(String, u32)> {
    if cfg.autodetect {
        let res = run_autodetect(cfg).await?;
        if let Some((dev, baud)) = res.chosen {
            return Ok((dev, baud));
        }
        anyhow::bail!("autodetect failed: no controller answered");
    }
    let dev = cfg.serial_dev.clone().context("link.serial_dev missing (autodetect=false)")?;
    let baud = cfg.baud.context("link.baud missing (autodetect=false)")?;
    Ok((dev, baud))
}

async fn run_autodetect(cfg: &LinkConfig) -> Result<gcs_link::autodetect::AutodetectResult> {
    let devs = cfg.candidate_devs.clone().unwrap_or_else(default_candidate_devs);
    let bauds = cfg.candidate_bauds.clone().unwrap_or_else(default_candidate_bauds);
    let timeout = Duration::from_millis(cfg.response_timeout_ms.unwrap_or(1500));
    autodetect_port(devs, bauds, timeout).await
}
