use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

use crate::serial::ConfigLink;

#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub dev: String,
    pub baud: u32,
    pub responded: bool,
    pub elapsed_ms: u64,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct AutodetectResult {
    pub chosen: Option<(String, u32)>,
    pub probes: Vec<ProbeResult>,
}

pub fn default_candidate_devs() -> Vec<String> {
    vec![
        "/dev/ttyUSB0".into(),
        "/dev/ttyUSB1".into(),
        "/dev/ttyACM0".into(),
        "/dev/ttyACM1".into(),
        "/dev/serial0".into(),
    ]
}

pub fn default_candidate_bauds() -> Vec<u32> {
    vec![115200, 57600, 38400]
}

/// Probe candidate device/baud pairs for a flight controller that answers a
/// version request; the first responder wins.
pub async fn autodetect_port(
    candidate_devs: Vec<String>,
    candidate_bauds: Vec<u32>,
    response_timeout: Duration,
) -> Result<AutodetectResult> {
    let mut probes = Vec::new();

    for dev in candidate_devs {
        for baud in &candidate_bauds {
            let start = Instant::now();
            let note;
            let mut responded = false;

            match ConfigLink::open(&dev, *baud, response_timeout) {
                Ok(mut link) => match link.request_version().await {
                    Ok(banner) => {
                        responded = true;
                        note = banner;
                    }
                    Err(e) => {
                        note = format!("no answer: {}", e);
                    }
                },
                Err(e) => {
                    note = format!("open failed: {}", e);
                    warn!("autodetect probe failed dev={} baud={} err={:#}", dev, baud, e);
                }
            }

            let elapsed_ms = start.elapsed().as_millis() as u64;
            if responded {
                info!("autodetect: OK {} @ {} ({})", dev, baud, note.trim());
                probes.push(ProbeResult {
                    dev: dev.clone(),
                    baud: *baud,
                    responded,
                    elapsed_ms,
                    note,
                });
                return Ok(AutodetectResult { chosen: Some((dev, *baud)), probes });
            }

            probes.push(ProbeResult {
                dev: dev.clone(),
                baud: *baud,
                responded,
                elapsed_ms,
                note,
            });
        }
    }

    Ok(AutodetectResult { chosen: None, probes })
}
