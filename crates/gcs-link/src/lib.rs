pub mod autodetect;
pub mod serial;
pub mod wire;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// If true, probe candidate serial ports/bauds and pick the first that
    /// answers a version request.
    pub autodetect: bool,

    /// When autodetect=false: fixed port config
    pub serial_dev: Option<String>,
    pub baud: Option<u32>,

    /// Autodetect candidates (paths). Example:
    /// ["/dev/ttyUSB0","/dev/ttyACM0","/dev/serial0"]
    pub candidate_devs: Option<Vec<String>>,

    /// Autodetect candidate baud rates (telemetry modem values).
    pub candidate_bauds: Option<Vec<u32>>,

    /// How long to wait for the controller to answer, per request.
    pub response_timeout_ms: Option<u64>,
}
