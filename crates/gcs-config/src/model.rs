use serde::{Deserialize, Serialize};

use crate::frame::SERVO_COUNT;

/// One control loop's gain set: P/I/D plus integrator and derivative clamps.
///
/// The i_min <= i_max invariant is the editor's responsibility; the codec
/// round-trips whatever values it is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub i_min: f64,
    pub i_max: f64,
    pub d_min: f64,
}

impl PidConfig {
    pub fn new(p: f64, i: f64, d: f64, i_min: f64, i_max: f64, d_min: f64) -> Self {
        Self { p, i, d, i_min, i_max, d_min }
    }
}

/// Every tunable parameter of the autopilot, in engineering units.
///
/// One long-lived instance per editing session. The wire schema carries a
/// strict subset of these fields; `gps_operational_baudrate` lives only here
/// and is never transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigModel {
    // Control loops
    pub pid_roll_to_aileron: PidConfig,
    pub pid_pitch_to_elevator: PidConfig,
    pub pid_heading_to_roll: PidConfig,
    pub pid_altitude_to_pitch: PidConfig,

    // Servo calibration (pulse widths in microseconds)
    pub reverse_servo1: bool,
    pub reverse_servo2: bool,
    pub reverse_servo3: bool,
    pub reverse_servo4: bool,
    pub reverse_servo5: bool,
    pub reverse_servo6: bool,
    pub servo_min: [u16; SERVO_COUNT],
    pub servo_max: [u16; SERVO_COUNT],
    pub servo_neutral: [u16; SERVO_COUNT],
    pub manual_trim: bool,

    // Sensor neutrals (raw ADC counts)
    pub neutral_acc_x: i32,
    pub neutral_acc_y: i32,
    pub neutral_acc_z: i32,
    pub neutral_gyro_x: i32,
    pub neutral_gyro_y: i32,
    pub neutral_gyro_z: i32,
    pub imu_rotated: bool,
    pub neutral_pitch: i32,

    // RC channel mapping
    pub channel_roll: u8,
    pub channel_pitch: u8,
    pub channel_yaw: u8,
    pub channel_motor: u8,
    pub channel_ap: u8,
    pub rc_from_ppm: bool,

    // Control tuning (angles in radians, speed in m/s, radius in meters)
    pub control_max_pitch: f64,
    pub control_min_pitch: f64,
    pub control_max_roll: f64,
    pub control_mixing: u8,
    pub control_aileron_diff: u8,
    pub cruising_speed: f64,
    pub waypoint_radius: f64,
    pub stabilization_with_altitude_hold: bool,
    pub altitude_mode: u8,

    // Auto-throttle
    pub auto_throttle_enabled: bool,
    pub auto_throttle_min_pct: u8,
    pub auto_throttle_max_pct: u8,
    pub auto_throttle_cruise_pct: u8,
    /// Carried on the wire at tenth-unit resolution.
    pub auto_throttle_p_gain: f64,

    // Telemetry stream periods (ticks between messages; 0 disables)
    pub telemetry_gyro_acc_raw: u16,
    pub telemetry_gyro_acc_proc: u16,
    pub telemetry_ppm: u16,
    pub telemetry_gps_basic: u16,
    pub telemetry_pressure_temp: u16,
    pub telemetry_attitude: u16,
    pub telemetry_control: u16,

    // GPS
    pub gps_initial_baudrate: u32,
    /// Not carried by the wire frame; owned entirely by the ground side.
    pub gps_operational_baudrate: u32,
    pub gps_enable_waas: bool,

    pub osd_bitmask: u32,
}

impl Default for ConfigModel {
    /// Factory defaults as shipped by the firmware.
    fn default() -> Self {
        Self {
            pid_roll_to_aileron: PidConfig::new(0.0, 0.5, 0.0, -1.0, 1.0, 0.0),
            pid_pitch_to_elevator: PidConfig::new(0.0, 0.7, 0.0, -1.0, 1.0, 0.0),
            pid_heading_to_roll: PidConfig::new(0.0, 0.7, 0.0, -1.0, 1.0, 0.0),
            pid_altitude_to_pitch: PidConfig::new(0.0, 0.03, 0.0, -1.0, 1.0, 0.0),

            reverse_servo1: false,
            reverse_servo2: false,
            reverse_servo3: false,
            reverse_servo4: false,
            reverse_servo5: false,
            reverse_servo6: false,
            servo_min: [1000; SERVO_COUNT],
            servo_max: [2000; SERVO_COUNT],
            servo_neutral: [1500; SERVO_COUNT],
            manual_trim: false,

            neutral_acc_x: 32000,
            neutral_acc_y: 32000,
            neutral_acc_z: 32000,
            neutral_gyro_x: 27180,
            neutral_gyro_y: 26304,
            neutral_gyro_z: 31850,
            imu_rotated: false,
            neutral_pitch: 0,

            channel_roll: 1,
            channel_pitch: 0,
            channel_yaw: 4,
            channel_motor: 2,
            channel_ap: 3,
            rc_from_ppm: true,

            control_max_pitch: 20.0 / 180.0 * std::f64::consts::PI,
            control_min_pitch: -10.0 / 180.0 * std::f64::consts::PI,
            control_max_roll: 40.0 / 180.0 * std::f64::consts::PI,
            control_mixing: 0,
            control_aileron_diff: 0,
            cruising_speed: 12.0,
            waypoint_radius: 30.0,
            stabilization_with_altitude_hold: false,
            altitude_mode: 0,

            auto_throttle_enabled: false,
            auto_throttle_min_pct: 30,
            auto_throttle_max_pct: 100,
            auto_throttle_cruise_pct: 90,
            auto_throttle_p_gain: 0.8,

            telemetry_gyro_acc_raw: 30,
            telemetry_gyro_acc_proc: 40,
            telemetry_ppm: 60,
            telemetry_gps_basic: 5,
            telemetry_pressure_temp: 50,
            telemetry_attitude: 5,
            telemetry_control: 10,

            gps_initial_baudrate: 38400,
            gps_operational_baudrate: 115200,
            gps_enable_waas: false,

            osd_bitmask: 0,
        }
    }
}
