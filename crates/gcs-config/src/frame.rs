/// Number of servo outputs the firmware drives. The wire schema hardcodes
/// this; any received frame whose servo tables differ in length is a schema
/// mismatch, not something to truncate or pad around.
pub const SERVO_COUNT: usize = 6;

/// The flat configuration record exchanged with the flight controller.
///
/// Field set and order mirror the firmware's on-wire schema exactly and are
/// a compatibility contract with deployed autopilots: reordering or resizing
/// any field breaks interoperability. One frame is built fresh per encode or
/// per received message and is never kept beyond that call.
///
/// The servo tables are `Vec`s rather than fixed arrays on purpose: a frame
/// parsed off the link may carry a drifted element count, and decode must be
/// able to observe and reject that instead of having the type system paper
/// over it.
#[derive(Debug, Clone, PartialEq)]
pub struct WireFrame {
    // Sensor neutrals
    pub acc_x_neutral: i32,
    pub acc_y_neutral: i32,
    pub acc_z_neutral: i32,
    pub gyro_x_neutral: i32,
    pub gyro_y_neutral: i32,
    pub gyro_z_neutral: i32,
    pub imu_rotated: bool,
    pub neutral_pitch: i32,

    // RC channels
    pub channel_roll: u8,
    pub channel_pitch: u8,
    pub channel_yaw: u8,
    pub channel_motor: u8,
    pub channel_ap: u8,
    pub rc_ppm: bool,

    // Control
    pub control_max_pitch: f64,
    pub control_min_pitch: f64,
    pub control_max_roll: f64,
    pub control_mixing: u8,
    pub control_aileron_differential: u8,
    pub control_cruising_speed: f64,
    pub control_waypoint_radius: f64,
    pub control_stabilization_with_altitude_hold: bool,
    pub control_altitude_mode: u8,

    // Telemetry stream periods
    pub telemetry_gyroaccraw: u16,
    pub telemetry_gyroaccproc: u16,
    pub telemetry_ppm: u16,
    pub telemetry_basicgps: u16,
    pub telemetry_pressuretemp: u16,
    pub telemetry_attitude: u16,
    pub telemetry_control: u16,

    // GPS (no operational baudrate on the wire)
    pub gps_initial_baudrate: u32,
    pub gps_enable_waas: bool,

    // PID gain sets, six scalars each
    pub pid_roll2aileron_p: f64,
    pub pid_roll2aileron_i: f64,
    pub pid_roll2aileron_d: f64,
    pub pid_roll2aileron_imin: f64,
    pub pid_roll2aileron_imax: f64,
    pub pid_roll2aileron_dmin: f64,

    pub pid_pitch2elevator_p: f64,
    pub pid_pitch2elevator_i: f64,
    pub pid_pitch2elevator_d: f64,
    pub pid_pitch2elevator_imin: f64,
    pub pid_pitch2elevator_imax: f64,
    pub pid_pitch2elevator_dmin: f64,

    pub pid_heading2roll_p: f64,
    pub pid_heading2roll_i: f64,
    pub pid_heading2roll_d: f64,
    pub pid_heading2roll_imin: f64,
    pub pid_heading2roll_imax: f64,
    pub pid_heading2roll_dmin: f64,

    pub pid_altitude2pitch_p: f64,
    pub pid_altitude2pitch_i: f64,
    pub pid_altitude2pitch_d: f64,
    pub pid_altitude2pitch_imin: f64,
    pub pid_altitude2pitch_imax: f64,
    pub pid_altitude2pitch_dmin: f64,

    // Servo calibration, index-aligned to outputs 0..5
    pub servo_reverse: Vec<bool>,
    pub servo_min: Vec<u16>,
    pub servo_max: Vec<u16>,
    pub servo_neutral: Vec<u16>,
    pub manual_trim: bool,

    // Auto-throttle; p gain is fixed-point, tenths of a unit
    pub auto_throttle_enabled: bool,
    pub auto_throttle_min_pct: u8,
    pub auto_throttle_max_pct: u8,
    pub auto_throttle_cruise_pct: u8,
    pub auto_throttle_p_gain_10: i16,

    pub osd_bitmask: u32,
}
