//! Translation between [`ConfigModel`] and [`WireFrame`].
//!
//! Encode is a total projection: every wire field is produced from the
//! model. Decode is a partial merge: every wire-backed model field is
//! overwritten, everything else (the operational GPS baud rate) keeps its
//! prior value. Neither direction validates ranges; the firmware is the
//! final arbiter of what values mean.

use thiserror::Error;

use crate::frame::{WireFrame, SERVO_COUNT};
use crate::model::{ConfigModel, PidConfig};

/// Wire-schema drift between ground station and firmware. Not recoverable
/// locally; the caller decides whether to drop the frame or the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("wire frame field {field} has {len} elements, schema requires {SERVO_COUNT}")]
    ServoArrayLength { field: &'static str, len: usize },
}

/// Scale a gain to the wire's tenth-unit fixed point. Rounds half away from
/// zero, so 1.25 encodes as 13; finer-than-tenth precision is lost here and
/// that loss is expected, not an error.
fn gain_to_tenths(gain: f64) -> i16 {
    (gain * 10.0).round() as i16
}

fn gain_from_tenths(tenths: i16) -> f64 {
    f64::from(tenths) / 10.0
}

/// Project the full model onto a fresh wire frame.
///
/// Pure function; the model is only read. Fields with no wire counterpart
/// are silently omitted.
pub fn encode(model: &ConfigModel) -> WireFrame {
    WireFrame {
        acc_x_neutral: model.neutral_acc_x,
        acc_y_neutral: model.neutral_acc_y,
        acc_z_neutral: model.neutral_acc_z,
        gyro_x_neutral: model.neutral_gyro_x,
        gyro_y_neutral: model.neutral_gyro_y,
        gyro_z_neutral: model.neutral_gyro_z,
        imu_rotated: model.imu_rotated,
        neutral_pitch: model.neutral_pitch,

        channel_roll: model.channel_roll,
        channel_pitch: model.channel_pitch,
        channel_yaw: model.channel_yaw,
        channel_motor: model.channel_motor,
        channel_ap: model.channel_ap,
        rc_ppm: model.rc_from_ppm,

        control_max_pitch: model.control_max_pitch,
        control_min_pitch: model.control_min_pitch,
        control_max_roll: model.control_max_roll,
        control_mixing: model.control_mixing,
        control_aileron_differential: model.control_aileron_diff,
        control_cruising_speed: model.cruising_speed,
        control_waypoint_radius: model.waypoint_radius,
        control_stabilization_with_altitude_hold: model.stabilization_with_altitude_hold,
        control_altitude_mode: model.altitude_mode,

        telemetry_gyroaccraw: model.telemetry_gyro_acc_raw,
        telemetry_gyroaccproc: model.telemetry_gyro_acc_proc,
        telemetry_ppm: model.telemetry_ppm,
        telemetry_basicgps: model.telemetry_gps_basic,
        telemetry_pressuretemp: model.telemetry_pressure_temp,
        telemetry_attitude: model.telemetry_attitude,
        telemetry_control: model.telemetry_control,

        gps_initial_baudrate: model.gps_initial_baudrate,
        gps_enable_waas: model.gps_enable_waas,

        pid_roll2aileron_p: model.pid_roll_to_aileron.p,
        pid_roll2aileron_i: model.pid_roll_to_aileron.i,
        pid_roll2aileron_d: model.pid_roll_to_aileron.d,
        pid_roll2aileron_imin: model.pid_roll_to_aileron.i_min,
        pid_roll2aileron_imax: model.pid_roll_to_aileron.i_max,
        pid_roll2aileron_dmin: model.pid_roll_to_aileron.d_min,

        pid_pitch2elevator_p: model.pid_pitch_to_elevator.p,
        pid_pitch2elevator_i: model.pid_pitch_to_elevator.i,
        pid_pitch2elevator_d: model.pid_pitch_to_elevator.d,
        pid_pitch2elevator_imin: model.pid_pitch_to_elevator.i_min,
        pid_pitch2elevator_imax: model.pid_pitch_to_elevator.i_max,
        pid_pitch2elevator_dmin: model.pid_pitch_to_elevator.d_min,

        pid_heading2roll_p: model.pid_heading_to_roll.p,
        pid_heading2roll_i: model.pid_heading_to_roll.i,
        pid_heading2roll_d: model.pid_heading_to_roll.d,
        pid_heading2roll_imin: model.pid_heading_to_roll.i_min,
        pid_heading2roll_imax: model.pid_heading_to_roll.i_max,
        pid_heading2roll_dmin: model.pid_heading_to_roll.d_min,

        pid_altitude2pitch_p: model.pid_altitude_to_pitch.p,
        pid_altitude2pitch_i: model.pid_altitude_to_pitch.i,
        pid_altitude2pitch_d: model.pid_altitude_to_pitch.d,
        pid_altitude2pitch_imin: model.pid_altitude_to_pitch.i_min,
        pid_altitude2pitch_imax: model.pid_altitude_to_pitch.i_max,
        pid_altitude2pitch_dmin: model.pid_altitude_to_pitch.d_min,

        servo_reverse: vec![
            model.reverse_servo1,
            model.reverse_servo2,
            model.reverse_servo3,
            model.reverse_servo4,
            model.reverse_servo5,
            model.reverse_servo6,
        ],
        servo_min: model.servo_min.to_vec(),
        servo_max: model.servo_max.to_vec(),
        servo_neutral: model.servo_neutral.to_vec(),
        manual_trim: model.manual_trim,

        auto_throttle_enabled: model.auto_throttle_enabled,
        auto_throttle_min_pct: model.auto_throttle_min_pct,
        auto_throttle_max_pct: model.auto_throttle_max_pct,
        auto_throttle_cruise_pct: model.auto_throttle_cruise_pct,
        auto_throttle_p_gain_10: gain_to_tenths(model.auto_throttle_p_gain),

        osd_bitmask: model.osd_bitmask,
    }
}

/// Merge a received frame onto an existing model.
///
/// Every field the wire schema carries is overwritten; the operational GPS
/// baud rate is deliberately left alone. PID gain sets and servo tables are
/// rebuilt wholesale so no state from a previous snapshot can leak through
/// a shared sub-object.
pub fn decode(frame: &WireFrame, model: &mut ConfigModel) -> Result<(), SchemaError> {
    let servo_reverse = check_six("servo_reverse", &frame.servo_reverse)?;
    let servo_min = check_six("servo_min", &frame.servo_min)?;
    let servo_max = check_six("servo_max", &frame.servo_max)?;
    let servo_neutral = check_six("servo_neutral", &frame.servo_neutral)?;

    model.neutral_acc_x = frame.acc_x_neutral;
    model.neutral_acc_y = frame.acc_y_neutral;
    model.neutral_acc_z = frame.acc_z_neutral;
    model.neutral_gyro_x = frame.gyro_x_neutral;
    model.neutral_gyro_y = frame.gyro_y_neutral;
    model.neutral_gyro_z = frame.gyro_z_neutral;
    model.imu_rotated = frame.imu_rotated;
    model.neutral_pitch = frame.neutral_pitch;

    model.channel_roll = frame.channel_roll;
    model.channel_pitch = frame.channel_pitch;
    model.channel_yaw = frame.channel_yaw;
    model.channel_motor = frame.channel_motor;
    model.channel_ap = frame.channel_ap;
    model.rc_from_ppm = frame.rc_ppm;

    model.control_max_pitch = frame.control_max_pitch;
    model.control_min_pitch = frame.control_min_pitch;
    model.control_max_roll = frame.control_max_roll;
    model.control_mixing = frame.control_mixing;
    model.control_aileron_diff = frame.control_aileron_differential;
    model.cruising_speed = frame.control_cruising_speed;
    model.waypoint_radius = frame.control_waypoint_radius;
    model.stabilization_with_altitude_hold = frame.control_stabilization_with_altitude_hold;
    model.altitude_mode = frame.control_altitude_mode;

    model.telemetry_gyro_acc_raw = frame.telemetry_gyroaccraw;
    model.telemetry_gyro_acc_proc = frame.telemetry_gyroaccproc;
    model.telemetry_ppm = frame.telemetry_ppm;
    model.telemetry_gps_basic = frame.telemetry_basicgps;
    model.telemetry_pressure_temp = frame.telemetry_pressuretemp;
    model.telemetry_attitude = frame.telemetry_attitude;
    model.telemetry_control = frame.telemetry_control;

    model.gps_initial_baudrate = frame.gps_initial_baudrate;
    // gps_operational_baudrate has no wire counterpart: leave as-is.
    model.gps_enable_waas = frame.gps_enable_waas;

    model.pid_roll_to_aileron = PidConfig::new(
        frame.pid_roll2aileron_p,
        frame.pid_roll2aileron_i,
        frame.pid_roll2aileron_d,
        frame.pid_roll2aileron_imin,
        frame.pid_roll2aileron_imax,
        frame.pid_roll2aileron_dmin,
    );
    model.pid_pitch_to_elevator = PidConfig::new(
        frame.pid_pitch2elevator_p,
        frame.pid_pitch2elevator_i,
        frame.pid_pitch2elevator_d,
        frame.pid_pitch2elevator_imin,
        frame.pid_pitch2elevator_imax,
        frame.pid_pitch2elevator_dmin,
    );
    model.pid_heading_to_roll = PidConfig::new(
        frame.pid_heading2roll_p,
        frame.pid_heading2roll_i,
        frame.pid_heading2roll_d,
        frame.pid_heading2roll_imin,
        frame.pid_heading2roll_imax,
        frame.pid_heading2roll_dmin,
    );
    model.pid_altitude_to_pitch = PidConfig::new(
        frame.pid_altitude2pitch_p,
        frame.pid_altitude2pitch_i,
        frame.pid_altitude2pitch_d,
        frame.pid_altitude2pitch_imin,
        frame.pid_altitude2pitch_imax,
        frame.pid_altitude2pitch_dmin,
    );

    model.reverse_servo1 = servo_reverse[0];
    model.reverse_servo2 = servo_reverse[1];
    model.reverse_servo3 = servo_reverse[2];
    model.reverse_servo4 = servo_reverse[3];
    model.reverse_servo5 = servo_reverse[4];
    model.reverse_servo6 = servo_reverse[5];
    model.servo_min = servo_min;
    model.servo_max = servo_max;
    model.servo_neutral = servo_neutral;
    model.manual_trim = frame.manual_trim;

    model.auto_throttle_enabled = frame.auto_throttle_enabled;
    model.auto_throttle_min_pct = frame.auto_throttle_min_pct;
    model.auto_throttle_max_pct = frame.auto_throttle_max_pct;
    model.auto_throttle_cruise_pct = frame.auto_throttle_cruise_pct;
    model.auto_throttle_p_gain = gain_from_tenths(frame.auto_throttle_p_gain_10);

    model.osd_bitmask = frame.osd_bitmask;

    Ok(())
}

fn check_six<T: Copy>(field: &'static str, v: &[T]) -> Result<[T; SERVO_COUNT], SchemaError> {
    <[T; SERVO_COUNT]>::try_from(v)
        .map_err(|_| SchemaError::ServoArrayLength { field, len: v.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuned_model() -> ConfigModel {
        let mut m = ConfigModel::default();
        m.pid_roll_to_aileron = PidConfig::new(0.42, 0.5, 0.01, -1.0, 1.0, -0.2);
        m.pid_altitude_to_pitch = PidConfig::new(0.08, 0.03, 0.0, -0.5, 0.5, 0.0);
        m.reverse_servo1 = true;
        m.reverse_servo4 = true;
        m.servo_min = [1020, 1000, 1010, 1000, 1000, 1100];
        m.servo_neutral = [1500, 1480, 1500, 1520, 1500, 1500];
        m.manual_trim = true;
        m.neutral_acc_x = 31850;
        m.neutral_gyro_z = 31000;
        m.imu_rotated = true;
        m.channel_yaw = 5;
        m.rc_from_ppm = false;
        m.control_max_roll = 0.6;
        m.control_aileron_diff = 30;
        m.cruising_speed = 14.5;
        m.waypoint_radius = 45.0;
        m.stabilization_with_altitude_hold = true;
        m.altitude_mode = 1;
        m.auto_throttle_enabled = true;
        m.auto_throttle_p_gain = 1.3;
        m.telemetry_attitude = 0;
        m.gps_initial_baudrate = 9600;
        m.gps_enable_waas = true;
        m.osd_bitmask = 0x03ff;
        m
    }

    #[test]
    fn round_trip_reproduces_every_wire_backed_field() {
        let original = tuned_model();
        let frame = encode(&original);
        let mut restored = ConfigModel::default();
        // Match the non-wire field so full equality holds.
        restored.gps_operational_baudrate = original.gps_operational_baudrate;
        decode(&frame, &mut restored).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn defaults_round_trip() {
        let original = ConfigModel::default();
        let mut restored = ConfigModel::default();
        decode(&encode(&original), &mut restored).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn gain_encodes_at_tenth_resolution() {
        let mut m = ConfigModel::default();
        m.auto_throttle_p_gain = 2.34;

        let frame = encode(&m);
        assert_eq!(frame.auto_throttle_p_gain_10, 23);

        decode(&frame, &mut m).unwrap();
        assert_eq!(m.auto_throttle_p_gain, 2.3);
    }

    #[test]
    fn gain_rounds_half_away_from_zero() {
        let mut m = ConfigModel::default();
        m.auto_throttle_p_gain = 1.25;

        let frame = encode(&m);
        assert_eq!(frame.auto_throttle_p_gain_10, 13);

        decode(&frame, &mut m).unwrap();
        assert_eq!(m.auto_throttle_p_gain, 1.3);

        m.auto_throttle_p_gain = -1.25;
        assert_eq!(encode(&m).auto_throttle_p_gain_10, -13);
    }

    #[test]
    fn decode_leaves_operational_baudrate_alone() {
        let frame = encode(&ConfigModel::default());

        let mut m = ConfigModel::default();
        m.gps_operational_baudrate = 57600;
        decode(&frame, &mut m).unwrap();
        assert_eq!(m.gps_operational_baudrate, 57600);
    }

    #[test]
    fn decode_rebuilds_servo_tables_without_aliasing() {
        let frame = encode(&tuned_model());

        let mut first = ConfigModel::default();
        decode(&frame, &mut first).unwrap();
        let snapshot = first.clone();

        // Mutating one decoded model must not reach into the snapshot.
        first.servo_min[0] = 900;
        first.pid_roll_to_aileron.p = 99.0;
        assert_eq!(snapshot.servo_min[0], 1020);
        assert_eq!(snapshot.pid_roll_to_aileron.p, 0.42);
    }

    #[test]
    fn decode_rejects_wrong_servo_array_length() {
        let mut frame = encode(&ConfigModel::default());
        frame.servo_min = vec![1000; 5];

        let mut m = ConfigModel::default();
        let err = decode(&frame, &mut m).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ServoArrayLength { field: "servo_min", len: 5 }
        );

        let mut frame = encode(&ConfigModel::default());
        frame.servo_reverse = vec![false; 7];
        assert!(decode(&frame, &mut m).is_err());
    }

    #[test]
    fn reverse_flags_pack_index_aligned() {
        let mut m = ConfigModel::default();
        m.reverse_servo1 = true;
        m.servo_min = [1000; 6];
        m.auto_throttle_p_gain = 1.25;

        let frame = encode(&m);
        assert_eq!(frame.servo_reverse, vec![true, false, false, false, false, false]);
        assert_eq!(frame.servo_min, vec![1000; 6]);
        assert_eq!(frame.auto_throttle_p_gain_10, 13);
    }

    #[test]
    fn codec_passes_out_of_range_values_through() {
        // Garbage in, garbage out: the codec never validates.
        let mut m = ConfigModel::default();
        m.pid_roll_to_aileron.i_min = 5.0; // violates i_min <= i_max
        m.pid_roll_to_aileron.i_max = -5.0;
        m.channel_roll = 200;

        let mut restored = ConfigModel::default();
        decode(&encode(&m), &mut restored).unwrap();
        assert_eq!(restored.pid_roll_to_aileron.i_min, 5.0);
        assert_eq!(restored.pid_roll_to_aileron.i_max, -5.0);
        assert_eq!(restored.channel_roll, 200);
    }
}
