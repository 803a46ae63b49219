//! Byte layout of the configuration record and the outer message framing.
//!
//! Payload layout is fixed-order little-endian, one scalar after another,
//! `PAYLOAD_LEN` bytes total. The outer framing is an 8-byte header (magic,
//! message type, payload length) followed by the payload and a trailing
//! additive checksum. Both sides of the contract are pinned by deployed
//! firmware; nothing here may be reordered or resized.

use bytes::{Buf, BufMut};
use thiserror::Error;

use gcs_config::{WireFrame, SERVO_COUNT};

/// "GC"
pub const WIRE_MAGIC: u16 = 0x4743;

pub const HEADER_LEN: usize = 8;
pub const CHECKSUM_LEN: usize = 2;

/// Serialized size of a full configuration record.
pub const PAYLOAD_LEN: usize = 343;

/// Upper bound on any payload we will buffer from the link.
pub const MAX_PAYLOAD: usize = 4096;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    /// Ground asks the controller for its current configuration.
    RequestConfig = 0x01,
    /// Controller answers with a configuration record.
    ConfigData = 0x02,
    /// Ground pushes a configuration record to the controller.
    SetConfig = 0x03,
    /// Ground asks for the firmware version banner.
    RequestVersion = 0x04,
    /// Controller answers with a UTF-8 version banner.
    Version = 0x05,
}

impl MsgType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(MsgType::RequestConfig),
            0x02 => Some(MsgType::ConfigData),
            0x03 => Some(MsgType::SetConfig),
            0x04 => Some(MsgType::RequestVersion),
            0x05 => Some(MsgType::Version),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("bad magic {0:#06x}")]
    BadMagic(u16),
    #[error("unknown message type {0:#04x}")]
    UnknownType(u8),
    #[error("message truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("payload length {0} exceeds limit")]
    Oversize(usize),
    #[error("checksum mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    BadChecksum { expected: u16, computed: u16 },
    #[error("config payload is {0} bytes, schema requires {PAYLOAD_LEN}")]
    BadPayloadLength(usize),
    #[error("frame field {field} has {len} elements, schema requires {SERVO_COUNT}")]
    ServoCount { field: &'static str, len: usize },
}

/// Wrapping sum of all payload bytes.
pub fn checksum(payload: &[u8]) -> u16 {
    payload.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Serialize a configuration record into its wire bytes.
pub fn encode_frame(f: &WireFrame) -> Result<Vec<u8>, WireError> {
    check_count("servo_reverse", f.servo_reverse.len())?;
    check_count("servo_min", f.servo_min.len())?;
    check_count("servo_max", f.servo_max.len())?;
    check_count("servo_neutral", f.servo_neutral.len())?;

    let mut buf = Vec::with_capacity(PAYLOAD_LEN);

    buf.put_i32_le(f.acc_x_neutral);
    buf.put_i32_le(f.acc_y_neutral);
    buf.put_i32_le(f.acc_z_neutral);
    buf.put_i32_le(f.gyro_x_neutral);
    buf.put_i32_le(f.gyro_y_neutral);
    buf.put_i32_le(f.gyro_z_neutral);
    buf.put_u8(f.imu_rotated as u8);
    buf.put_i32_le(f.neutral_pitch);

    buf.put_u8(f.channel_roll);
    buf.put_u8(f.channel_pitch);
    buf.put_u8(f.channel_yaw);
    buf.put_u8(f.channel_motor);
    buf.put_u8(f.channel_ap);
    buf.put_u8(f.rc_ppm as u8);

    buf.put_f64_le(f.control_max_pitch);
    buf.put_f64_le(f.control_min_pitch);
    buf.put_f64_le(f.control_max_roll);
    buf.put_u8(f.control_mixing);
    buf.put_u8(f.control_aileron_differential);
    buf.put_f64_le(f.control_cruising_speed);
    buf.put_f64_le(f.control_waypoint_radius);
    buf.put_u8(f.control_stabilization_with_altitude_hold as u8);
    buf.put_u8(f.control_altitude_mode);

    buf.put_u16_le(f.telemetry_gyroaccraw);
    buf.put_u16_le(f.telemetry_gyroaccproc);
    buf.put_u16_le(f.telemetry_ppm);
    buf.put_u16_le(f.telemetry_basicgps);
    buf.put_u16_le(f.telemetry_pressuretemp);
    buf.put_u16_le(f.telemetry_attitude);
    buf.put_u16_le(f.telemetry_control);

    buf.put_u32_le(f.gps_initial_baudrate);
    buf.put_u8(f.gps_enable_waas as u8);

    for v in [
        f.pid_roll2aileron_p,
        f.pid_roll2aileron_i,
        f.pid_roll2aileron_d,
        f.pid_roll2aileron_imin,
        f.pid_roll2aileron_imax,
        f.pid_roll2aileron_dmin,
        f.pid_pitch2elevator_p,
        f.pid_pitch2elevator_i,
        f.pid_pitch2elevator_d,
        f.pid_pitch2elevator_imin,
        f.pid_pitch2elevator_imax,
        f.pid_pitch2elevator_dmin,
        f.pid_heading2roll_p,
        f.pid_heading2roll_i,
        f.pid_heading2roll_d,
        f.pid_heading2roll_imin,
        f.pid_heading2roll_imax,
        f.pid_heading2roll_dmin,
        f.pid_altitude2pitch_p,
        f.pid_altitude2pitch_i,
        f.pid_altitude2pitch_d,
        f.pid_altitude2pitch_imin,
        f.pid_altitude2pitch_imax,
        f.pid_altitude2pitch_dmin,
    ] {
        buf.put_f64_le(v);
    }

    for r in &f.servo_reverse {
        buf.put_u8(*r as u8);
    }
    for v in &f.servo_min {
        buf.put_u16_le(*v);
    }
    for v in &f.servo_max {
        buf.put_u16_le(*v);
    }
    for v in &f.servo_neutral {
        buf.put_u16_le(*v);
    }
    buf.put_u8(f.manual_trim as u8);

    buf.put_u8(f.auto_throttle_enabled as u8);
    buf.put_u8(f.auto_throttle_min_pct);
    buf.put_u8(f.auto_throttle_max_pct);
    buf.put_u8(f.auto_throttle_cruise_pct);
    buf.put_i16_le(f.auto_throttle_p_gain_10);

    buf.put_u32_le(f.osd_bitmask);

    debug_assert_eq!(buf.len(), PAYLOAD_LEN);
    Ok(buf)
}

/// Parse a configuration record out of exactly `PAYLOAD_LEN` wire bytes.
pub fn decode_frame(payload: &[u8]) -> Result<WireFrame, WireError> {
    if payload.len() != PAYLOAD_LEN {
        return Err(WireError::BadPayloadLength(payload.len()));
    }
    let mut buf = payload;

    Ok(WireFrame {
        acc_x_neutral: buf.get_i32_le(),
        acc_y_neutral: buf.get_i32_le(),
        acc_z_neutral: buf.get_i32_le(),
        gyro_x_neutral: buf.get_i32_le(),
        gyro_y_neutral: buf.get_i32_le(),
        gyro_z_neutral: buf.get_i32_le(),
        imu_rotated: buf.get_u8() != 0,
        neutral_pitch: buf.get_i32_le(),

        channel_roll: buf.get_u8(),
        channel_pitch: buf.get_u8(),
        channel_yaw: buf.get_u8(),
        channel_motor: buf.get_u8(),
        channel_ap: buf.get_u8(),
        rc_ppm: buf.get_u8() != 0,

        control_max_pitch: buf.get_f64_le(),
        control_min_pitch: buf.get_f64_le(),
        control_max_roll: buf.get_f64_le(),
        control_mixing: buf.get_u8(),
        control_aileron_differential: buf.get_u8(),
        control_cruising_speed: buf.get_f64_le(),
        control_waypoint_radius: buf.get_f64_le(),
        control_stabilization_with_altitude_hold: buf.get_u8() != 0,
        control_altitude_mode: buf.get_u8(),

        telemetry_gyroaccraw: buf.get_u16_le(),
        telemetry_gyroaccproc: buf.get_u16_le(),
        telemetry_ppm: buf.get_u16_le(),
        telemetry_basicgps: buf.get_u16_le(),
        telemetry_pressuretemp: buf.get_u16_le(),
        telemetry_attitude: buf.get_u16_le(),
        telemetry_control: buf.get_u16_le(),

        gps_initial_baudrate: buf.get_u32_le(),
        gps_enable_waas: buf.get_u8() != 0,

        pid_roll2aileron_p: buf.get_f64_le(),
        pid_roll2aileron_i: buf.get_f64_le(),
        pid_roll2aileron_d: buf.get_f64_le(),
        pid_roll2aileron_imin: buf.get_f64_le(),
        pid_roll2aileron_imax: buf.get_f64_le(),
        pid_roll2aileron_dmin: buf.get_f64_le(),

        pid_pitch2elevator_p: buf.get_f64_le(),
        pid_pitch2elevator_i: buf.get_f64_le(),
        pid_pitch2elevator_d: buf.get_f64_le(),
        pid_pitch2elevator_imin: buf.get_f64_le(),
        pid_pitch2elevator_imax: buf.get_f64_le(),
        pid_pitch2elevator_dmin: buf.get_f64_le(),

        pid_heading2roll_p: buf.get_f64_le(),
        pid_heading2roll_i: buf.get_f64_le(),
        pid_heading2roll_d: buf.get_f64_le(),
        pid_heading2roll_imin: buf.get_f64_le(),
        pid_heading2roll_imax: buf.get_f64_le(),
        pid_heading2roll_dmin: buf.get_f64_le(),

        pid_altitude2pitch_p: buf.get_f64_le(),
        pid_altitude2pitch_i: buf.get_f64_le(),
        pid_altitude2pitch_d: buf.get_f64_le(),
        pid_altitude2pitch_imin: buf.get_f64_le(),
        pid_altitude2pitch_imax: buf.get_f64_le(),
        pid_altitude2pitch_dmin: buf.get_f64_le(),

        servo_reverse: (0..SERVO_COUNT).map(|_| buf.get_u8() != 0).collect(),
        servo_min: (0..SERVO_COUNT).map(|_| buf.get_u16_le()).collect(),
        servo_max: (0..SERVO_COUNT).map(|_| buf.get_u16_le()).collect(),
        servo_neutral: (0..SERVO_COUNT).map(|_| buf.get_u16_le()).collect(),
        manual_trim: buf.get_u8() != 0,

        auto_throttle_enabled: buf.get_u8() != 0,
        auto_throttle_min_pct: buf.get_u8(),
        auto_throttle_max_pct: buf.get_u8(),
        auto_throttle_cruise_pct: buf.get_u8(),
        auto_throttle_p_gain_10: buf.get_i16_le(),

        osd_bitmask: buf.get_u32_le(),
    })
}

/// Build a complete link message: header, payload, trailing checksum.
pub fn frame_message(msg: MsgType, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    buf.put_u16_le(WIRE_MAGIC);
    buf.put_u8(msg as u8);
    buf.put_u8(0); // reserved
    buf.put_u32_le(payload.len() as u32);
    buf.put_slice(payload);
    buf.put_u16_le(checksum(payload));
    buf
}

/// Parse a message header, returning its type and payload length.
pub fn parse_header(hdr: &[u8; HEADER_LEN]) -> Result<(MsgType, usize), WireError> {
    let mut buf = &hdr[..];
    let magic = buf.get_u16_le();
    if magic != WIRE_MAGIC {
        return Err(WireError::BadMagic(magic));
    }
    let raw_type = buf.get_u8();
    let msg = MsgType::from_u8(raw_type).ok_or(WireError::UnknownType(raw_type))?;
    let _reserved = buf.get_u8();
    let len = buf.get_u32_le() as usize;
    if len > MAX_PAYLOAD {
        return Err(WireError::Oversize(len));
    }
    Ok((msg, len))
}

/// Verify the trailing checksum against the payload it covers.
pub fn verify_checksum(payload: &[u8], trailer: &[u8]) -> Result<(), WireError> {
    if trailer.len() < CHECKSUM_LEN {
        return Err(WireError::Truncated { need: CHECKSUM_LEN, have: trailer.len() });
    }
    let expected = u16::from_le_bytes([trailer[0], trailer[1]]);
    let computed = checksum(payload);
    if expected != computed {
        return Err(WireError::BadChecksum { expected, computed });
    }
    Ok(())
}

/// Parse a whole message out of one contiguous buffer.
pub fn parse_message(buf: &[u8]) -> Result<(MsgType, &[u8]), WireError> {
    if buf.len() < HEADER_LEN {
        return Err(WireError::Truncated { need: HEADER_LEN, have: buf.len() });
    }
    let hdr: &[u8; HEADER_LEN] = buf[..HEADER_LEN].try_into().unwrap();
    let (msg, len) = parse_header(hdr)?;

    let need = HEADER_LEN + len + CHECKSUM_LEN;
    if buf.len() < need {
        return Err(WireError::Truncated { need, have: buf.len() });
    }
    let payload = &buf[HEADER_LEN..HEADER_LEN + len];
    verify_checksum(payload, &buf[HEADER_LEN + len..need])?;
    Ok((msg, payload))
}

fn check_count(field: &'static str, len: usize) -> Result<(), WireError> {
    if len != SERVO_COUNT {
        return Err(WireError::ServoCount { field, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_config::{encode, ConfigModel};

    fn sample_frame() -> WireFrame {
        let mut m = ConfigModel::default();
        m.reverse_servo2 = true;
        m.servo_max = [1900, 2000, 2000, 2100, 2000, 2000];
        m.auto_throttle_p_gain = 1.25;
        m.osd_bitmask = 0xdead;
        encode(&m)
    }

    #[test]
    fn payload_is_exactly_schema_length() {
        let bytes = encode_frame(&sample_frame()).unwrap();
        assert_eq!(bytes.len(), PAYLOAD_LEN);
    }

    #[test]
    fn frame_bytes_round_trip() {
        let frame = sample_frame();
        let bytes = encode_frame(&frame).unwrap();
        let parsed = decode_frame(&bytes).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn short_payload_is_rejected() {
        let bytes = encode_frame(&sample_frame()).unwrap();
        assert_eq!(
            decode_frame(&bytes[..PAYLOAD_LEN - 4]),
            Err(WireError::BadPayloadLength(PAYLOAD_LEN - 4))
        );
    }

    #[test]
    fn drifted_servo_table_refuses_to_serialize() {
        let mut frame = sample_frame();
        frame.servo_neutral.push(1500);
        assert_eq!(
            encode_frame(&frame),
            Err(WireError::ServoCount { field: "servo_neutral", len: 7 })
        );
    }

    #[test]
    fn message_round_trip() {
        let payload = encode_frame(&sample_frame()).unwrap();
        let msg = frame_message(MsgType::ConfigData, &payload);
        assert_eq!(msg.len(), HEADER_LEN + PAYLOAD_LEN + CHECKSUM_LEN);

        let (kind, body) = parse_message(&msg).unwrap();
        assert_eq!(kind, MsgType::ConfigData);
        assert_eq!(body, &payload[..]);
    }

    #[test]
    fn empty_request_message_round_trips() {
        let msg = frame_message(MsgType::RequestConfig, &[]);
        let (kind, body) = parse_message(&msg).unwrap();
        assert_eq!(kind, MsgType::RequestConfig);
        assert!(body.is_empty());
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let payload = encode_frame(&sample_frame()).unwrap();
        let mut msg = frame_message(MsgType::SetConfig, &payload);
        let last = msg.len() - 1;
        msg[last] ^= 0xff;
        assert!(matches!(
            parse_message(&msg),
            Err(WireError::BadChecksum { .. })
        ));
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let payload = encode_frame(&sample_frame()).unwrap();
        let mut msg = frame_message(MsgType::SetConfig, &payload);
        msg[HEADER_LEN + 10] = msg[HEADER_LEN + 10].wrapping_add(1);
        assert!(matches!(
            parse_message(&msg),
            Err(WireError::BadChecksum { .. })
        ));
    }

    #[test]
    fn bad_magic_and_truncation_are_typed_errors() {
        let msg = frame_message(MsgType::RequestVersion, &[]);
        assert!(matches!(
            parse_message(&msg[..5]),
            Err(WireError::Truncated { .. })
        ));

        let mut bad = msg.clone();
        bad[0] = 0x00;
        assert!(matches!(parse_message(&bad), Err(WireError::BadMagic(_))));

        let mut unknown = msg;
        unknown[2] = 0x7f;
        assert_eq!(parse_message(&unknown), Err(WireError::UnknownType(0x7f)));
    }
}
