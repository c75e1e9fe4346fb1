use crate::encode::step_increment;
use crate::{Charset, Codec, DptError, DptValue, Result, Transcoder};

impl Transcoder {
    /// Decode a payload of exactly [`Transcoder::payload_length`] bytes.
    ///
    /// Every well-sized payload decodes, except strings carrying bytes outside
    /// their charset.
    pub fn decode(&self, data: &[u8]) -> Result<DptValue> {
        let expected = self.payload_length();
        if data.len() != expected {
            return Err(DptError::InvalidPayloadLength {
                value_type: self.value_type,
                expected,
                actual: data.len(),
            });
        }
        let value = match self.codec {
            Codec::Int { signed, .. } => DptValue::I64(int_from_be(data, signed)),
            Codec::ScaledInt {
                signed,
                numerator,
                denominator,
                ..
            } => {
                let raw = int_from_be(data, signed);
                if denominator == 1 {
                    DptValue::I64(raw * i64::from(numerator))
                } else {
                    DptValue::F64(raw as f64 * f64::from(numerator) / f64::from(denominator))
                }
            }
            Codec::Linear { max } => DptValue::F64(f64::from(data[0]) * max / 255.0),
            Codec::Float16 { .. } => DptValue::F64(float16_decode(u16::from_be_bytes([
                data[0], data[1],
            ]))),
            Codec::Float32 => DptValue::F64(f64::from(f32::from_be_bytes([
                data[0], data[1], data[2], data[3],
            ]))),
            Codec::Text { charset } => DptValue::Text(text_decode(self, data, charset)?),
            Codec::StepControl => {
                let code = data[0] & 0x07;
                if code == 0 {
                    DptValue::I64(0)
                } else if data[0] & 0x08 != 0 {
                    DptValue::I64(step_increment(code))
                } else {
                    DptValue::I64(-step_increment(code))
                }
            }
            Codec::SceneNumber => DptValue::I64(i64::from(data[0] & 0x3F) + 1),
        };
        Ok(value)
    }
}

fn int_from_be(data: &[u8], signed: bool) -> i64 {
    let raw = data.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    if signed {
        let shift = 64 - 8 * data.len() as u32;
        ((raw << shift) as i64) >> shift
    } else {
        raw as i64
    }
}

fn float16_decode(word: u16) -> f64 {
    let exponent = (word >> 11) & 0x0F;
    let mut mantissa = i32::from(word & 0x07FF);
    if word & 0x8000 != 0 {
        mantissa -= 2048;
    }
    f64::from(mantissa << exponent) / 100.0
}

fn text_decode(tc: &Transcoder, data: &[u8], charset: Charset) -> Result<String> {
    let end = data.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let mut out = String::with_capacity(end);
    for (pos, b) in data[..end].iter().enumerate() {
        if !charset.allows(u32::from(*b)) {
            return Err(DptError::InvalidPayload {
                value_type: tc.value_type,
                reason: format!("byte 0x{b:02X} at {pos} not in {charset:?} charset"),
            });
        }
        out.push(char::from(*b));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve_by_value_type;

    fn decode(value_type: &str, data: &[u8]) -> Result<DptValue> {
        resolve_by_value_type(value_type)?.decode(data)
    }

    fn decode_f64(value_type: &str, data: &[u8]) -> f64 {
        decode(value_type, data).unwrap().as_f64().unwrap()
    }

    #[test]
    fn test_payload_length_checked() {
        let err = decode("temperature", &[0x0C]).unwrap_err();
        assert_eq!(
            err,
            DptError::InvalidPayloadLength {
                value_type: "temperature",
                expected: 2,
                actual: 1
            }
        );
        assert!(decode("1byte_unsigned", &[]).is_err());
        assert!(decode("string", &[0x41; 15]).is_err());
    }

    #[test]
    fn test_int_families_are_bijective() {
        let cases: &[(&str, i64)] = &[
            ("1byte_unsigned", 0),
            ("1byte_unsigned", 255),
            ("1byte_signed", -128),
            ("1byte_signed", 127),
            ("2byte_unsigned", 65535),
            ("2byte_signed", -32768),
            ("2byte_signed", 32767),
            ("4byte_unsigned", 4_294_967_295),
            ("4byte_signed", i64::from(i32::MIN)),
            ("4byte_signed", i64::from(i32::MAX)),
            ("active_energy", -123_456),
        ];
        for (value_type, v) in cases {
            let tc = resolve_by_value_type(value_type).unwrap();
            let bytes = tc.encode(&DptValue::I64(*v)).unwrap();
            assert_eq!(tc.decode(&bytes).unwrap(), DptValue::I64(*v), "{value_type}");
        }
    }

    #[test]
    fn test_one_byte_ints_exhaustive() {
        for value_type in ["1byte_unsigned", "1byte_signed", "percentU8", "counter_pulses"] {
            let tc = resolve_by_value_type(value_type).unwrap();
            for raw in 0..=255u8 {
                let value = tc.decode(&[raw]).unwrap();
                assert_eq!(tc.encode(&value).unwrap(), vec![raw], "{value_type}");
            }
        }
    }

    #[test]
    fn test_scaled_int_decode() {
        assert_eq!(
            decode("time_period_100msec", &[0x00, 0x0A]).unwrap(),
            DptValue::I64(1000)
        );
        assert_eq!(
            decode("delta_time_10ms", &[0xFF, 0xFF]).unwrap(),
            DptValue::I64(-10)
        );
        assert_eq!(decode_f64("percentV16", &[0x04, 0xD2]), 12.34);
        assert_eq!(decode_f64("flow_rate_m3h", &[0x00, 0x00, 0x00, 0x01]), 0.0001);
    }

    #[test]
    fn test_float16_decode() {
        assert_eq!(decode_f64("temperature", &[0x0C, 0x1A]), 21.0);
        assert_eq!(decode_f64("2byte_float", &[0x87, 0xFF]), -0.01);
        assert_eq!(decode_f64("2byte_float", &[0x7F, 0xFF]), 670_760.96);
        assert_eq!(decode_f64("2byte_float", &[0xF8, 0x00]), -671_088.64);
    }

    #[test]
    fn test_float16_round_trip_within_resolution() {
        let tc = resolve_by_value_type("2byte_float").unwrap();
        let mut v = -671_088.64;
        while v < 670_760.0 {
            let bytes = tc.encode(&DptValue::F64(v)).unwrap();
            let word = u16::from_be_bytes([bytes[0], bytes[1]]);
            let exponent = (word >> 11) & 0x0F;
            let half_step = 0.005 * f64::from(1u32 << exponent);
            let back = tc.decode(&bytes).unwrap().as_f64().unwrap();
            assert!(
                (back - v).abs() <= half_step + 1e-9,
                "{v} decoded as {back} at exponent {exponent}"
            );
            v += 1234.567;
        }
    }

    #[test]
    fn test_float16_decode_is_total() {
        let tc = resolve_by_value_type("2byte_float").unwrap();
        for word in (0..=u16::MAX).step_by(97) {
            assert!(tc.decode(&word.to_be_bytes()).is_ok());
        }
    }

    #[test]
    fn test_float32_round_trip() {
        let tc = resolve_by_value_type("electric_current").unwrap();
        for v in [0.0, -1.5, 1234.5, f64::from(f32::MAX), f64::from(f32::MIN_POSITIVE)] {
            let bytes = tc.encode(&DptValue::F64(v)).unwrap();
            assert_eq!(tc.decode(&bytes).unwrap(), DptValue::F64(v));
        }
    }

    #[test]
    fn test_linear_decode_monotonic_with_endpoints() {
        let tc = resolve_by_value_type("percent").unwrap();
        let mut last = -1.0;
        for raw in 0..=255u8 {
            let v = tc.decode(&[raw]).unwrap().as_f64().unwrap();
            assert!(v >= last);
            last = v;
        }
        assert_eq!(decode_f64("percent", &[0]), 0.0);
        assert_eq!(decode_f64("percent", &[255]), 100.0);
        assert_eq!(decode_f64("angle", &[255]), 360.0);
    }

    #[test]
    fn test_linear_raw_round_trip() {
        let tc = resolve_by_value_type("angle").unwrap();
        for raw in 0..=255u8 {
            let value = tc.decode(&[raw]).unwrap();
            assert_eq!(tc.encode(&value).unwrap(), vec![raw]);
        }
    }

    #[test]
    fn test_text_round_trip() {
        let tc = resolve_by_value_type("latin_1").unwrap();
        for s in ["", "a", "Grüße", "exactly14chars"] {
            let bytes = tc.encode(&DptValue::from(s)).unwrap();
            assert_eq!(tc.decode(&bytes).unwrap(), DptValue::from(s));
        }
    }

    #[test]
    fn test_text_rejects_bad_bytes() {
        let mut data = [0u8; 14];
        data[0] = b'A';
        data[1] = 0xE4;
        assert!(decode("string", &data).is_err());
        assert_eq!(decode("latin_1", &data).unwrap(), DptValue::from("Aä"));

        // zero before data is not padding
        let mut gap = [0u8; 14];
        gap[0] = b'A';
        gap[2] = b'B';
        assert!(decode("string", &gap).is_err());
    }

    #[test]
    fn test_step_control_decode() {
        assert_eq!(decode("stepwise_dimming", &[0x09]).unwrap(), DptValue::I64(100));
        assert_eq!(decode("stepwise_dimming", &[0x01]).unwrap(), DptValue::I64(-100));
        assert_eq!(decode("stepwise_dimming", &[0x0B]).unwrap(), DptValue::I64(25));
        assert_eq!(decode("stepwise_blinds", &[0x08]).unwrap(), DptValue::I64(0));
        assert_eq!(decode("stepwise_blinds", &[0xF7]).unwrap(), DptValue::I64(-2));
    }

    #[test]
    fn test_scene_number_decode() {
        assert_eq!(decode("scene_number", &[0x00]).unwrap(), DptValue::I64(1));
        assert_eq!(decode("scene_number", &[0x3F]).unwrap(), DptValue::I64(64));
        assert_eq!(decode("scene_number", &[0xC1]).unwrap(), DptValue::I64(2));
    }
}
