use crate::{Charset, Codec, DptError, DptValue, Result, Transcoder, Width};

impl Transcoder {
    /// Encode `value` into the transcoder's fixed-length payload.
    ///
    /// Fails with [`DptError::InvalidValue`] for values outside the domain or of the
    /// wrong kind; nothing is clamped.
    pub fn encode(&self, value: &DptValue) -> Result<Vec<u8>> {
        match self.codec {
            Codec::Int { width, signed } => {
                let v = self.integer(value)?;
                let (lo, hi) = width.range(signed);
                if v < lo || v > hi {
                    return Err(self.invalid(format!("{v} outside {lo}..={hi}")));
                }
                Ok(int_to_be(v, width))
            }
            Codec::ScaledInt {
                width,
                signed,
                numerator,
                denominator,
            } => {
                let v = self.number(value)?;
                let step = f64::from(numerator) / f64::from(denominator);
                let (lo, hi) = width.range(signed);
                if v < lo as f64 * step || v > hi as f64 * step {
                    return Err(self.invalid(format!(
                        "{v} outside {}..={}",
                        lo as f64 * step,
                        hi as f64 * step
                    )));
                }
                // f64::round: ties away from zero
                let raw = (v * f64::from(denominator) / f64::from(numerator)).round() as i64;
                Ok(int_to_be(raw.clamp(lo, hi), width))
            }
            Codec::Linear { max } => {
                let v = self.number(value)?;
                if !(0.0..=max).contains(&v) {
                    return Err(self.invalid(format!("{v} outside 0..={max}")));
                }
                // ties to even: 30 % -> 76.5 -> 76
                let raw = (v * 255.0 / max).round_ties_even();
                Ok(vec![raw as u8])
            }
            Codec::Float16 { min, max } => {
                let v = self.number(value)?;
                if v < min || v > max {
                    return Err(self.invalid(format!("{v} outside {min}..={max}")));
                }
                let word = float16_encode(v).ok_or_else(|| {
                    self.invalid(format!("{v} not representable as 2-byte float"))
                })?;
                Ok(word.to_be_bytes().to_vec())
            }
            Codec::Float32 => {
                let v = self.number(value)?;
                if v.abs() > f64::from(f32::MAX) {
                    return Err(self.invalid(format!("{v} exceeds single precision range")));
                }
                Ok((v as f32).to_be_bytes().to_vec())
            }
            Codec::Text { charset } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| self.invalid(format!("expected text, got {value}")))?;
                text_encode(self, s, charset)
            }
            Codec::StepControl => {
                let v = self.integer(value)?;
                if !(-100..=100).contains(&v) {
                    return Err(self.invalid(format!("{v} outside -100..=100")));
                }
                Ok(vec![step_encode(v)])
            }
            Codec::SceneNumber => {
                let v = self.integer(value)?;
                if !(1..=64).contains(&v) {
                    return Err(self.invalid(format!("scene {v} outside 1..=64")));
                }
                Ok(vec![(v - 1) as u8])
            }
        }
    }

    fn integer(&self, value: &DptValue) -> Result<i64> {
        value
            .as_i64()
            .ok_or_else(|| self.invalid(format!("expected an integer, got {value}")))
    }

    fn number(&self, value: &DptValue) -> Result<f64> {
        match value.as_f64() {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(self.invalid(format!("{v} is not a finite number"))),
            None => Err(self.invalid(format!("expected a number, got {value}"))),
        }
    }

    pub(crate) fn invalid(&self, reason: String) -> DptError {
        DptError::InvalidValue {
            value_type: self.value_type,
            reason,
        }
    }
}

fn int_to_be(raw: i64, width: Width) -> Vec<u8> {
    let bytes = raw.to_be_bytes();
    bytes[bytes.len() - width.bytes()..].to_vec()
}

/// Smallest exponent whose rounded mantissa fits 12-bit two's complement.
fn float16_encode(value: f64) -> Option<u16> {
    let mut scaled = value * 100.0;
    let mut exponent: u16 = 0;
    loop {
        let mantissa = scaled.round();
        if (-2048.0..=2047.0).contains(&mantissa) {
            let bits = (mantissa as i16 as u16) & 0x0FFF;
            let sign = (bits >> 11) & 0x01;
            return Some((sign << 15) | (exponent << 11) | (bits & 0x07FF));
        }
        if exponent == 15 {
            return None;
        }
        exponent += 1;
        scaled /= 2.0;
    }
}

fn text_encode(tc: &Transcoder, s: &str, charset: Charset) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(Codec::TEXT_LENGTH);
    for ch in s.chars() {
        let code = u32::from(ch);
        if !charset.allows(code) {
            return Err(tc.invalid(format!("character {ch:?} not in {charset:?} charset")));
        }
        out.push(code as u8);
    }
    if out.len() > Codec::TEXT_LENGTH {
        return Err(tc.invalid(format!(
            "{} characters exceed {} byte payload",
            out.len(),
            Codec::TEXT_LENGTH
        )));
    }
    out.resize(Codec::TEXT_LENGTH, 0);
    Ok(out)
}

/// Percent increment announced by a step code: ceil(100 / 2^(code-1)).
pub(crate) fn step_increment(code: u8) -> i64 {
    let divisor = 1i64 << (code - 1);
    (100 + divisor - 1) / divisor
}

fn step_encode(value: i64) -> u8 {
    if value == 0 {
        return 0;
    }
    let magnitude = value.abs();
    let code = (1..=7u8)
        .find(|code| step_increment(*code) <= magnitude)
        .unwrap_or(7);
    let direction = if value > 0 { 0x08 } else { 0x00 };
    direction | code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve_by_value_type;

    fn encode(value_type: &str, value: impl Into<DptValue>) -> Result<Vec<u8>> {
        resolve_by_value_type(value_type)?.encode(&value.into())
    }

    #[test]
    fn test_int_widths_big_endian() {
        assert_eq!(encode("1byte_unsigned", 255).unwrap(), vec![0xFF]);
        assert_eq!(encode("1byte_signed", -1).unwrap(), vec![0xFF]);
        assert_eq!(encode("2byte_unsigned", 0x1234).unwrap(), vec![0x12, 0x34]);
        assert_eq!(encode("2byte_signed", -32768).unwrap(), vec![0x80, 0x00]);
        assert_eq!(
            encode("4byte_unsigned", 4_294_967_295i64).unwrap(),
            vec![0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            encode("4byte_signed", -2).unwrap(),
            vec![0xFF, 0xFF, 0xFF, 0xFE]
        );
    }

    #[test]
    fn test_int_out_of_range() {
        assert!(encode("1byte_unsigned", 256).is_err());
        assert!(encode("1byte_unsigned", -1).is_err());
        assert!(encode("1byte_signed", 128).is_err());
        assert!(encode("2byte_signed", 32768).is_err());
        assert!(encode("4byte_unsigned", 4_294_967_296i64).is_err());
    }

    #[test]
    fn test_int_rejects_fractions_and_text() {
        assert!(encode("2byte_unsigned", 1.5).is_err());
        assert_eq!(encode("2byte_unsigned", 7.0).unwrap(), vec![0x00, 0x07]);
        assert!(encode("2byte_unsigned", "7").is_err());
    }

    #[test]
    fn test_scaled_int_rounding() {
        // 10 ms steps
        assert_eq!(encode("time_period_10msec", 1000).unwrap(), vec![0x00, 0x64]);
        assert_eq!(encode("time_period_10msec", 15).unwrap(), vec![0x00, 0x02]);
        assert_eq!(encode("delta_time_100ms", -200).unwrap(), vec![0xFF, 0xFE]);
        // 0.01 % steps
        assert_eq!(encode("percentV16", 12.34).unwrap(), vec![0x04, 0xD2]);
        assert!(encode("time_period_10msec", 655_360).is_err());
    }

    #[test]
    fn test_float16_known_values() {
        assert_eq!(encode("temperature", 21.0).unwrap(), vec![0x0C, 0x1A]);
        assert_eq!(encode("2byte_float", 0.0).unwrap(), vec![0x00, 0x00]);
        assert_eq!(encode("2byte_float", -0.01).unwrap(), vec![0x87, 0xFF]);
        assert_eq!(encode("2byte_float", 20.47).unwrap(), vec![0x07, 0xFF]);
        assert_eq!(encode("2byte_float", -20.48).unwrap(), vec![0x80, 0x00]);
        assert_eq!(encode("2byte_float", 670_760.96).unwrap(), vec![0x7F, 0xFF]);
        assert_eq!(encode("2byte_float", -671_088.64).unwrap(), vec![0xF8, 0x00]);
    }

    #[test]
    fn test_float16_rounding_overflow_bumps_exponent() {
        // 2047.99 rounds to mantissa 2048 at exponent 0
        let bytes = encode("2byte_float", 20.4799).unwrap();
        let word = u16::from_be_bytes([bytes[0], bytes[1]]);
        assert_eq!((word >> 11) & 0x0F, 1);
    }

    #[test]
    fn test_float16_out_of_range() {
        assert!(encode("2byte_float", 670_761.0).is_err());
        assert!(encode("2byte_float", -671_089.0).is_err());
        assert!(encode("temperature", -273.5).is_err());
        assert!(encode("illuminance", -1.0).is_err());
        assert!(encode("2byte_float", f64::NAN).is_err());
    }

    #[test]
    fn test_float32_rejects_non_finite() {
        assert_eq!(encode("power", 1.5).unwrap(), vec![0x3F, 0xC0, 0x00, 0x00]);
        assert!(encode("power", f64::INFINITY).is_err());
        assert!(encode("power", f64::NEG_INFINITY).is_err());
        assert!(encode("power", f64::NAN).is_err());
        assert!(encode("power", 1e39).is_err());
    }

    #[test]
    fn test_linear_endpoints_and_ties() {
        assert_eq!(encode("percent", 0).unwrap(), vec![0]);
        assert_eq!(encode("percent", 100).unwrap(), vec![255]);
        assert_eq!(encode("angle", 360).unwrap(), vec![255]);
        // 76.5 and 127.5 round to the even neighbour
        assert_eq!(encode("percent", 30).unwrap(), vec![76]);
        assert_eq!(encode("percent", 50).unwrap(), vec![128]);
        assert!(encode("percent", 100.5).is_err());
        assert!(encode("percent", -0.1).is_err());
    }

    #[test]
    fn test_text_padding_and_charset() {
        let bytes = encode("string", "KNX is OK").unwrap();
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[..9], b"KNX is OK");
        assert!(bytes[9..].iter().all(|b| *b == 0));

        assert_eq!(encode("latin_1", "ä").unwrap()[0], 0xE4);
        assert!(encode("string", "ä").is_err());
        assert!(encode("latin_1", "€").is_err());
        assert!(encode("string", "fifteen chars!!").is_err());
        assert!(encode("string", "nul\0inside").is_err());
        assert!(encode("string", 5).is_err());
    }

    #[test]
    fn test_step_control() {
        assert_eq!(encode("stepwise_dimming", 0).unwrap(), vec![0x00]);
        assert_eq!(encode("stepwise_dimming", 100).unwrap(), vec![0x09]);
        assert_eq!(encode("stepwise_dimming", -100).unwrap(), vec![0x01]);
        assert_eq!(encode("stepwise_dimming", 50).unwrap(), vec![0x0A]);
        assert_eq!(encode("stepwise_blinds", 30).unwrap(), vec![0x0B]);
        assert_eq!(encode("stepwise_blinds", 1).unwrap(), vec![0x0F]);
        assert!(encode("stepwise_blinds", 101).is_err());
    }

    #[test]
    fn test_scene_number() {
        assert_eq!(encode("scene_number", 1).unwrap(), vec![0x00]);
        assert_eq!(encode("scene_number", 64).unwrap(), vec![0x3F]);
        assert!(encode("scene_number", 0).is_err());
        assert!(encode("scene_number", 65).is_err());
    }
}
