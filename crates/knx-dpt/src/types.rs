use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded engineering value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DptValue {
    I64(i64),
    F64(f64),
    Text(String),
}

impl DptValue {
    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DptValue::I64(v) => Some(*v as f64),
            DptValue::F64(v) => Some(*v),
            DptValue::Text(_) => None,
        }
    }

    /// Integer view; floats are accepted only without a fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DptValue::I64(v) => Some(*v),
            DptValue::F64(v) if v.is_finite() && v.fract() == 0.0 => {
                if *v >= i64::MIN as f64 && *v < i64::MAX as f64 {
                    Some(*v as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DptValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DptValue::I64(v) => write!(f, "{v}"),
            DptValue::F64(v) => write!(f, "{v}"),
            DptValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DptValue {
    fn from(v: i64) -> Self {
        DptValue::I64(v)
    }
}

impl From<i32> for DptValue {
    fn from(v: i32) -> Self {
        DptValue::I64(i64::from(v))
    }
}

impl From<f64> for DptValue {
    fn from(v: f64) -> Self {
        DptValue::F64(v)
    }
}

impl From<&str> for DptValue {
    fn from(v: &str) -> Self {
        DptValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Width {
    One,
    Two,
    Four,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::One => 1,
            Width::Two => 2,
            Width::Four => 4,
        }
    }

    /// Inclusive raw range for the width.
    pub const fn range(self, signed: bool) -> (i64, i64) {
        match (self, signed) {
            (Width::One, false) => (0, u8::MAX as i64),
            (Width::One, true) => (i8::MIN as i64, i8::MAX as i64),
            (Width::Two, false) => (0, u16::MAX as i64),
            (Width::Two, true) => (i16::MIN as i64, i16::MAX as i64),
            (Width::Four, false) => (0, u32::MAX as i64),
            (Width::Four, true) => (i32::MIN as i64, i32::MAX as i64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    Ascii,
    Latin1,
}

impl Charset {
    /// Zero is reserved for padding in both charsets.
    pub const fn allows(self, code: u32) -> bool {
        match self {
            Charset::Ascii => code >= 0x01 && code <= 0x7F,
            Charset::Latin1 => code >= 0x01 && code <= 0xFF,
        }
    }
}

/// Codec family plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Codec {
    /// Big-endian integer, exact over the full width.
    Int { width: Width, signed: bool },
    /// Integer payload counting steps of `numerator / denominator`.
    ScaledInt {
        width: Width,
        signed: bool,
        numerator: u32,
        denominator: u32,
    },
    /// One byte mapped linearly onto `0..=max`.
    Linear { max: f64 },
    /// KNX 2-byte float (DPT 9), limited to `min..=max`.
    Float16 { min: f64, max: f64 },
    /// IEEE 754 single precision (DPT 14).
    Float32,
    /// Zero padded string (DPT 16).
    Text { charset: Charset },
    /// Direction bit and step code (DPT 3).
    StepControl,
    /// Scene 1..=64 carried as 0..=63 (DPT 17).
    SceneNumber,
}

impl Codec {
    pub const TEXT_LENGTH: usize = 14;

    pub const fn payload_length(&self) -> usize {
        match self {
            Codec::Int { width, .. } | Codec::ScaledInt { width, .. } => width.bytes(),
            Codec::Linear { .. } | Codec::StepControl | Codec::SceneNumber => 1,
            Codec::Float16 { .. } => 2,
            Codec::Float32 => 4,
            Codec::Text { .. } => Self::TEXT_LENGTH,
        }
    }
}

/// Value domain a transcoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    Numeric {
        min: f64,
        max: f64,
        /// `None` where the step depends on the magnitude.
        resolution: Option<f64>,
    },
    Text { charset: Charset, max_len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transcoder {
    pub value_type: &'static str,
    pub main: u16,
    pub sub: Option<u16>,
    pub unit: Option<&'static str>,
    pub codec: Codec,
}

impl Transcoder {
    pub const fn new(
        value_type: &'static str,
        main: u16,
        sub: Option<u16>,
        unit: Option<&'static str>,
        codec: Codec,
    ) -> Self {
        Self {
            value_type,
            main,
            sub,
            unit,
            codec,
        }
    }

    pub const fn payload_length(&self) -> usize {
        self.codec.payload_length()
    }

    /// DPT number in `main.sub` notation, e.g. `9.001`, or `9` without a sub type.
    pub fn dpt_id(&self) -> String {
        match self.sub {
            Some(sub) => format!("{}.{:03}", self.main, sub),
            None => self.main.to_string(),
        }
    }

    pub fn domain(&self) -> Domain {
        match self.codec {
            Codec::Int { width, signed } => {
                let (lo, hi) = width.range(signed);
                Domain::Numeric {
                    min: lo as f64,
                    max: hi as f64,
                    resolution: Some(1.0),
                }
            }
            Codec::ScaledInt {
                width,
                signed,
                numerator,
                denominator,
            } => {
                let step = f64::from(numerator) / f64::from(denominator);
                let (lo, hi) = width.range(signed);
                Domain::Numeric {
                    min: lo as f64 * step,
                    max: hi as f64 * step,
                    resolution: Some(step),
                }
            }
            Codec::Linear { max } => Domain::Numeric {
                min: 0.0,
                max,
                resolution: Some(max / 255.0),
            },
            Codec::Float16 { min, max } => Domain::Numeric {
                min,
                max,
                resolution: None,
            },
            Codec::Float32 => Domain::Numeric {
                min: f64::from(f32::MIN),
                max: f64::from(f32::MAX),
                resolution: None,
            },
            Codec::Text { charset } => Domain::Text {
                charset,
                max_len: Codec::TEXT_LENGTH,
            },
            Codec::StepControl => Domain::Numeric {
                min: -100.0,
                max: 100.0,
                resolution: None,
            },
            Codec::SceneNumber => Domain::Numeric {
                min: 1.0,
                max: 64.0,
                resolution: Some(1.0),
            },
        }
    }
}

impl fmt::Display for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (DPT {})", self.value_type, self.dpt_id())
    }
}
