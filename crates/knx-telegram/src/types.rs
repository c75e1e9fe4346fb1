use crate::TransportError;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// 16-bit KNX group address (main/middle/sub = 5/3/8 bits)
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    pub const MAX_MAIN: u8 = 31;
    pub const MAX_MIDDLE: u8 = 7;

    /// Three-level address, `None` if a level is out of range.
    pub fn new(main: u8, middle: u8, sub: u8) -> Option<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return None;
        }
        Some(Self {
            raw: (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub),
        })
    }

    /// Two-level address (main/sub = 5/11 bits).
    pub fn two_level(main: u8, sub: u16) -> Option<Self> {
        if main > Self::MAX_MAIN || sub > 0x07FF {
            return None;
        }
        Some(Self {
            raw: (u16::from(main) << 11) | sub,
        })
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }
    pub fn main(&self) -> u8 {
        (self.raw >> 11) as u8
    }
    pub fn middle(&self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }
    pub fn sub(&self) -> u8 {
        (self.raw & 0xFF) as u8
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl FromStr for GroupAddress {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TransportError::InvalidAddress(s.to_string());
        let parts: Vec<&str> = s.trim().split('/').collect();
        match parts.as_slice() {
            [main, middle, sub] => {
                let main = main.parse::<u8>().map_err(|_| invalid())?;
                let middle = middle.parse::<u8>().map_err(|_| invalid())?;
                let sub = sub.parse::<u8>().map_err(|_| invalid())?;
                Self::new(main, middle, sub).ok_or_else(invalid)
            }
            [main, sub] => {
                let main = main.parse::<u8>().map_err(|_| invalid())?;
                let sub = sub.parse::<u16>().map_err(|_| invalid())?;
                Self::two_level(main, sub).ok_or_else(invalid)
            }
            [raw] => raw.parse::<u16>().map(Self::from_raw).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for GroupAddress {
    type Error = TransportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupAddress> for String {
    fn from(value: GroupAddress) -> Self {
        value.to_string()
    }
}

/// Application-layer service carried by a group telegram.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Payload {
    GroupValueRead,
    GroupValueWrite(Vec<u8>),
    GroupValueResponse(Vec<u8>),
    /// Any other APCI surfaced by the transport.
    Other { apci: u16, data: Vec<u8> },
}

impl Payload {
    /// Raw value bytes for writes and responses.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Payload::GroupValueWrite(data) | Payload::GroupValueResponse(data) => Some(data),
            _ => None,
        }
    }
}

/// A group telegram as delivered by or handed to the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct Telegram {
    pub destination: GroupAddress,
    pub payload: Payload,
    pub timestamp: Option<Timestamp>,
}

impl Telegram {
    pub fn new(destination: GroupAddress, payload: Payload) -> Self {
        Self {
            destination,
            payload,
            timestamp: None,
        }
    }

    pub fn read(destination: GroupAddress) -> Self {
        Self::new(destination, Payload::GroupValueRead)
    }

    pub fn write(destination: GroupAddress, data: Vec<u8>) -> Self {
        Self::new(destination, Payload::GroupValueWrite(data))
    }

    pub fn response(destination: GroupAddress, data: Vec<u8>) -> Self {
        Self::new(destination, Payload::GroupValueResponse(data))
    }

    pub fn stamped(mut self) -> Self {
        self.timestamp = Some(Timestamp(OffsetDateTime::now_utc()));
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp(pub OffsetDateTime);
