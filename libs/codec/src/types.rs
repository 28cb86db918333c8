use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

/// Секунды между NTP epoch (1900) и Unix epoch.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

// ═══════════════════════════════════════════════════════════════
//  Abstract data types
// ═══════════════════════════════════════════════════════════════

/// Абстрактный тип данных IANA. Имена как в реестре IANA, так же они
/// пишутся в файлах словаря.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    OctetArray,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Float32,
    Float64,
    Boolean,
    MacAddress,
    String,
    DateTimeSeconds,
    DateTimeMilliseconds,
    DateTimeMicroseconds,
    DateTimeNanoseconds,
    Ipv4Address,
    Ipv6Address,
}

/// Разобранное значение поля.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl FieldType {
    /// Номинальный размер; `None` для типов переменной длины.
    fn size(self) -> Option<usize> {
        use FieldType::*;
        match self {
            Unsigned8 | Signed8 | Boolean => Some(1),
            Unsigned16 | Signed16 => Some(2),
            Unsigned32 | Signed32 | Float32 | DateTimeSeconds | Ipv4Address => Some(4),
            Unsigned64 | Signed64 | Float64 | DateTimeMilliseconds | DateTimeMicroseconds
            | DateTimeNanoseconds => Some(8),
            MacAddress => Some(6),
            Ipv6Address => Some(16),
            OctetArray | String => None,
        }
    }

    /// Декодировать байты как значение этого типа.
    ///
    /// Пустое поле не-octet типа даёт `None`. Целые принимают
    /// reduced-size encoding; при любом другом несовпадении длины
    /// возвращаются сырые байты.
    pub fn decode(self, bytes: &[u8]) -> Option<Value> {
        use FieldType::*;

        if self == OctetArray {
            return Some(Value::Bytes(bytes.to_vec()));
        }
        if bytes.is_empty() {
            return None;
        }

        let value = match self {
            Unsigned8 | Unsigned16 | Unsigned32 | Unsigned64 => {
                self.fits_reduced(bytes).then(|| Value::Unsigned(be_unsigned(bytes)))
            }
            Signed8 | Signed16 | Signed32 | Signed64 => {
                self.fits_reduced(bytes).then(|| Value::Signed(be_signed(bytes)))
            }
            Float32 => <[u8; 4]>::try_from(bytes)
                .ok()
                .map(|b| Value::Float(f32::from_be_bytes(b) as f64)),
            Float64 => match bytes.len() {
                8 => <[u8; 8]>::try_from(bytes).ok().map(|b| Value::Float(f64::from_be_bytes(b))),
                4 => <[u8; 4]>::try_from(bytes).ok().map(|b| Value::Float(f32::from_be_bytes(b) as f64)),
                _ => None,
            },
            Boolean => match bytes {
                [1] => Some(Value::Bool(true)),
                [2] => Some(Value::Bool(false)),
                _ => None,
            },
            MacAddress => (bytes.len() == 6).then(|| {
                let parts: Vec<std::string::String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
                Value::String(parts.join(":"))
            }),
            String => Some(Value::String(std::string::String::from_utf8_lossy(bytes).into_owned())),
            DateTimeSeconds => <[u8; 4]>::try_from(bytes)
                .ok()
                .and_then(|b| DateTime::from_timestamp(u32::from_be_bytes(b) as i64, 0))
                .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Secs, true))),
            DateTimeMilliseconds => self
                .fits_reduced(bytes)
                .then(|| be_unsigned(bytes))
                .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
                .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true))),
            DateTimeMicroseconds | DateTimeNanoseconds => <[u8; 8]>::try_from(bytes)
                .ok()
                .and_then(ntp_time)
                .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
            Ipv4Address => <[u8; 4]>::try_from(bytes)
                .ok()
                .map(|b| Value::String(Ipv4Addr::from(b).to_string())),
            Ipv6Address => <[u8; 16]>::try_from(bytes)
                .ok()
                .map(|b| Value::String(Ipv6Addr::from(b).to_string())),
            OctetArray => None,
        };

        Some(value.unwrap_or_else(|| Value::Bytes(bytes.to_vec())))
    }

    fn fits_reduced(self, bytes: &[u8]) -> bool {
        self.size().is_some_and(|n| bytes.len() <= n)
    }
}

fn be_unsigned(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

fn be_signed(bytes: &[u8]) -> i64 {
    let raw = be_unsigned(bytes);
    let shift = 64 - 8 * bytes.len() as u32;
    ((raw << shift) as i64) >> shift
}

/// NTP timestamp: секунды от 1900 и двоичная дробь.
fn ntp_time(bytes: [u8; 8]) -> Option<DateTime<Utc>> {
    let secs = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64;
    let frac = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as u64;
    let nanos = ((frac * 1_000_000_000) >> 32) as u32;
    DateTime::from_timestamp(secs - NTP_UNIX_OFFSET, nanos)
}
