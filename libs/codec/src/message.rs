use crate::error::DecodeError;

/// Версия протокола IPFIX в заголовке каждого сообщения.
pub const IPFIX_VERSION: u16 = 10;

/// Размер фиксированного заголовка.
pub const HEADER_LEN: usize = 16;

// ═══════════════════════════════════════════════════════════════
//  Message header
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u16,
    /// Полная длина сообщения вместе с заголовком.
    pub length: u16,
    /// Секунды от Unix epoch.
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain_id: u32,
}

impl MessageHeader {
    /// Разобрать 16-байтовый заголовок. Здесь проверяется только длина:
    /// версия проверяется после чтения тела, чтобы плохое сообщение не
    /// сбивало поток.
    pub fn parse(buf: &[u8; HEADER_LEN]) -> Result<Self, DecodeError> {
        let header = Self {
            version: u16::from_be_bytes([buf[0], buf[1]]),
            length: u16::from_be_bytes([buf[2], buf[3]]),
            export_time: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            sequence_number: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            observation_domain_id: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        };
        if (header.length as usize) < HEADER_LEN {
            return Err(DecodeError::MessageLength(header.length));
        }
        Ok(header)
    }

    pub fn body_len(&self) -> usize {
        self.length as usize - HEADER_LEN
    }
}

// ═══════════════════════════════════════════════════════════════
//  Decoded message
// ═══════════════════════════════════════════════════════════════

/// Поле data record в исходном wire виде.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub enterprise_id: u32,
    pub field_id: u16,
    pub bytes: Vec<u8>,
}

/// Data record с id шаблона, по которому она разобрана.
/// Поля в порядке шаблона.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    pub template_id: u16,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub data_records: Vec<DataRecord>,
}
