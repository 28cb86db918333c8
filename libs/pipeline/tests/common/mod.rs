#![allow(dead_code)]

//! Сборка IPFIX сообщений для интеграционных тестов.

pub const EXPORT_TIME: u32 = 1_700_000_000;
pub const DOMAIN: u32 = 1;

/// Field specifier: (field id, length), enterprise 0.
pub type Spec = (u16, u16);

pub fn template_set(template_id: u16, fields: &[Spec]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&template_id.to_be_bytes());
    body.extend_from_slice(&(fields.len() as u16).to_be_bytes());
    for (id, len) in fields {
        body.extend_from_slice(&id.to_be_bytes());
        body.extend_from_slice(&len.to_be_bytes());
    }
    set(2, &body)
}

pub fn data_set(template_id: u16, records: &[Vec<u8>]) -> Vec<u8> {
    set(template_id, &records.concat())
}

pub fn set(set_id: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 4);
    out.extend_from_slice(&set_id.to_be_bytes());
    out.extend_from_slice(&((body.len() + 4) as u16).to_be_bytes());
    out.extend_from_slice(body);
    out
}

pub fn message(sequence: u32, sets: &[Vec<u8>]) -> Vec<u8> {
    message_with_version(10, sequence, sets)
}

pub fn message_with_version(version: u16, sequence: u32, sets: &[Vec<u8>]) -> Vec<u8> {
    let body = sets.concat();
    let mut out = Vec::with_capacity(body.len() + 16);
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&((body.len() + 16) as u16).to_be_bytes());
    out.extend_from_slice(&EXPORT_TIME.to_be_bytes());
    out.extend_from_slice(&sequence.to_be_bytes());
    out.extend_from_slice(&DOMAIN.to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// Сообщение с неверной версией: длина корректна, поток не сбивается.
pub fn bad_message(sequence: u32) -> Vec<u8> {
    message_with_version(9, sequence, &[])
}

/// Шаблон 256: protocolIdentifier(1), octetDeltaCount(4), variable-length octet field.
pub fn flow_template() -> Vec<u8> {
    template_set(256, &[(4, 1), (1, 4), (313, 0xFFFF)])
}

pub fn flow_record(protocol: u8, octets: u32, payload: &[u8]) -> Vec<u8> {
    let mut rec = vec![protocol];
    rec.extend_from_slice(&octets.to_be_bytes());
    rec.push(payload.len() as u8);
    rec.extend_from_slice(payload);
    rec
}
