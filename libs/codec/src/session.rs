use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DecodeError;
use crate::message::{DataRecord, IPFIX_VERSION, Message, MessageHeader, RawField};
use crate::template::{
    MIN_DATA_SET_ID, OPTIONS_TEMPLATE_SET_ID, TEMPLATE_SET_ID, Template, TemplateRecord, parse_template_set,
};

/// Состояние шаблонов, общее для всех сообщений одного потока.
///
/// Шаблоны привязаны к observation domain (RFC 7011).
#[derive(Debug, Default)]
pub struct Session {
    templates: HashMap<(u32, u16), Arc<Template>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(&self, domain: u32, template_id: u16) -> Option<&Template> {
        self.templates.get(&(domain, template_id)).map(|t| t.as_ref())
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Декодировать тело сообщения (всё после 16-байтового заголовка).
    ///
    /// Template set обновляет session до разбора следующих set'ов того же
    /// сообщения: сообщение может и объявить шаблон, и использовать его.
    pub fn decode(&mut self, header: MessageHeader, body: &[u8]) -> Result<Message, DecodeError> {
        if header.version != IPFIX_VERSION {
            return Err(DecodeError::Version(header.version));
        }

        let domain = header.observation_domain_id;
        let mut data_records = Vec::new();
        let mut rest = body;

        while !rest.is_empty() {
            if rest.len() < 4 {
                return Err(DecodeError::SetLength { set_id: 0, length: rest.len() as u16 });
            }
            let set_id = u16::from_be_bytes([rest[0], rest[1]]);
            let set_len = u16::from_be_bytes([rest[2], rest[3]]);
            if (set_len as usize) < 4 || set_len as usize > rest.len() {
                return Err(DecodeError::SetLength { set_id, length: set_len });
            }
            let set_body = &rest[4..set_len as usize];
            rest = &rest[set_len as usize..];

            match set_id {
                TEMPLATE_SET_ID => self.apply_templates(domain, parse_template_set(set_body, false)?),
                OPTIONS_TEMPLATE_SET_ID => self.apply_templates(domain, parse_template_set(set_body, true)?),
                id if id >= MIN_DATA_SET_ID => {
                    let template = self
                        .templates
                        .get(&(domain, id))
                        .cloned()
                        .ok_or(DecodeError::UnknownTemplate { domain, template_id: id })?;
                    decode_data_set(&template, set_body, &mut data_records)?;
                }
                id => {
                    tracing::debug!(set_id = id, "skipping reserved set");
                }
            }
        }

        Ok(Message { header, data_records })
    }

    fn apply_templates(&mut self, domain: u32, records: Vec<TemplateRecord>) {
        for record in records {
            match record {
                TemplateRecord::Define(t) => {
                    tracing::debug!(domain, template_id = t.id, fields = t.fields.len(), "template learned");
                    self.templates.insert((domain, t.id), Arc::new(t));
                }
                TemplateRecord::Withdraw(id) => {
                    tracing::debug!(domain, template_id = id, "template withdrawn");
                    self.templates.remove(&(domain, id));
                }
                TemplateRecord::WithdrawAll { options } => {
                    tracing::debug!(domain, options, "all templates withdrawn");
                    self.templates
                        .retain(|(d, _), t| *d != domain || (t.scope_field_count > 0) != options);
                }
            }
        }
    }
}

fn decode_data_set(template: &Template, mut body: &[u8], out: &mut Vec<DataRecord>) -> Result<(), DecodeError> {
    let min_len = template.min_record_len();
    if min_len == 0 {
        return Ok(());
    }

    while body.len() >= min_len {
        let mut fields = Vec::with_capacity(template.fields.len());
        for field in &template.fields {
            let len = if field.is_variable() {
                let (len, prefix) = variable_length(body).ok_or(DecodeError::ShortRecord { template_id: template.id })?;
                body = &body[prefix..];
                len
            } else {
                field.length as usize
            };
            if body.len() < len {
                return Err(DecodeError::ShortRecord { template_id: template.id });
            }
            fields.push(RawField {
                enterprise_id: field.enterprise_id,
                field_id: field.field_id,
                bytes: body[..len].to_vec(),
            });
            body = &body[len..];
        }
        out.push(DataRecord { template_id: template.id, fields });
    }

    Ok(())
}

/// (длина данных, длина префикса) поля переменной длины.
fn variable_length(buf: &[u8]) -> Option<(usize, usize)> {
    match *buf.first()? {
        255 => {
            if buf.len() < 3 {
                return None;
            }
            Some((u16::from_be_bytes([buf[1], buf[2]]) as usize, 3))
        }
        n => Some((n as usize, 1)),
    }
}
