use crate::error::DecodeError;

/// Длина поля, означающая variable-length кодирование.
pub const VARIABLE_LENGTH: u16 = 0xFFFF;

const ENTERPRISE_BIT: u16 = 0x8000;

pub const TEMPLATE_SET_ID: u16 = 2;
pub const OPTIONS_TEMPLATE_SET_ID: u16 = 3;

/// Минимальный id шаблона для data set.
pub const MIN_DATA_SET_ID: u16 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub enterprise_id: u32,
    pub field_id: u16,
    pub length: u16,
}

impl FieldSpec {
    pub fn is_variable(&self) -> bool {
        self.length == VARIABLE_LENGTH
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: u16,
    /// Ненулевой только у options template.
    pub scope_field_count: u16,
    pub fields: Vec<FieldSpec>,
}

impl Template {
    /// Минимальный размер записи по этому шаблону. Поле переменной
    /// длины считается за свой однобайтовый префикс.
    pub fn min_record_len(&self) -> usize {
        self.fields
            .iter()
            .map(|f| if f.is_variable() { 1 } else { f.length as usize })
            .sum()
    }
}

/// Запись template set или options template set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRecord {
    Define(Template),
    Withdraw(u16),
    /// Id шаблона равен id set'а, полей нет: отозвать все шаблоны этого
    /// вида в observation domain.
    WithdrawAll { options: bool },
}

/// Разобрать тело template set (`options == false`) или options
/// template set (`options == true`).
pub fn parse_template_set(mut body: &[u8], options: bool) -> Result<Vec<TemplateRecord>, DecodeError> {
    let mut out = Vec::new();

    // Хвост короче заголовка записи или из одних нулей: выравнивание.
    while body.len() >= 4 && body.iter().any(|&b| b != 0) {
        let template_id = read_u16(body, 0);
        let field_count = read_u16(body, 2);
        body = &body[4..];

        if field_count == 0 && template_id == set_id(options) {
            out.push(TemplateRecord::WithdrawAll { options });
            continue;
        }

        if template_id < MIN_DATA_SET_ID {
            return Err(DecodeError::Template {
                template_id,
                detail: "template id below 256".into(),
            });
        }

        if field_count == 0 {
            out.push(TemplateRecord::Withdraw(template_id));
            continue;
        }

        let scope_field_count = if options {
            if body.len() < 2 {
                return Err(DecodeError::Template {
                    template_id,
                    detail: "missing scope field count".into(),
                });
            }
            let n = read_u16(body, 0);
            body = &body[2..];
            if n == 0 || n > field_count {
                return Err(DecodeError::Template {
                    template_id,
                    detail: format!("scope field count {n} out of range (fields {field_count})"),
                });
            }
            n
        } else {
            0
        };

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            if body.len() < 4 {
                return Err(DecodeError::Template {
                    template_id,
                    detail: "truncated field specifier".into(),
                });
            }
            let raw_id = read_u16(body, 0);
            let length = read_u16(body, 2);
            body = &body[4..];

            let enterprise_id = if raw_id & ENTERPRISE_BIT != 0 {
                if body.len() < 4 {
                    return Err(DecodeError::Template {
                        template_id,
                        detail: "truncated enterprise number".into(),
                    });
                }
                let pen = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
                body = &body[4..];
                pen
            } else {
                0
            };

            fields.push(FieldSpec {
                enterprise_id,
                field_id: raw_id & !ENTERPRISE_BIT,
                length,
            });
        }

        out.push(TemplateRecord::Define(Template {
            id: template_id,
            scope_field_count,
            fields,
        }));
    }

    Ok(out)
}

fn set_id(options: bool) -> u16 {
    if options { OPTIONS_TEMPLATE_SET_ID } else { TEMPLATE_SET_ID }
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}
