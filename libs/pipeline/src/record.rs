use serde::Serialize;

// ═══════════════════════════════════════════════════════════════
//  Output record
// ═══════════════════════════════════════════════════════════════

/// Партия записей из одного IPFIX сообщения.
pub type Batch = Vec<InterpretedRecord>;

/// Единица вывода: одна data record после интерпретации.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedRecord {
    /// Export time из заголовка сообщения (секунды Unix epoch).
    pub export_time: u32,
    pub template_id: u16,
    /// Порядок полей = порядок в template.
    pub fields: Vec<InterpretedField>,
}

impl InterpretedRecord {
    /// Первое стандартное (enterprise 0) поле с данным id.
    pub fn standard_field(&self, field_id: u16) -> Option<&InterpretedField> {
        self.fields
            .iter()
            .find(|f| f.enterprise_id == 0 && f.field_id == field_id)
    }
}

/// Поле записи. Байтовые значения вынесены в `raw_value`, так что
/// `value` никогда не несёт сырые байты.
///
/// Ключи JSON: `name`, `enterprise`, `field`, `value`, `raw`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretedField {
    pub name: String,
    #[serde(rename = "enterprise", skip_serializing_if = "is_zero")]
    pub enterprise_id: u32,
    #[serde(rename = "field")]
    pub field_id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    #[serde(rename = "raw", skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<Vec<u8>>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Типизированное значение поля, сериализуется как JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            FieldValue::Signed(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}
