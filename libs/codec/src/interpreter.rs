use std::path::Path;

use crate::dictionary::Dictionary;
use crate::error::DictionaryError;
use crate::message::DataRecord;
use crate::types::{FieldType, Value};

/// Поле data record, разрешённое через словарь.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedField {
    pub name: String,
    pub enterprise_id: u32,
    pub field_id: u16,
    /// `None`, если байтов нет, а у типа нет пустого значения.
    pub value: Option<Value>,
}

/// Превращает сырые поля data record в именованные типизированные значения.
#[derive(Debug, Clone)]
pub struct Interpreter {
    dictionary: Dictionary,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Dictionary::builtin())
    }
}

impl Interpreter {
    pub fn new(dictionary: Dictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Загрузить файл словаря поверх текущих записей.
    pub fn load_dictionary(&mut self, path: &Path) -> Result<usize, DictionaryError> {
        self.dictionary.load_file(path)
    }

    pub fn interpret(&self, record: &DataRecord) -> Vec<InterpretedField> {
        record
            .fields
            .iter()
            .map(|f| {
                let (name, field_type) = match self.dictionary.get(f.enterprise_id, f.field_id) {
                    Some(entry) => (entry.name.clone(), entry.field_type),
                    None => (
                        format!("_ipfix_{}_{}", f.enterprise_id, f.field_id),
                        FieldType::OctetArray,
                    ),
                };
                InterpretedField {
                    name,
                    enterprise_id: f.enterprise_id,
                    field_id: f.field_id,
                    value: field_type.decode(&f.bytes),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RawField;

    fn field(enterprise_id: u32, field_id: u16, bytes: &[u8]) -> RawField {
        RawField { enterprise_id, field_id, bytes: bytes.to_vec() }
    }

    #[test]
    fn resolves_known_and_unknown_fields_in_order() {
        let interp = Interpreter::default();
        let record = DataRecord {
            template_id: 256,
            fields: vec![
                field(0, 8, &[10, 0, 0, 1]),
                field(0, 999, &[0, 255, 127]),
                field(0, 7, &[0, 80]),
            ],
        };

        let out = interp.interpret(&record);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].name, "sourceIPv4Address");
        assert_eq!(out[0].value, Some(Value::String("10.0.0.1".into())));
        assert_eq!(out[1].name, "_ipfix_0_999");
        assert_eq!(out[1].value, Some(Value::Bytes(vec![0, 255, 127])));
        assert_eq!(out[2].name, "sourceTransportPort");
        assert_eq!(out[2].value, Some(Value::Unsigned(80)));
    }

    #[test]
    fn enterprise_fields_keep_their_scope() {
        let mut dict = Dictionary::empty();
        dict.insert(15397, 1, "proceraApplication", FieldType::String);
        let interp = Interpreter::new(dict);

        let record = DataRecord {
            template_id: 300,
            fields: vec![field(15397, 1, b"http"), field(9, 1, &[1])],
        };
        let out = interp.interpret(&record);
        assert_eq!(out[0].enterprise_id, 15397);
        assert_eq!(out[0].value, Some(Value::String("http".into())));
        assert_eq!(out[1].name, "_ipfix_9_1");
    }
}
