use flow_codec::{Interpreter, Message, Value};

use crate::record::{Batch, FieldValue, InterpretedField, InterpretedRecord};

/// Разложить значение по `value` / `raw_value`.
///
/// Байтовая последовательность уходит в `raw_value`, пустая или
/// отсутствующая не даёт ни того, ни другого.
pub fn normalize(value: Option<Value>) -> (Option<FieldValue>, Option<Vec<u8>>) {
    match value {
        None => (None, None),
        Some(Value::Bytes(bytes)) if bytes.is_empty() => (None, None),
        Some(Value::Bytes(bytes)) => (None, Some(bytes)),
        Some(Value::Bool(v)) => (Some(FieldValue::Bool(v)), None),
        Some(Value::Unsigned(v)) => (Some(FieldValue::Unsigned(v)), None),
        Some(Value::Signed(v)) => (Some(FieldValue::Signed(v)), None),
        Some(Value::Float(v)) => (Some(FieldValue::Float(v)), None),
        Some(Value::String(v)) => (Some(FieldValue::String(v)), None),
    }
}

pub fn convert_field(field: flow_codec::InterpretedField) -> InterpretedField {
    let (value, raw_value) = normalize(field.value);
    InterpretedField {
        name: field.name,
        enterprise_id: field.enterprise_id,
        field_id: field.field_id,
        value,
        raw_value,
    }
}

/// Все data records сообщения → партия записей для вывода.
pub fn convert_message(msg: &Message, interpreter: &Interpreter) -> Batch {
    msg.data_records
        .iter()
        .map(|record| InterpretedRecord {
            export_time: msg.header.export_time,
            template_id: record.template_id,
            fields: interpreter
                .interpret(record)
                .into_iter()
                .map(convert_field)
                .collect(),
        })
        .collect()
}
