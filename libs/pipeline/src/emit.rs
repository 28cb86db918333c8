use std::io::Write;

use crate::record::InterpretedRecord;
use crate::PipelineError;

/// Пишет записи как JSON lines.
///
/// Ошибка записи или сериализации фатальна: возвращается вызывающему,
/// запись не пропускается молча.
pub struct Emitter<W: Write> {
    writer: W,
    emitted: u64,
}

impl<W: Write> Emitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, emitted: 0 }
    }

    pub fn emit(&mut self, record: &InterpretedRecord) -> Result<(), PipelineError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.emitted += 1;
        Ok(())
    }

    /// Записать партию и сбросить буфер.
    pub fn emit_batch(&mut self, batch: &[InterpretedRecord]) -> Result<(), PipelineError> {
        for record in batch {
            self.emit(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::record::{FieldValue, InterpretedField};

    fn rec(template_id: u16) -> InterpretedRecord {
        InterpretedRecord {
            export_time: 10,
            template_id,
            fields: vec![InterpretedField {
                name: "protocolIdentifier".into(),
                enterprise_id: 0,
                field_id: 4,
                value: Some(FieldValue::Unsigned(17)),
                raw_value: None,
            }],
        }
    }

    #[test]
    fn one_line_per_record_in_order() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.emit_batch(&[rec(256), rec(257)]).unwrap();
        assert_eq!(emitter.emitted(), 2);

        let out = String::from_utf8(emitter.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"exportTime":10,"templateId":256,"fields":[{"name":"protocolIdentifier","field":4,"value":17}]}"#
        );
        assert!(lines[1].contains(r#""templateId":257"#));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_returned() {
        let mut emitter = Emitter::new(BrokenPipe);
        assert!(emitter.emit_batch(&[rec(256)]).is_err());
        assert_eq!(emitter.emitted(), 0);
    }
}
