//! Декодирование сообщений IPFIX (RFC 7011) и интерпретация полей.

pub mod dictionary;
pub mod error;
pub mod interpreter;
pub mod message;
pub mod session;
pub mod stream;
pub mod template;
pub mod types;

pub use dictionary::{Dictionary, DictionaryEntry};
pub use error::{DecodeError, DictionaryError, ErrorKind};
pub use interpreter::{InterpretedField, Interpreter};
pub use message::{DataRecord, Message, MessageHeader, RawField};
pub use session::Session;
pub use stream::{MessageSource, StreamDecoder};
pub use template::{FieldSpec, Template};
pub use types::{FieldType, Value};
