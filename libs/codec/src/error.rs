/// Категория ошибки декодирования: годен ли поток дальше (пропустить
/// сообщение) или нет.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Ошибка чтения или обрезанный вход.
    Io,
    /// Битое содержимое сообщения, сам поток выровнен.
    Format,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
        }
    }
}

/// Ошибка чтения или декодирования одного IPFIX сообщения.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("read: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated message: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("unsupported version {0} (expected 10)")]
    Version(u16),

    #[error("bad message length {0}")]
    MessageLength(u16),

    #[error("bad set length {length} for set {set_id}")]
    SetLength { set_id: u16, length: u16 },

    #[error("malformed template {template_id}: {detail}")]
    Template { template_id: u16, detail: String },

    #[error("unknown template {template_id} in domain {domain}")]
    UnknownTemplate { domain: u32, template_id: u16 },

    #[error("short data record for template {template_id}")]
    ShortRecord { template_id: u16 },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Io(_) | DecodeError::Truncated { .. } => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }
}

/// Ошибка загрузки файла словаря.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("read '{path}': {source}")]
    Read { path: String, source: std::io::Error },

    #[error("parse '{path}': {source}")]
    Parse { path: String, source: toml::de::Error },

    #[error("entry '{name}': {detail}")]
    Entry { name: String, detail: String },
}
