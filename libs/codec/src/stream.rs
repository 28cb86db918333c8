use std::io::{ErrorKind as IoErrorKind, Read};

use crate::error::DecodeError;
use crate::message::{HEADER_LEN, Message, MessageHeader};
use crate::session::Session;

/// Источник декодированных сообщений, по одному за вызов.
///
/// `Ok(None)` — поток чисто закончился на границе сообщения.
pub trait MessageSource: Send {
    fn next_message(&mut self) -> Result<Option<Message>, DecodeError>;
}

/// Читает IPFIX сообщения из байтового потока и декодирует их в
/// session, которая живёт столько же, сколько поток.
pub struct StreamDecoder<R> {
    reader: R,
    session: Session,
    body: Vec<u8>,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_session(reader, Session::new())
    }

    pub fn with_session(reader: R, session: Session) -> Self {
        Self {
            reader,
            session,
            body: Vec::with_capacity(u16::MAX as usize),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Прочитать и декодировать одно сообщение.
    ///
    /// Сообщение вычитывается целиком до проверки, поэтому битое
    /// сообщение с корректной длиной оставляет поток на следующем
    /// заголовке.
    pub fn read_message(&mut self) -> Result<Option<Message>, DecodeError> {
        let mut hdr = [0u8; HEADER_LEN];
        let got = read_full(&mut self.reader, &mut hdr)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_LEN {
            return Err(DecodeError::Truncated { expected: HEADER_LEN, got });
        }

        let header = MessageHeader::parse(&hdr)?;
        let body_len = header.body_len();
        self.body.resize(body_len, 0);
        let got = read_full(&mut self.reader, &mut self.body)?;
        if got < body_len {
            return Err(DecodeError::Truncated { expected: body_len, got });
        }

        self.session.decode(header, &self.body).map(Some)
    }
}

impl<R: Read + Send> MessageSource for StreamDecoder<R> {
    fn next_message(&mut self) -> Result<Option<Message>, DecodeError> {
        self.read_message()
    }
}

/// Заполнить `buf`, если раньше не наступил EOF; возвращает число прочитанных байт.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
