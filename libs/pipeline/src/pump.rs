use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use flow_codec::{Interpreter, MessageSource};

use crate::convert::convert_message;
use crate::record::Batch;
use crate::PipelineError;

/// Сколько ошибок декодирования подряд допускается до признания
/// потока испорченным.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    pub messages: u64,
    pub records: u64,
    pub decode_errors: u64,
}

/// Партия в пути от pump'а к consumer'у.
///
/// Pump ждёт, пока consumer не примет партию, поэтому передача без
/// буфера: впереди consumer'а не больше одной партии.
#[derive(Debug)]
pub struct Delivery {
    batch: Batch,
    ack: oneshot::Sender<()>,
}

impl Delivery {
    pub fn new(batch: Batch) -> (Self, oneshot::Receiver<()>) {
        let (ack, accepted) = oneshot::channel();
        (Self { batch, ack }, accepted)
    }

    /// Забрать партию и отпустить pump.
    pub fn accept(self) -> Batch {
        // Pump мог уже завершиться.
        let _ = self.ack.send(());
        self.batch
    }
}

// ═══════════════════════════════════════════════════════════════
//  Pump task — source → decode → convert → channel
// ═══════════════════════════════════════════════════════════════

/// Запустить pump в blocking-пуле: чтение и декодирование блокирующие.
///
/// Канал закрывается, когда task завершается (drop sender'а).
pub fn spawn_pump<S>(
    source: S,
    interpreter: Arc<Interpreter>,
    tx: mpsc::Sender<Delivery>,
) -> JoinHandle<Result<PumpSummary, PipelineError>>
where
    S: MessageSource + 'static,
{
    tokio::task::spawn_blocking(move || run_pump(source, &interpreter, &tx))
}

/// Цикл pump'а. Возвращает `Ok` на конце потока или если consumer ушёл,
/// `Err(StreamCorrupt)` когда ошибок подряд больше `MAX_CONSECUTIVE_ERRORS`.
///
/// Должен вызываться вне async контекста (`blocking_send`).
pub fn run_pump<S: MessageSource>(
    mut source: S,
    interpreter: &Interpreter,
    tx: &mpsc::Sender<Delivery>,
) -> Result<PumpSummary, PipelineError> {
    let mut summary = PumpSummary::default();
    let mut consecutive = 0u32;

    loop {
        let msg = match source.next_message() {
            Ok(Some(msg)) => {
                consecutive = 0;
                msg
            }
            Ok(None) => {
                tracing::info!(
                    messages = summary.messages,
                    records = summary.records,
                    decode_errors = summary.decode_errors,
                    "end of stream"
                );
                return Ok(summary);
            }
            Err(e) => {
                consecutive += 1;
                summary.decode_errors += 1;
                if consecutive > MAX_CONSECUTIVE_ERRORS {
                    tracing::error!(error = %e, kind = %e.kind(), consecutive, "too many decode errors in a row");
                    return Err(PipelineError::StreamCorrupt { errors: consecutive, last: e });
                }
                tracing::warn!(error = %e, kind = %e.kind(), consecutive, "decode error, skipping message");
                continue;
            }
        };

        let batch = convert_message(&msg, interpreter);
        summary.messages += 1;
        summary.records += batch.len() as u64;

        // Back-pressure: ждём, пока consumer примет именно эту партию.
        let (delivery, accepted) = Delivery::new(batch);
        if tx.blocking_send(delivery).is_err() || accepted.blocking_recv().is_err() {
            tracing::info!("consumer closed, stopping pump");
            return Ok(summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use flow_codec::{DataRecord, DecodeError, Message, MessageHeader, RawField};

    use super::*;

    fn message(records: usize) -> Message {
        Message {
            header: MessageHeader {
                version: 10,
                length: 0,
                export_time: 1_700_000_000,
                sequence_number: 0,
                observation_domain_id: 0,
            },
            data_records: (0..records)
                .map(|i| DataRecord {
                    template_id: 256,
                    fields: vec![RawField { enterprise_id: 0, field_id: 4, bytes: vec![i as u8] }],
                })
                .collect(),
        }
    }

    enum Step {
        Msg(usize),
        Fail,
    }

    /// Отдаёт заранее заданную последовательность сообщений и ошибок.
    struct Scripted {
        steps: VecDeque<Step>,
        reads: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Self {
            Self { steps: steps.into(), reads: Arc::new(AtomicUsize::new(0)) }
        }
    }

    impl MessageSource for Scripted {
        fn next_message(&mut self) -> Result<Option<Message>, DecodeError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match self.steps.pop_front() {
                None => Ok(None),
                Some(Step::Msg(n)) => Ok(Some(message(n))),
                Some(Step::Fail) => Err(DecodeError::Version(9)),
            }
        }
    }

    /// Прогнать pump в отдельном потоке, принимая все партии.
    fn drain<S: MessageSource + 'static>(source: S) -> (Result<PumpSummary, PipelineError>, Vec<Batch>) {
        let (tx, mut rx) = mpsc::channel(1);
        let pump = std::thread::spawn(move || run_pump(source, &Interpreter::default(), &tx));

        let mut batches = Vec::new();
        while let Some(delivery) = rx.blocking_recv() {
            batches.push(delivery.accept());
        }
        (pump.join().unwrap(), batches)
    }

    #[test]
    fn counter_resets_after_success() {
        use Step::*;
        let source = Scripted::new(vec![Fail, Fail, Fail, Msg(1), Fail, Msg(2)]);

        let (result, batches) = drain(source);
        assert_eq!(result.unwrap(), PumpSummary { messages: 2, records: 3, decode_errors: 4 });
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 2]);
    }

    #[test]
    fn fourth_consecutive_error_is_fatal() {
        use Step::*;
        let source = Scripted::new(vec![Msg(1), Fail, Fail, Fail, Fail, Msg(1)]);
        let reads = source.reads.clone();

        let (result, batches) = drain(source);
        match result.unwrap_err() {
            PipelineError::StreamCorrupt { errors, last } => {
                assert_eq!(errors, 4);
                assert!(matches!(last, DecodeError::Version(9)));
            }
            other => panic!("unexpected error: {other}"),
        }
        // the message after the fourth failure is never read
        assert_eq!(reads.load(Ordering::SeqCst), 5);
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn three_errors_then_eof_is_clean() {
        use Step::*;
        let (result, batches) = drain(Scripted::new(vec![Fail, Fail, Fail]));
        let summary = result.unwrap();
        assert_eq!(summary.decode_errors, 3);
        assert_eq!(summary.messages, 0);
        assert!(batches.is_empty());
    }

    #[test]
    fn empty_messages_are_still_published() {
        let (result, batches) = drain(Scripted::new(vec![Step::Msg(0)]));
        result.unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
    }

    #[test]
    fn stops_when_consumer_is_gone() {
        let source = Scripted::new(vec![Step::Msg(1), Step::Msg(1), Step::Msg(1)]);
        let reads = source.reads.clone();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let summary = run_pump(source, &Interpreter::default(), &tx).unwrap();
        assert_eq!(summary.messages, 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unaccepted_delivery_stops_the_pump() {
        let source = Scripted::new(vec![Step::Msg(1), Step::Msg(1)]);
        let reads = source.reads.clone();
        let (tx, mut rx) = mpsc::channel(1);
        let pump = std::thread::spawn(move || run_pump(source, &Interpreter::default(), &tx));

        // Партию забрали из канала, но не приняли.
        drop(rx.blocking_recv().unwrap());
        let summary = pump.join().unwrap().unwrap();
        assert_eq!(summary.messages, 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocks_on_publish_without_consumer() {
        let source = Scripted::new((0..5).map(|_| Step::Msg(1)).collect());
        let reads = source.reads.clone();
        let (tx, mut rx) = mpsc::channel(1);

        let handle = spawn_pump(source, Arc::new(Interpreter::default()), tx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        // one batch handed off and waiting to be accepted, nothing decoded ahead
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        rx.recv().await.unwrap().accept();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        drop(rx);
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.messages, 2);
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }
}
