use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use flow_codec::{Interpreter, MessageSource};

use crate::accounting::Accounting;
use crate::emit::Emitter;
use crate::pump::{Delivery, PumpSummary, spawn_pump};
use crate::PipelineError;

/// Что делать с принятыми партиями.
#[derive(Debug, Clone)]
pub struct Options {
    /// Писать записи в output.
    pub output: bool,
    pub message_stats: bool,
    pub traffic_stats: bool,
    /// Сколько потоков показывать в итоге traffic статистики.
    pub top_flows: usize,
    /// Период flush статистики, должен быть > 0.
    pub stats_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output: true,
            message_stats: false,
            traffic_stats: false,
            top_flows: 10,
            stats_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: u64,
    pub records: u64,
    pub emitted: u64,
    /// Сколько раз сработал interval timer.
    pub ticks: u64,
    pub interrupted: bool,
    /// `None`, если pump не дождались (прерывание).
    pub pump: Option<PumpSummary>,
}

// ═══════════════════════════════════════════════════════════════
//  Consumer loop — batches + interval tick + cancellation
// ═══════════════════════════════════════════════════════════════

/// Главный цикл: ждёт либо партию, либо tick, либо отмену.
///
/// Accounting и вывод выполняются последовательно в этом task'е,
/// поэтому агрегатам не нужны блокировки. Выход — по закрытию канала
/// или по отмене; на выходе незакрытое окно статистики сбрасывается.
pub async fn consume<W: Write>(
    rx: &mut mpsc::Receiver<Delivery>,
    stats_interval: Duration,
    accounting: &mut Accounting,
    mut emitter: Option<&mut Emitter<W>>,
    token: &CancellationToken,
) -> Result<RunSummary, PipelineError> {
    let mut summary = RunSummary::default();

    // Первый tick через полный период, а не сразу.
    let mut ticker = tokio::time::interval_at(Instant::now() + stats_interval, stats_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            delivery = rx.recv() => {
                let Some(delivery) = delivery else { break };
                let batch = delivery.accept();
                summary.batches += 1;
                summary.records += batch.len() as u64;

                accounting.observe(&batch);
                if let Some(emitter) = emitter.as_mut() {
                    emitter.emit_batch(&batch)?;
                }
            }
            _ = ticker.tick() => {
                summary.ticks += 1;
                accounting.flush();
            }
            _ = token.cancelled() => {
                tracing::info!("cancellation requested");
                summary.interrupted = true;
                break;
            }
        }
    }

    if accounting.is_enabled() {
        accounting.flush();
    }
    summary.emitted = emitter.map_or(0, |e| e.emitted());
    Ok(summary)
}

/// Запустить весь pipeline: pump task + consumer loop в текущем task'е.
///
/// Передача без буфера: pump ждёт приёма каждой партии и не уходит
/// вперёд больше чем на одну партию. Ошибка pump'а (испорченный поток)
/// возвращается отсюда после того, как consumer увидел закрытие канала.
pub async fn run<S, W>(
    source: S,
    interpreter: Arc<Interpreter>,
    opts: &Options,
    out: W,
    token: CancellationToken,
) -> Result<RunSummary, PipelineError>
where
    S: MessageSource + 'static,
    W: Write,
{
    let (tx, mut rx) = mpsc::channel::<Delivery>(1);
    let pump = spawn_pump(source, interpreter, tx);

    let mut accounting = Accounting::new(opts.message_stats, opts.traffic_stats, opts.top_flows);
    let mut emitter = opts.output.then(|| Emitter::new(out));

    let mut summary = consume(&mut rx, opts.stats_interval, &mut accounting, emitter.as_mut(), &token).await?;

    if summary.interrupted {
        // Pump может висеть на чтении stdin — не ждём его.
        return Ok(summary);
    }

    let pump_summary = pump.await??;
    summary.pump = Some(pump_summary);
    tracing::info!(
        messages = pump_summary.messages,
        records = pump_summary.records,
        decode_errors = pump_summary.decode_errors,
        emitted = summary.emitted,
        "stream finished"
    );
    Ok(summary)
}
