mod messages;
mod traffic;

pub use messages::{MessageStats, MessageSummary};
pub use traffic::{FlowKey, TrafficStats, TrafficSummary, Volume};

use crate::record::InterpretedRecord;

/// Агрегаты статистики, принадлежащие consumer loop'у.
///
/// Создаётся при старте, сбрасывается на каждом flush, живёт до выхода.
/// Каждый агрегат включается отдельно.
#[derive(Debug)]
pub struct Accounting {
    messages: Option<MessageStats>,
    traffic: Option<TrafficStats>,
}

/// Итог одного окна по включённым агрегатам.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub messages: Option<MessageSummary>,
    pub traffic: Option<TrafficSummary>,
}

impl Accounting {
    pub fn new(message_stats: bool, traffic_stats: bool, top_flows: usize) -> Self {
        Self {
            messages: message_stats.then(MessageStats::new),
            traffic: traffic_stats.then(|| TrafficStats::new(top_flows)),
        }
    }

    pub fn disabled() -> Self {
        Self { messages: None, traffic: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.messages.is_some() || self.traffic.is_some()
    }

    pub fn observe(&mut self, batch: &[InterpretedRecord]) {
        if let Some(stats) = &mut self.messages {
            stats.observe(batch, unix_now());
        }
        if let Some(stats) = &mut self.traffic {
            for rec in batch {
                stats.observe(rec);
            }
        }
    }

    /// Залогировать и сбросить все включённые агрегаты. Пустое окно
    /// тоже логируется (нулевой итог).
    pub fn flush(&mut self) -> WindowReport {
        let messages = self.messages.as_mut().map(|s| s.flush());
        let traffic = self.traffic.as_mut().map(|s| s.flush());

        if let Some(s) = &messages {
            tracing::info!(
                messages = s.messages,
                records = s.records,
                window_s = s.window.as_secs(),
                "message statistics: {s}"
            );
        }
        if let Some(s) = &traffic {
            tracing::info!(
                octets = s.total.octets,
                packets = s.total.packets,
                flows = s.flows,
                window_s = s.window.as_secs(),
                "traffic: {s}"
            );
        }

        WindowReport { messages, traffic }
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_still_reports() {
        let mut acc = Accounting::new(true, true, 10);
        let report = acc.flush();

        let m = report.messages.unwrap();
        assert_eq!((m.messages, m.records), (0, 0));
        let t = report.traffic.unwrap();
        assert_eq!(t.total, Volume::default());
        assert_eq!(t.flows, 0);
    }

    #[test]
    fn disabled_aggregates_report_nothing() {
        let mut acc = Accounting::new(false, true, 10);
        acc.observe(&[InterpretedRecord { export_time: 0, template_id: 256, fields: Vec::new() }]);
        let report = acc.flush();
        assert!(report.messages.is_none());
        assert_eq!(report.traffic.unwrap().records, 1);

        let mut off = Accounting::disabled();
        assert!(!off.is_enabled());
        assert_eq!(off.flush(), WindowReport { messages: None, traffic: None });
    }
}
