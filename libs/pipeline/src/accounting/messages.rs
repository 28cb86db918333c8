use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::record::InterpretedRecord;

/// Счётчики сообщений и записей за текущее окно.
#[derive(Debug)]
pub struct MessageStats {
    messages: u64,
    records: u64,
    per_template: BTreeMap<u16, u64>,
    max_export_delay: Option<i64>,
    window_start: Instant,
}

impl MessageStats {
    pub fn new() -> Self {
        Self {
            messages: 0,
            records: 0,
            per_template: BTreeMap::new(),
            max_export_delay: None,
            window_start: Instant::now(),
        }
    }

    /// Учесть одну партию (= одно сообщение). `now_unix` нужен для
    /// задержки экспорта: wall clock минус export time записи.
    pub fn observe(&mut self, batch: &[InterpretedRecord], now_unix: i64) {
        self.messages += 1;
        self.records += batch.len() as u64;
        for rec in batch {
            *self.per_template.entry(rec.template_id).or_default() += 1;
            let delay = now_unix - rec.export_time as i64;
            self.max_export_delay = Some(self.max_export_delay.map_or(delay, |d| d.max(delay)));
        }
    }

    /// Снять итог окна и начать новое.
    pub fn flush(&mut self) -> MessageSummary {
        let now = Instant::now();
        let summary = MessageSummary {
            window: now.duration_since(self.window_start),
            messages: self.messages,
            records: self.records,
            per_template: std::mem::take(&mut self.per_template),
            max_export_delay: self.max_export_delay,
        };
        self.messages = 0;
        self.records = 0;
        self.max_export_delay = None;
        self.window_start = now;
        summary
    }
}

impl Default for MessageStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageSummary {
    pub window: Duration,
    pub messages: u64,
    pub records: u64,
    pub per_template: BTreeMap<u16, u64>,
    /// Секунды; `None` если записей в окне не было.
    pub max_export_delay: Option<i64>,
}

impl MessageSummary {
    pub fn records_per_sec(&self) -> f64 {
        per_sec(self.records, self.window)
    }

    pub fn messages_per_sec(&self) -> f64 {
        per_sec(self.messages, self.window)
    }
}

impl fmt::Display for MessageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} msgs ({:.1}/s), {} recs ({:.1}/s) in {:.0}s",
            self.messages,
            self.messages_per_sec(),
            self.records,
            self.records_per_sec(),
            self.window.as_secs_f64()
        )?;
        if !self.per_template.is_empty() {
            let templates: Vec<String> = self
                .per_template
                .iter()
                .map(|(id, n)| format!("{id}={n}"))
                .collect();
            write!(f, "; templates {}", templates.join(" "))?;
        }
        if let Some(delay) = self.max_export_delay {
            write!(f, "; max export delay {delay}s")?;
        }
        Ok(())
    }
}

pub(crate) fn per_sec(count: u64, window: Duration) -> f64 {
    let secs = window.as_secs_f64();
    if secs > 0.0 { count as f64 / secs } else { 0.0 }
}
