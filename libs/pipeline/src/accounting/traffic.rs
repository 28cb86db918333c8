use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use tokio::time::Instant;

use crate::accounting::messages::per_sec;
use crate::record::{InterpretedField, InterpretedRecord};

// IANA information element ids used for volume accounting.
const OCTET_DELTA_COUNT: u16 = 1;
const PACKET_DELTA_COUNT: u16 = 2;
const PROTOCOL_IDENTIFIER: u16 = 4;
const SOURCE_TRANSPORT_PORT: u16 = 7;
const SOURCE_IPV4_ADDRESS: u16 = 8;
const DESTINATION_TRANSPORT_PORT: u16 = 11;
const DESTINATION_IPV4_ADDRESS: u16 = 12;
const SOURCE_IPV6_ADDRESS: u16 = 27;
const DESTINATION_IPV6_ADDRESS: u16 = 28;
const OCTET_TOTAL_COUNT: u16 = 85;
const PACKET_TOTAL_COUNT: u16 = 86;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub src: IpAddr,
    pub dst: IpAddr,
    pub protocol: u8,
    pub src_port: u16,
    pub dst_port: u16,
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} proto {}",
            std::net::SocketAddr::new(self.src, self.src_port),
            std::net::SocketAddr::new(self.dst, self.dst_port),
            self.protocol
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    pub octets: u64,
    pub packets: u64,
}

impl Volume {
    fn add(&mut self, other: Volume) {
        self.octets = self.octets.saturating_add(other.octets);
        self.packets = self.packets.saturating_add(other.packets);
    }
}

/// Объём трафика по 5-tuple за текущее окно.
#[derive(Debug)]
pub struct TrafficStats {
    flows: HashMap<FlowKey, Volume>,
    unattributed: Volume,
    records: u64,
    top: usize,
    window_start: Instant,
}

impl TrafficStats {
    /// `top` — сколько самых тяжёлых потоков попадает в итог окна.
    pub fn new(top: usize) -> Self {
        Self {
            flows: HashMap::new(),
            unattributed: Volume::default(),
            records: 0,
            top,
            window_start: Instant::now(),
        }
    }

    pub fn observe(&mut self, rec: &InterpretedRecord) {
        self.records += 1;
        let volume = Volume {
            octets: counter(rec, OCTET_DELTA_COUNT, OCTET_TOTAL_COUNT),
            packets: counter(rec, PACKET_DELTA_COUNT, PACKET_TOTAL_COUNT),
        };
        match flow_key(rec) {
            Some(key) => self.flows.entry(key).or_default().add(volume),
            None => self.unattributed.add(volume),
        }
    }

    pub fn flush(&mut self) -> TrafficSummary {
        let now = Instant::now();
        let flows = std::mem::take(&mut self.flows);

        let mut total = self.unattributed;
        for v in flows.values() {
            total.add(*v);
        }

        let mut ranked: Vec<(FlowKey, Volume)> = flows.into_iter().collect();
        ranked.sort_by(|a, b| b.1.octets.cmp(&a.1.octets).then_with(|| a.0.cmp(&b.0)));
        let flow_count = ranked.len();
        ranked.truncate(self.top);

        let summary = TrafficSummary {
            window: now.duration_since(self.window_start),
            records: self.records,
            flows: flow_count,
            total,
            unattributed: self.unattributed,
            top: ranked,
        };
        self.unattributed = Volume::default();
        self.records = 0;
        self.window_start = now;
        summary
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSummary {
    pub window: Duration,
    pub records: u64,
    /// Число различных 5-tuple в окне.
    pub flows: usize,
    pub total: Volume,
    pub unattributed: Volume,
    /// Самые тяжёлые потоки по октетам, по убыванию.
    pub top: Vec<(FlowKey, Volume)>,
}

impl TrafficSummary {
    pub fn bits_per_sec(&self) -> f64 {
        per_sec(self.total.octets, self.window) * 8.0
    }

    pub fn packets_per_sec(&self) -> f64 {
        per_sec(self.total.packets, self.window)
    }
}

impl fmt::Display for TrafficSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} octets, {} packets in {:.0}s ({:.0} bit/s, {:.1} pkt/s), {} flows",
            self.total.octets,
            self.total.packets,
            self.window.as_secs_f64(),
            self.bits_per_sec(),
            self.packets_per_sec(),
            self.flows
        )?;
        if self.unattributed.octets > 0 || self.unattributed.packets > 0 {
            write!(
                f,
                ", unattributed {} octets {} packets",
                self.unattributed.octets, self.unattributed.packets
            )?;
        }
        for (key, v) in &self.top {
            let rate = per_sec(v.octets, self.window) * 8.0;
            write!(f, "\n  {key}: {} octets, {} packets, {rate:.0} bit/s", v.octets, v.packets)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Field extraction
// ═══════════════════════════════════════════════════════════════

fn counter(rec: &InterpretedRecord, delta_id: u16, total_id: u16) -> u64 {
    rec.standard_field(delta_id)
        .or_else(|| rec.standard_field(total_id))
        .and_then(field_u64)
        .unwrap_or(0)
}

fn flow_key(rec: &InterpretedRecord) -> Option<FlowKey> {
    let src = field_addr(rec, SOURCE_IPV4_ADDRESS, SOURCE_IPV6_ADDRESS)?;
    let dst = field_addr(rec, DESTINATION_IPV4_ADDRESS, DESTINATION_IPV6_ADDRESS)?;
    // Значение вне диапазона не годится в ключ: считаем его нулём.
    let port = |id| {
        rec.standard_field(id)
            .and_then(field_u64)
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(0)
    };
    Some(FlowKey {
        src,
        dst,
        protocol: rec
            .standard_field(PROTOCOL_IDENTIFIER)
            .and_then(field_u64)
            .and_then(|v| u8::try_from(v).ok())
            .unwrap_or(0),
        src_port: port(SOURCE_TRANSPORT_PORT),
        dst_port: port(DESTINATION_TRANSPORT_PORT),
    })
}

/// Число из `value` или, если словарь не знает тип, из `raw_value`.
fn field_u64(field: &InterpretedField) -> Option<u64> {
    if let Some(v) = field.value.as_ref().and_then(|v| v.as_u64()) {
        return Some(v);
    }
    match field.raw_value.as_deref() {
        Some(raw) if raw.len() <= 8 => Some(raw.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)),
        _ => None,
    }
}

fn field_addr(rec: &InterpretedRecord, v4_id: u16, v6_id: u16) -> Option<IpAddr> {
    [v4_id, v6_id]
        .into_iter()
        .filter_map(|id| rec.standard_field(id))
        .find_map(|field| {
            if let Some(text) = field.value.as_ref().and_then(|v| v.as_str()) {
                return text.parse().ok();
            }
            match field.raw_value.as_deref()? {
                raw if raw.len() == 4 => <[u8; 4]>::try_from(raw).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
                raw if raw.len() == 16 => <[u8; 16]>::try_from(raw).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
                _ => None,
            }
        })
}
