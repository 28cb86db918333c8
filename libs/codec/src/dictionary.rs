use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DictionaryError;
use crate::types::FieldType;
use crate::types::FieldType as F;

/// Имя и тип information element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub name: String,
    pub field_type: FieldType,
}

/// (enterprise id, field id) → information element.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<(u32, u16), DictionaryEntry>,
}

impl Dictionary {
    /// Пустой словарь: все поля неизвестны.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Словарь с основными IANA information elements.
    pub fn builtin() -> Self {
        let mut dict = Self::empty();
        for &(id, name, field_type) in IANA_ELEMENTS {
            dict.insert(0, id, name, field_type);
        }
        dict
    }

    pub fn insert(&mut self, enterprise_id: u32, field_id: u16, name: impl Into<String>, field_type: FieldType) {
        self.entries.insert(
            (enterprise_id, field_id),
            DictionaryEntry { name: name.into(), field_type },
        );
    }

    pub fn get(&self, enterprise_id: u32, field_id: u16) -> Option<&DictionaryEntry> {
        self.entries.get(&(enterprise_id, field_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Добавить записи из TOML файла словаря. Записи с тем же ключом
    /// заменяются. Возвращает число прочитанных записей.
    ///
    /// ```toml
    /// [[field]]
    /// name = "proceraApplication"
    /// enterprise = 15397
    /// id = 1
    /// type = "string"
    /// ```
    pub fn load_file(&mut self, path: &Path) -> Result<usize, DictionaryError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DictionaryError::Read { path: display.clone(), source: e })?;
        self.load_str(&content)
            .map_err(|e| match e {
                DictionaryError::Parse { source, .. } => DictionaryError::Parse { path: display, source },
                other => other,
            })
    }

    pub fn load_str(&mut self, content: &str) -> Result<usize, DictionaryError> {
        let file: DictionaryFile = toml::from_str(content)
            .map_err(|e| DictionaryError::Parse { path: String::new(), source: e })?;

        for entry in &file.field {
            if entry.name.trim().is_empty() {
                return Err(DictionaryError::Entry {
                    name: format!("{}:{}", entry.enterprise, entry.id),
                    detail: "empty name".into(),
                });
            }
            if entry.id & 0x8000 != 0 {
                return Err(DictionaryError::Entry {
                    name: entry.name.clone(),
                    detail: format!("field id {} out of range (max 32767)", entry.id),
                });
            }
        }

        let count = file.field.len();
        for entry in file.field {
            self.insert(entry.enterprise, entry.id, entry.name, entry.field_type);
        }
        Ok(count)
    }
}

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    field: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    name: String,
    #[serde(default)]
    enterprise: u32,
    id: u16,
    #[serde(rename = "type")]
    field_type: FieldType,
}

// ═══════════════════════════════════════════════════════════════
//  IANA information elements (enterprise 0)
// ═══════════════════════════════════════════════════════════════

const IANA_ELEMENTS: &[(u16, &str, FieldType)] = &[
    (1, "octetDeltaCount", F::Unsigned64),
    (2, "packetDeltaCount", F::Unsigned64),
    (3, "deltaFlowCount", F::Unsigned64),
    (4, "protocolIdentifier", F::Unsigned8),
    (5, "ipClassOfService", F::Unsigned8),
    (6, "tcpControlBits", F::Unsigned16),
    (7, "sourceTransportPort", F::Unsigned16),
    (8, "sourceIPv4Address", F::Ipv4Address),
    (9, "sourceIPv4PrefixLength", F::Unsigned8),
    (10, "ingressInterface", F::Unsigned32),
    (11, "destinationTransportPort", F::Unsigned16),
    (12, "destinationIPv4Address", F::Ipv4Address),
    (13, "destinationIPv4PrefixLength", F::Unsigned8),
    (14, "egressInterface", F::Unsigned32),
    (15, "ipNextHopIPv4Address", F::Ipv4Address),
    (16, "bgpSourceAsNumber", F::Unsigned32),
    (17, "bgpDestinationAsNumber", F::Unsigned32),
    (18, "bgpNextHopIPv4Address", F::Ipv4Address),
    (21, "flowEndSysUpTime", F::Unsigned32),
    (22, "flowStartSysUpTime", F::Unsigned32),
    (27, "sourceIPv6Address", F::Ipv6Address),
    (28, "destinationIPv6Address", F::Ipv6Address),
    (29, "sourceIPv6PrefixLength", F::Unsigned8),
    (30, "destinationIPv6PrefixLength", F::Unsigned8),
    (31, "flowLabelIPv6", F::Unsigned32),
    (32, "icmpTypeCodeIPv4", F::Unsigned16),
    (40, "exportedOctetTotalCount", F::Unsigned64),
    (41, "exportedMessageTotalCount", F::Unsigned64),
    (42, "exportedFlowRecordTotalCount", F::Unsigned64),
    (52, "minimumTTL", F::Unsigned8),
    (53, "maximumTTL", F::Unsigned8),
    (56, "sourceMacAddress", F::MacAddress),
    (57, "postDestinationMacAddress", F::MacAddress),
    (58, "vlanId", F::Unsigned16),
    (60, "ipVersion", F::Unsigned8),
    (61, "flowDirection", F::Unsigned8),
    (62, "ipNextHopIPv6Address", F::Ipv6Address),
    (80, "destinationMacAddress", F::MacAddress),
    (81, "postSourceMacAddress", F::MacAddress),
    (82, "interfaceName", F::String),
    (83, "interfaceDescription", F::String),
    (85, "octetTotalCount", F::Unsigned64),
    (86, "packetTotalCount", F::Unsigned64),
    (136, "flowEndReason", F::Unsigned8),
    (138, "observationPointId", F::Unsigned64),
    (139, "icmpTypeCodeIPv6", F::Unsigned16),
    (144, "exportingProcessId", F::Unsigned32),
    (148, "flowId", F::Unsigned64),
    (149, "observationDomainId", F::Unsigned32),
    (150, "flowStartSeconds", F::DateTimeSeconds),
    (151, "flowEndSeconds", F::DateTimeSeconds),
    (152, "flowStartMilliseconds", F::DateTimeMilliseconds),
    (153, "flowEndMilliseconds", F::DateTimeMilliseconds),
    (154, "flowStartMicroseconds", F::DateTimeMicroseconds),
    (155, "flowEndMicroseconds", F::DateTimeMicroseconds),
    (156, "flowStartNanoseconds", F::DateTimeNanoseconds),
    (157, "flowEndNanoseconds", F::DateTimeNanoseconds),
    (160, "systemInitTimeMilliseconds", F::DateTimeMilliseconds),
    (176, "icmpTypeIPv4", F::Unsigned8),
    (177, "icmpCodeIPv4", F::Unsigned8),
    (178, "icmpTypeIPv6", F::Unsigned8),
    (179, "icmpCodeIPv6", F::Unsigned8),
    (180, "udpSourcePort", F::Unsigned16),
    (181, "udpDestinationPort", F::Unsigned16),
    (182, "tcpSourcePort", F::Unsigned16),
    (183, "tcpDestinationPort", F::Unsigned16),
    (210, "paddingOctets", F::OctetArray),
    (225, "postNATSourceIPv4Address", F::Ipv4Address),
    (226, "postNATDestinationIPv4Address", F::Ipv4Address),
    (227, "postNAPTSourceTransportPort", F::Unsigned16),
    (228, "postNAPTDestinationTransportPort", F::Unsigned16),
    (239, "biflowDirection", F::Unsigned8),
    (276, "dataRecordsReliability", F::Boolean),
];

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_knows_common_elements() {
        let dict = Dictionary::builtin();
        let e = dict.get(0, 8).unwrap();
        assert_eq!(e.name, "sourceIPv4Address");
        assert_eq!(e.field_type, FieldType::Ipv4Address);
        assert!(dict.get(15397, 1).is_none());
    }

    #[test]
    fn load_adds_enterprise_entries() {
        let mut dict = Dictionary::builtin();
        let before = dict.len();
        let n = dict
            .load_str(
                r#"
                [[field]]
                name = "proceraApplication"
                enterprise = 15397
                id = 1
                type = "string"

                [[field]]
                name = "proceraIncomingOctets"
                enterprise = 15397
                id = 2
                type = "unsigned64"
                "#,
            )
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(dict.len(), before + 2);
        assert_eq!(dict.get(15397, 2).unwrap().field_type, FieldType::Unsigned64);
    }

    #[test]
    fn load_overrides_builtin() {
        let mut dict = Dictionary::builtin();
        dict.load_str("[[field]]\nname = \"myPort\"\nid = 7\ntype = \"octetArray\"\n")
            .unwrap();
        let e = dict.get(0, 7).unwrap();
        assert_eq!(e.name, "myPort");
        assert_eq!(e.field_type, FieldType::OctetArray);
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        let mut dict = Dictionary::empty();
        let err = dict
            .load_str("[[field]]\nname = \"x\"\nid = 1\ntype = \"complex\"\n")
            .unwrap_err();
        assert!(matches!(err, DictionaryError::Parse { .. }));
    }

    #[test]
    fn rejects_enterprise_bit_in_id() {
        let mut dict = Dictionary::empty();
        let err = dict
            .load_str("[[field]]\nname = \"x\"\nid = 40000\ntype = \"string\"\n")
            .unwrap_err();
        assert!(matches!(err, DictionaryError::Entry { .. }));
        assert!(dict.is_empty());
    }

    #[test]
    fn load_file_reports_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "not toml [").unwrap();
        let mut dict = Dictionary::empty();
        let err = dict.load_file(f.path()).unwrap_err();
        match err {
            DictionaryError::Parse { path, .. } => assert_eq!(path, f.path().display().to_string()),
            other => panic!("unexpected error: {other}"),
        }

        let missing = dict.load_file(Path::new("/nonexistent/dict.toml")).unwrap_err();
        assert!(matches!(missing, DictionaryError::Read { .. }));
    }
}
