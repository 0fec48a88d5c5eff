use crate::models::{DetectionEvent, Domain, EventOrigin, SeverityLevel};
use serde::{Deserialize, Serialize};

/// Labels that must never raise an alert, shared by every domain by default
pub const DEFAULT_NORMAL_PATTERNS: &[&str] = &[
    "Scanning network...",
    "Analyzing traffic...",
    "Processing data...",
    "Normal Traffic",
    "Benign",
    "No threats detected",
    "Normal",
    "BENIGN",
];

/// Keyword table for one detection domain.
///
/// Matching is a case-insensitive substring test. Overlapping keywords
/// between tiers or domains (`ddos` is critical everywhere) are kept as
/// configured; the tier order decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub normal: Vec<String>,
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
}

impl KeywordTable {
    pub fn default_for(domain: Domain) -> Self {
        let (critical, high, medium): (&[&str], &[&str], &[&str]) = match domain {
            Domain::Iot => (
                &["mirai", "ddos", "okiru-attack"],
                &["torii", "filedownload", "botnet"],
                &["heartbeat", "exploit"],
            ),
            Domain::Cyber => (
                &["dos hulk", "ddos", "heartbleed"],
                &["goldeneye", "web attack", "infiltration", "botnet"],
                &["slowloris", "portscan", "brute force"],
            ),
            Domain::Traditional => (&["dos", "ddos"], &["r2l", "u2r"], &["probe"]),
        };

        Self {
            normal: to_owned(DEFAULT_NORMAL_PATTERNS),
            critical: to_owned(critical),
            high: to_owned(high),
            medium: to_owned(medium),
        }
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Lowercased copy of a table, blank entries removed (an empty keyword would match everything)
#[derive(Debug, Clone)]
struct CompiledTable {
    normal: Vec<String>,
    tiers: [(SeverityLevel, Vec<String>); 3],
}

impl CompiledTable {
    fn compile(table: &KeywordTable) -> Self {
        Self {
            normal: lowercase(&table.normal),
            tiers: [
                (SeverityLevel::Critical, lowercase(&table.critical)),
                (SeverityLevel::High, lowercase(&table.high)),
                (SeverityLevel::Medium, lowercase(&table.medium)),
            ],
        }
    }
}

fn lowercase(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Per-domain keyword tables, as read from the `[classifier]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub iot: KeywordTable,
    pub cyber: KeywordTable,
    pub traditional: KeywordTable,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            iot: KeywordTable::default_for(Domain::Iot),
            cyber: KeywordTable::default_for(Domain::Cyber),
            traditional: KeywordTable::default_for(Domain::Traditional),
        }
    }
}

impl ClassifierConfig {
    pub fn table(&self, domain: Domain) -> &KeywordTable {
        match domain {
            Domain::Iot => &self.iot,
            Domain::Cyber => &self.cyber,
            Domain::Traditional => &self.traditional,
        }
    }
}

/// A detection paired with the severity the classifier gave it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    pub event: DetectionEvent,
    pub severity: SeverityLevel,
}

/// Maps raw attack labels to a [`SeverityLevel`] per domain
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    tables: [CompiledTable; 3],
}

impl SeverityClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            tables: Domain::ALL.map(|domain| CompiledTable::compile(config.table(domain))),
        }
    }

    fn table(&self, domain: Domain) -> &CompiledTable {
        &self.tables[domain.index()]
    }

    pub fn is_normal(&self, domain: Domain, label: &str) -> bool {
        let label = label.to_lowercase();
        self.table(domain).normal.iter().any(|p| label.contains(p.as_str()))
    }

    pub fn classify(&self, domain: Domain, label: &str) -> SeverityLevel {
        if label.trim().is_empty() {
            return SeverityLevel::Normal;
        }

        let table = self.table(domain);
        let lowered = label.to_lowercase();

        if table.normal.iter().any(|p| lowered.contains(p.as_str())) {
            return SeverityLevel::Normal;
        }

        for (severity, keywords) in &table.tiers {
            if keywords.iter().any(|k| lowered.contains(k.as_str())) {
                return *severity;
            }
        }

        SeverityLevel::Low
    }

    /// Placeholders keep their own severity, except that a normal-pattern
    /// label is always normal.
    pub fn classify_event(&self, event: &DetectionEvent) -> SeverityLevel {
        match event.origin {
            EventOrigin::Placeholder { severity } => {
                if event.label.trim().is_empty() || self.is_normal(event.domain, &event.label) {
                    SeverityLevel::Normal
                } else {
                    severity
                }
            }
            _ => self.classify(event.domain, &event.label),
        }
    }

    pub fn classify_owned(&self, event: DetectionEvent) -> ClassifiedEvent {
        let severity = self.classify_event(&event);
        ClassifiedEvent { event, severity }
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_patterns_are_normal_in_every_domain() {
        let classifier = SeverityClassifier::default();
        for domain in Domain::ALL {
            for label in DEFAULT_NORMAL_PATTERNS {
                assert_eq!(classifier.classify(domain, label), SeverityLevel::Normal, "{domain}: {label}");
            }
            assert_eq!(classifier.classify(domain, "BENIGN"), SeverityLevel::Normal);
        }
    }

    #[test]
    fn test_critical_wins_over_lower_tiers() {
        let classifier = SeverityClassifier::default();
        // "mirai" is critical, "botnet" is high
        assert_eq!(classifier.classify(Domain::Iot, "Mirai Botnet"), SeverityLevel::Critical);
        // "ddos" is critical, "botnet" is high
        assert_eq!(classifier.classify(Domain::Cyber, "Botnet DDoS"), SeverityLevel::Critical);
        // "dos" is critical, "probe" is medium
        assert_eq!(classifier.classify(Domain::Traditional, "Probe then DoS"), SeverityLevel::Critical);
    }

    #[test]
    fn test_every_critical_keyword_classifies_critical() {
        let config = ClassifierConfig::default();
        let classifier = SeverityClassifier::new(&config);
        for domain in Domain::ALL {
            for keyword in &config.table(domain).critical {
                let label = format!("Detected {} activity", keyword.to_uppercase());
                assert_eq!(classifier.classify(domain, &label), SeverityLevel::Critical);
            }
        }
    }

    #[test]
    fn test_tiers_per_domain() {
        let classifier = SeverityClassifier::default();
        assert_eq!(classifier.classify(Domain::Iot, "C&C-Torii"), SeverityLevel::High);
        assert_eq!(classifier.classify(Domain::Iot, "C&C-HeartBeat"), SeverityLevel::Medium);
        assert_eq!(classifier.classify(Domain::Cyber, "DoS GoldenEye"), SeverityLevel::High);
        assert_eq!(classifier.classify(Domain::Cyber, "PortScan"), SeverityLevel::Medium);
        assert_eq!(classifier.classify(Domain::Traditional, "U2R"), SeverityLevel::High);
        assert_eq!(classifier.classify(Domain::Traditional, "Probe"), SeverityLevel::Medium);
    }

    #[test]
    fn test_unknown_label_is_low_and_empty_is_normal() {
        let classifier = SeverityClassifier::default();
        assert_eq!(classifier.classify(Domain::Iot, "PartOfAHorizontalPortScan"), SeverityLevel::Low);
        assert_eq!(classifier.classify(Domain::Cyber, ""), SeverityLevel::Normal);
        assert_eq!(classifier.classify(Domain::Cyber, "   "), SeverityLevel::Normal);
    }

    #[test]
    fn test_placeholder_keeps_its_severity() {
        let classifier = SeverityClassifier::default();
        let event = DetectionEvent::placeholder(
            Domain::Iot,
            "ALERT: IoT security breach detected. Connection compromised.",
            SeverityLevel::Critical,
            "10:00:00",
        );
        assert_eq!(classifier.classify_event(&event), SeverityLevel::Critical);

        let benign = DetectionEvent::placeholder(Domain::Iot, "Benign", SeverityLevel::Critical, "10:00:00");
        assert_eq!(classifier.classify_event(&benign), SeverityLevel::Normal);
    }

    #[test]
    fn test_blank_configured_keyword_is_ignored() {
        let mut config = ClassifierConfig::default();
        config.iot.critical.push("  ".to_string());
        let classifier = SeverityClassifier::new(&config);
        assert_eq!(classifier.classify(Domain::Iot, "Something new"), SeverityLevel::Low);
    }

    #[test]
    fn test_custom_table_overrides_defaults() {
        let mut config = ClassifierConfig::default();
        config.traditional.high.push("smurf".to_string());
        let classifier = SeverityClassifier::new(&config);
        assert_eq!(classifier.classify(Domain::Traditional, "Smurf"), SeverityLevel::High);
        assert_eq!(classifier.classify(Domain::Iot, "Smurf"), SeverityLevel::Low);
    }
}
