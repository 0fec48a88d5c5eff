use crate::alerts::SeverityClassifier;
use crate::models::event::display_label;
use crate::models::{DetectionEvent, Domain, SeverityLevel};
use crate::utils::date_format::{TimeRange, parse_event_timestamp};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// One classified log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    #[serde(flatten)]
    pub event: DetectionEvent,
    pub severity: SeverityLevel,
    /// Parsed timestamp, when the service sent one we understand
    pub at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    pub fn display_label(&self) -> String {
        display_label(self.event.domain, &self.event.label)
    }
}

/// Classify raw log events, keeping the order the service served them in
pub fn build_records(events: Vec<DetectionEvent>, classifier: &SeverityClassifier, tz: &Tz) -> Vec<HistoryRecord> {
    events
        .into_iter()
        .map(|event| {
            let severity = classifier.classify_event(&event);
            let at = parse_event_timestamp(&event.timestamp, tz);
            HistoryRecord { event, severity, at }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Exact attack label; `None` keeps every type
    pub attack_type: Option<String>,
    pub range: TimeRange,
    pub min_severity: Option<SeverityLevel>,
}

impl HistoryFilter {
    /// `"all"` (any case) or an empty string means no type filter
    pub fn with_attack_type(mut self, attack_type: Option<&str>) -> Self {
        self.attack_type = attack_type
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        self
    }

    pub fn matches(&self, record: &HistoryRecord) -> bool {
        if let Some(attack_type) = &self.attack_type {
            if &record.event.label != attack_type {
                return false;
            }
        }
        if let Some(min) = self.min_severity {
            if record.severity < min {
                return false;
            }
        }
        if !self.range.is_unbounded() {
            // Entries we cannot place in time never match a date filter
            match record.at {
                Some(at) => return self.range.contains(at),
                None => return false,
            }
        }
        true
    }

    pub fn apply(&self, records: &[HistoryRecord]) -> Vec<HistoryRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

/// Slice out page `page` (1-based, clamped into range)
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        total_pages,
        total_items,
        page_size,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeverityStats {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub normal: usize,
}

impl SeverityStats {
    pub fn count(&self, severity: SeverityLevel) -> usize {
        match severity {
            SeverityLevel::Critical => self.critical,
            SeverityLevel::High => self.high,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::Low => self.low,
            SeverityLevel::Normal => self.normal,
        }
    }

    /// Everything that would have raised an alert
    pub fn threats(&self) -> usize {
        self.total - self.normal
    }
}

pub fn severity_stats(records: &[HistoryRecord]) -> SeverityStats {
    let mut stats = SeverityStats {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        match record.severity {
            SeverityLevel::Critical => stats.critical += 1,
            SeverityLevel::High => stats.high += 1,
            SeverityLevel::Medium => stats.medium += 1,
            SeverityLevel::Low => stats.low += 1,
            SeverityLevel::Normal => stats.normal += 1,
        }
    }
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// The `limit` most frequent labels, most frequent first. Ties go to the
/// label seen first.
pub fn top_distribution(records: &[HistoryRecord], limit: usize) -> Vec<DistributionEntry> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        counts.entry(record.event.label.as_str()).or_insert((0, index)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(label, (count, first_seen))| (label, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let total = records.len().max(1) as f64;
    ranked
        .into_iter()
        .take(limit)
        .map(|(label, count, _)| DistributionEntry {
            label: label.to_string(),
            count,
            percent: count as f64 * 100.0 / total,
        })
        .collect()
}

/// Distinct labels, for the attack-type filter
pub fn attack_types(records: &[HistoryRecord]) -> Vec<String> {
    let mut types: Vec<String> = records.iter().map(|r| r.event.label.clone()).collect();
    types.sort();
    types.dedup();
    types
}

/// Everything the `history` command shows for one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub domain: Domain,
    pub stats: SeverityStats,
    pub distribution: Vec<DistributionEntry>,
    pub page: Page<HistoryRecord>,
}

impl HistoryReport {
    pub fn build(domain: Domain, filtered: &[HistoryRecord], page: usize, page_size: usize) -> Self {
        Self {
            domain,
            stats: severity_stats(filtered),
            distribution: top_distribution(filtered, 5),
            page: paginate(filtered, page, page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventOrigin;

    fn records(labels: &[(&str, &str)]) -> Vec<HistoryRecord> {
        let events = labels
            .iter()
            .map(|(label, ts)| DetectionEvent::new(Domain::Iot, *label, *ts, EventOrigin::History))
            .collect();
        build_records(events, &SeverityClassifier::default(), &Tz::UTC)
    }

    #[test]
    fn test_build_records_classifies_and_parses() {
        let recs = records(&[("Mirai", "2024-03-01 10:00:00"), ("Benign", "garbage")]);
        assert_eq!(recs[0].severity, SeverityLevel::Critical);
        assert!(recs[0].at.is_some());
        assert_eq!(recs[1].severity, SeverityLevel::Normal);
        assert!(recs[1].at.is_none());
    }

    #[test]
    fn test_filter_by_type_and_all() {
        let recs = records(&[("DDoS", ""), ("Mirai", ""), ("DDoS", "")]);
        let filter = HistoryFilter::default().with_attack_type(Some("DDoS"));
        assert_eq!(filter.apply(&recs).len(), 2);

        let all = HistoryFilter::default().with_attack_type(Some("ALL"));
        assert_eq!(all.apply(&recs).len(), 3);
    }

    #[test]
    fn test_date_filter_excludes_undated_entries() {
        let recs = records(&[
            ("DDoS", "2024-03-01 10:00:00"),
            ("DDoS", "2024-03-02 10:00:00"),
            ("DDoS", "unknown"),
        ]);
        let filter = HistoryFilter {
            range: TimeRange::parse(Some("2024-03-01"), Some("2024-03-01"), &Tz::UTC).unwrap(),
            ..Default::default()
        };
        let kept = filter.apply(&recs);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].event.timestamp, "2024-03-01 10:00:00");
    }

    #[test]
    fn test_filter_by_min_severity() {
        let recs = records(&[("Mirai", ""), ("Torii", ""), ("Heartbeat", ""), ("Benign", ""), ("Odd", "")]);
        let filter = HistoryFilter {
            min_severity: Some(SeverityLevel::High),
            ..Default::default()
        };
        let kept: Vec<_> = filter.apply(&recs).into_iter().map(|r| r.event.label).collect();
        assert_eq!(kept, vec!["Mirai", "Torii"]);

        // Combines with the type filter
        let filter = filter.with_attack_type(Some("Torii"));
        assert_eq!(filter.apply(&recs).len(), 1);
    }

    #[test]
    fn test_paginate_fifty_per_page() {
        let items: Vec<usize> = (0..120).collect();
        let first = paginate(&items, 1, DEFAULT_PAGE_SIZE);
        assert_eq!(first.items.len(), 50);
        assert_eq!(first.total_pages, 3);

        let last = paginate(&items, 3, DEFAULT_PAGE_SIZE);
        assert_eq!(last.items, (100..120).collect::<Vec<_>>());

        let clamped = paginate(&items, 99, DEFAULT_PAGE_SIZE);
        assert_eq!(clamped.page, 3);

        let empty: Page<usize> = paginate(&[], 1, DEFAULT_PAGE_SIZE);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_severity_stats() {
        let recs = records(&[("Mirai", ""), ("C&C-Torii", ""), ("Benign", ""), ("Something", "")]);
        let stats = severity_stats(&recs);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.high, 1);
        assert_eq!(stats.low, 1);
        assert_eq!(stats.normal, 1);
        assert_eq!(stats.threats(), 3);
    }

    #[test]
    fn test_top_distribution_limits_and_orders() {
        let recs = records(&[
            ("A", ""), ("B", ""), ("B", ""), ("C", ""), ("C", ""), ("C", ""),
            ("D", ""), ("E", ""), ("F", ""),
        ]);
        let top = top_distribution(&recs, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].label, "C");
        assert_eq!(top[1].label, "B");
        // Single occurrences keep first-seen order
        assert_eq!(top[2].label, "A");
        assert_eq!(top[3].label, "D");
        assert!((top[0].percent - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_attack_types_are_sorted_and_unique() {
        let recs = records(&[("Okiru", ""), ("DDoS", ""), ("Okiru", "")]);
        assert_eq!(attack_types(&recs), vec!["DDoS", "Okiru"]);
    }
}
