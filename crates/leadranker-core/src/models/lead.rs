use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::billing::Usage;
use super::RecordId;

/// Leads scoring below this are shown under "Ignored"
pub const IGNORED_SCORE_THRESHOLD: f64 = 20.0;

/// Source assumed for leads that do not report one
pub const DEFAULT_SOURCE: &str = "Website";

/// Source sent with manually scored leads
pub const MANUAL_SOURCE: &str = "manual";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadBucket {
    Hot,
    Warm,
    Cold,
    Ignore,
    #[serde(other)]
    Unknown,
}

impl LeadBucket {
    pub fn label(&self) -> &'static str {
        match self {
            LeadBucket::Hot => "HOT",
            LeadBucket::Warm => "WARM",
            LeadBucket::Cold => "COLD",
            LeadBucket::Ignore => "IGNORE",
            LeadBucket::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    /// Older history endpoints call this `status`.
    #[serde(default, alias = "status")]
    pub bucket: Option<LeadBucket>,
    #[serde(default)]
    pub sentiment: Option<String>,
    /// ISO-8601 timestamp, with or without offset
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl Lead {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unknown")
    }

    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Unreported buckets count as cold.
    pub fn bucket_or_cold(&self) -> LeadBucket {
        self.bucket.unwrap_or(LeadBucket::Cold)
    }

    pub fn source_or_default(&self) -> &str {
        self.source.as_deref().filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SOURCE)
    }
}

/// One page of `/leads/history`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "HistoryWire")]
pub struct LeadHistory {
    pub leads: Vec<Lead>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryWire {
    Wrapped { data: Vec<Lead> },
    Bare(Vec<Lead>),
}

impl From<HistoryWire> for LeadHistory {
    fn from(wire: HistoryWire) -> Self {
        match wire {
            HistoryWire::Wrapped { data } => LeadHistory { leads: data },
            HistoryWire::Bare(leads) => LeadHistory { leads },
        }
    }
}

/// Aggregate counts from `/leads/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub hot: u64,
    #[serde(default)]
    pub warm: u64,
    #[serde(default)]
    pub cold: u64,
}

/// Category tabs on the history screen, applied client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Hot,
    Warm,
    Cold,
    Ignored,
}

impl HistoryFilter {
    pub const ALL: [HistoryFilter; 5] = [
        HistoryFilter::All,
        HistoryFilter::Hot,
        HistoryFilter::Warm,
        HistoryFilter::Cold,
        HistoryFilter::Ignored,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            HistoryFilter::All => "All",
            HistoryFilter::Hot => "Hot",
            HistoryFilter::Warm => "Warm",
            HistoryFilter::Cold => "Cold",
            HistoryFilter::Ignored => "Ignored",
        }
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Hot => lead.bucket == Some(LeadBucket::Hot),
            HistoryFilter::Warm => lead.bucket == Some(LeadBucket::Warm),
            HistoryFilter::Cold => lead.bucket == Some(LeadBucket::Cold),
            HistoryFilter::Ignored => lead.score_or_zero() < IGNORED_SCORE_THRESHOLD,
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Client-side analytics over a set of leads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadSummary {
    pub total: usize,
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub ignored: usize,
    pub top_source: String,
    pub average_score: Option<f64>,
    /// (source, count), most frequent first
    pub sources: Vec<(String, usize)>,
}

impl LeadSummary {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut summary = LeadSummary {
            total: leads.len(),
            ..Default::default()
        };

        let mut sources: HashMap<&str, usize> = HashMap::new();
        let mut score_sum = 0.0;
        let mut scored = 0usize;

        for lead in leads {
            match lead.bucket {
                Some(LeadBucket::Hot) => summary.hot += 1,
                Some(LeadBucket::Warm) => summary.warm += 1,
                Some(LeadBucket::Cold) => summary.cold += 1,
                _ => {}
            }
            if HistoryFilter::Ignored.matches(lead) {
                summary.ignored += 1;
            }
            if let Some(score) = lead.score {
                score_sum += score;
                scored += 1;
            }
            *sources.entry(lead.source_or_default()).or_insert(0) += 1;
        }

        let mut sources: Vec<(String, usize)> = sources
            .into_iter()
            .map(|(s, n)| (s.to_string(), n))
            .collect();
        // Most frequent first, ties broken by name for a stable display
        sources.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        summary.top_source = sources
            .first()
            .map(|(s, _)| s.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        summary.average_score = (scored > 0).then(|| score_sum / scored as f64);
        summary.sources = sources;
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
}

impl ScoreRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: None,
            email: None,
            phone: None,
            message: message.into(),
            source: MANUAL_SOURCE.to_string(),
            campaign: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub bucket: LeadBucket,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub billing: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(bucket: Option<LeadBucket>, score: Option<f64>, source: Option<&str>) -> Lead {
        Lead {
            bucket,
            score,
            source: source.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_history_accepts_wrapped_and_bare() {
        let wrapped: LeadHistory = serde_json::from_str(
            r#"{"data": [{"id": 7, "name": "Ana", "score": 88, "bucket": "HOT", "created_at": "2024-05-01T10:00:00"}]}"#,
        )
        .expect("wrapped");
        assert_eq!(wrapped.leads.len(), 1);
        assert_eq!(wrapped.leads[0].bucket, Some(LeadBucket::Hot));
        assert_eq!(wrapped.leads[0].id, Some(RecordId::Int(7)));

        let bare: LeadHistory =
            serde_json::from_str(r#"[{"id": "x1", "score": 12, "status": "COLD"}]"#).expect("bare");
        assert_eq!(bare.leads[0].bucket, Some(LeadBucket::Cold));
    }

    #[test]
    fn test_unknown_bucket_tolerated() {
        let l: Lead = serde_json::from_str(r#"{"bucket": "LUKEWARM"}"#).expect("parse");
        assert_eq!(l.bucket, Some(LeadBucket::Unknown));
    }

    #[test]
    fn test_history_filter() {
        let hot = lead(Some(LeadBucket::Hot), Some(90.0), None);
        let ignored = lead(Some(LeadBucket::Cold), Some(5.0), None);
        let unscored = lead(None, None, None);

        assert!(HistoryFilter::Hot.matches(&hot));
        assert!(!HistoryFilter::Hot.matches(&ignored));
        assert!(HistoryFilter::Ignored.matches(&ignored));
        assert!(HistoryFilter::Ignored.matches(&unscored));
        assert!(!HistoryFilter::Ignored.matches(&hot));
        assert!(HistoryFilter::All.matches(&unscored));
    }

    #[test]
    fn test_history_filter_cycles() {
        assert_eq!(HistoryFilter::All.next(), HistoryFilter::Hot);
        assert_eq!(HistoryFilter::Ignored.next(), HistoryFilter::All);
        assert_eq!(HistoryFilter::All.prev(), HistoryFilter::Ignored);
    }

    #[test]
    fn test_summary() {
        let leads = vec![
            lead(Some(LeadBucket::Hot), Some(90.0), Some("Zillow")),
            lead(Some(LeadBucket::Hot), Some(80.0), Some("Zillow")),
            lead(Some(LeadBucket::Warm), Some(50.0), None),
            lead(Some(LeadBucket::Cold), Some(10.0), Some("Email")),
        ];
        let summary = LeadSummary::from_leads(&leads);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.hot, 2);
        assert_eq!(summary.warm, 1);
        assert_eq!(summary.cold, 1);
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.top_source, "Zillow");
        assert_eq!(summary.average_score, Some(57.5));
    }

    #[test]
    fn test_summary_empty_defaults() {
        let summary = LeadSummary::from_leads(&[]);
        assert_eq!(summary.top_source, DEFAULT_SOURCE);
        assert!(summary.average_score.is_none());
    }

    #[test]
    fn test_score_request_skips_empty_fields() {
        let json = serde_json::to_value(ScoreRequest::new("Looking for a 3BR")).expect("serialize");
        assert_eq!(json["source"], "manual");
        assert!(json.get("name").is_none());
    }
}
