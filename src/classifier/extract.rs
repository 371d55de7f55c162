//! Heuristic phrase mining over review text.
//!
//! Everything in here is best-effort and lossy by design: the extracted
//! phrases are illustrative excerpts for reports, never authoritative
//! classification. The pattern sets live in a [`PhraseMiner`] built once
//! and passed around, same as the category rule tables.

use regex::Regex;
use std::fmt;

/// The flavor of complaint a pattern detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComplaintKind {
    Inability,
    Failure,
    MissingFeature,
    BrokenFeature,
    QualityIssue,
    Insufficient,
    TechnicalIssue,
}

impl fmt::Display for ComplaintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComplaintKind::Inability => "inability",
            ComplaintKind::Failure => "failure",
            ComplaintKind::MissingFeature => "missing_feature",
            ComplaintKind::BrokenFeature => "broken_feature",
            ComplaintKind::QualityIssue => "quality_issue",
            ComplaintKind::Insufficient => "insufficient",
            ComplaintKind::TechnicalIssue => "technical_issue",
        };
        f.write_str(label)
    }
}

/// One mined complaint: its kind plus the captured detail phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Complaint {
    pub kind: ComplaintKind,
    pub detail: String,
}

/// Compiled pattern sets for complaint, feature-request and praise mining.
pub struct PhraseMiner {
    complaints: Vec<(Regex, ComplaintKind)>,
    requests: Vec<Regex>,
    praise: Vec<(&'static str, Regex)>,
}

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static mining pattern")
}

impl PhraseMiner {
    pub fn builtin() -> Self {
        let complaints = vec![
            (rx(r"can'?t (\w+ ?\w*)"), ComplaintKind::Inability),
            (rx(r"doesn'?t (\w+ ?\w*)"), ComplaintKind::Failure),
            (rx(r"won'?t (\w+ ?\w*)"), ComplaintKind::Failure),
            (rx(r"unable to (\w+ ?\w*)"), ComplaintKind::Inability),
            (rx(r"no (\w+) (option|feature|way)"), ComplaintKind::MissingFeature),
            (
                rx(r"(\w+) (doesn't|does not|won't|will not) work"),
                ComplaintKind::BrokenFeature,
            ),
            (rx(r"too (slow|fast|loud|quiet|short|long)"), ComplaintKind::QualityIssue),
            (rx(r"not enough (\w+)"), ComplaintKind::Insufficient),
            (rx(r"(\w+) is (broken|buggy|glitchy)"), ComplaintKind::TechnicalIssue),
        ];

        let requests = vec![
            rx(r"wish (?:it |they |there was |there were |i could )(.{10,60})"),
            rx(r"would be (?:nice|great|better) (?:if|to) (.{10,60})"),
            rx(r"should (?:have|be able to|let you) (.{10,60})"),
            rx(r"need(?:s)? (?:a |to |the ability to )(.{10,60})"),
            rx(r"no (?:option|way|ability) to (.{10,60})"),
            rx(r"can'?t (?:even )?(.{10,60})"),
            rx(r"doesn'?t (?:even )?(?:have|let|allow) (.{10,60})"),
            rx(r"missing (.{10,40})"),
            rx(r"lacks? (.{10,40})"),
        ];

        let praise = vec![
            ("sleep_stories", rx(r"sleep (stories?|story)|bedtime|fall asleep")),
            (
                "calming_voices",
                rx(r"(calm|sooth|relax).*(voice|narrat)|voice.*(calm|sooth|love)"),
            ),
            ("meditation_quality", rx(r"meditation|mindful|breathing|relax")),
            ("variety_content", rx(r"variety|lots of|many options|different")),
            ("ease_of_use", rx(r"easy|simple|intuitive|user.?friendly")),
            ("daily_content", rx(r"daily|every day|morning|night routine")),
            ("specific_narrator", rx(r"tamara|andy|stephen fry|matthew")),
            ("helped_anxiety", rx(r"help.*(anxiety|stress|calm|relax|sleep)")),
        ];

        Self {
            complaints,
            requests,
            praise,
        }
    }

    /// Extract (kind, detail) complaint pairs. All matches from every
    /// pattern are retained; multiple per review is normal.
    pub fn complaints(&self, text: &str) -> Vec<Complaint> {
        let lowered = text.to_lowercase();
        let mut found = Vec::new();

        for (regex, kind) in &self.complaints {
            for caps in regex.captures_iter(&lowered) {
                let detail = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                found.push(Complaint {
                    kind: *kind,
                    detail,
                });
            }
        }

        found
    }

    /// Extract requested-capability phrases, filtered of billing noise.
    pub fn feature_requests(&self, text: &str) -> Vec<String> {
        const BILLING_NOISE: [&str; 4] = ["refund", "money", "cancel", "charge"];

        let lowered = text.to_lowercase();
        let mut found = Vec::new();

        for regex in &self.requests {
            for caps in regex.captures_iter(&lowered) {
                let raw = match caps.get(1) {
                    Some(m) => m.as_str(),
                    None => continue,
                };
                let cleaned = raw.trim().trim_end_matches(['.', ',', '!', '?']).to_string();
                if cleaned.len() > 10 && !BILLING_NOISE.iter().any(|w| cleaned.contains(w)) {
                    found.push(cleaned);
                }
            }
        }

        found
    }

    /// The first praised aspect a review matches, if any. One aspect per
    /// review, in the declared pattern order.
    pub fn praised_aspect(&self, text: &str) -> Option<&'static str> {
        let lowered = text.to_lowercase();
        self.praise
            .iter()
            .find(|(_, regex)| regex.is_match(&lowered))
            .map(|(name, _)| *name)
    }
}
