//! Static classification rule tables.
//!
//! The tables are data, not code: a [`RuleSet`] is an explicitly
//! constructed, immutable configuration object handed to the classifier at
//! construction. Swapping or extending the taxonomy means building a
//! different `RuleSet`, never touching classification logic.
//!
//! Category order matters: it is the declared order used to break count
//! ties when ranking categories in reports.

use regex::Regex;

/// A single trigger inside a category's ordered trigger list.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Case-insensitive substring match against the lowercased text.
    Phrase(String),
    /// Regex match against the lowercased text.
    Pattern(Regex),
}

impl Trigger {
    pub fn matches(&self, lowered: &str) -> bool {
        match self {
            Trigger::Phrase(phrase) => lowered.contains(phrase.as_str()),
            Trigger::Pattern(regex) => regex.is_match(lowered),
        }
    }

    /// The trigger's source text, for tag traceability.
    pub fn source(&self) -> &str {
        match self {
            Trigger::Phrase(phrase) => phrase,
            Trigger::Pattern(regex) => regex.as_str(),
        }
    }
}

/// One category and its ordered trigger list.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Category slug, e.g. "app_crashes_bugs".
    pub name: String,
    pub triggers: Vec<Trigger>,
}

/// The complete rule configuration: the ordered category table plus the
/// billing- and product-term lists used for the billing-dominance signal.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub categories: Vec<CategoryRule>,
    pub billing_terms: Vec<String>,
    pub product_terms: Vec<String>,
}

fn phrases(list: &[&str]) -> Vec<Trigger> {
    list.iter().map(|p| Trigger::Phrase(p.to_string())).collect()
}

fn pattern(p: &str) -> Trigger {
    Trigger::Pattern(Regex::new(p).expect("static trigger pattern"))
}

fn rule(name: &str, triggers: Vec<Trigger>) -> CategoryRule {
    CategoryRule {
        name: name.to_string(),
        triggers,
    }
}

impl RuleSet {
    /// The built-in taxonomy for meditation-app reviews.
    pub fn builtin() -> Self {
        let categories = vec![
            rule("login_authentication", {
                let mut t = phrases(&[
                    "login", "log in", "sign in", "signin", "password", "authenticate",
                    "account access", "can't access", "cannot access", "locked out",
                    "verification", "verify", "credentials", "reset password",
                ]);
                t.push(pattern(r"can'?t (?:log|sign|access)"));
                t.push(pattern(r"won'?t let me"));
                t
            }),
            rule(
                "app_crashes_bugs",
                phrases(&[
                    "crash", "crashes", "crashing", "bug", "bugs", "buggy", "glitch",
                    "glitchy", "freeze", "freezes", "frozen", "error", "errors", "broken",
                    "not working", "doesnt work", "doesn't work", "stopped working",
                    "malfunction",
                ]),
            ),
            rule(
                "ui_ux_design",
                phrases(&[
                    "confusing", "hard to use", "difficult to navigate", "navigation",
                    "interface", "design", "layout", "cluttered", "unintuitive",
                    "user experience", "ux", "ui", "menu", "find", "where is",
                    "can't find", "hard to find", "complicated", "complex",
                ]),
            ),
            rule(
                "content_quality",
                phrases(&[
                    "content", "meditation", "meditations", "sleep", "story", "stories",
                    "music", "sounds", "audio", "voice", "narrator", "narration",
                    "quality", "variety", "selection", "limited", "repetitive", "boring",
                    "same", "outdated", "stale",
                ]),
            ),
            rule(
                "feature_missing",
                phrases(&[
                    "feature", "features", "missing", "need", "wish", "would like",
                    "should have", "doesn't have", "no option", "can't do", "cannot do",
                    "lack", "lacking", "want", "wanted",
                ]),
            ),
            rule(
                "offline_download",
                phrases(&[
                    "offline", "download", "downloads", "downloading", "save", "saved",
                    "without internet", "no wifi", "airplane mode", "storage",
                ]),
            ),
            rule("sync_devices", {
                let mut t = phrases(&[
                    "sync", "syncing", "synchronize", "device", "devices", "phone",
                    "tablet", "ipad", "iphone", "android", "apple watch", "watch",
                    "cross-device", "multiple devices", "transfer", "progress",
                ]);
                t.push(pattern(r"progress (?:lost|reset|gone)"));
                t
            }),
            rule(
                "performance_speed",
                phrases(&[
                    "slow", "loading", "load time", "buffer", "buffering", "lag",
                    "laggy", "performance", "speed", "takes forever", "wait", "waiting",
                ]),
            ),
            rule(
                "notifications_reminders",
                phrases(&[
                    "notification", "notifications", "reminder", "reminders", "alert",
                    "alerts", "push", "spam", "annoying", "too many", "constant",
                ]),
            ),
            rule(
                "customer_support",
                phrases(&[
                    "support", "customer service", "help", "response", "respond",
                    "contact", "email", "reply", "ignore", "ignored", "no response",
                    "unhelpful",
                ]),
            ),
            rule(
                "timer_tracking",
                phrases(&[
                    "timer", "tracking", "track", "progress", "streak", "stats",
                    "statistics", "history", "session", "sessions", "minutes",
                    "time spent",
                ]),
            ),
            rule(
                "personalization",
                phrases(&[
                    "personalize", "personalization", "customize", "customization",
                    "preference", "preferences", "recommend", "recommendation",
                    "algorithm", "tailored", "personal", "individual",
                ]),
            ),
            rule("audio_playback", {
                let mut t = phrases(&[
                    "play", "playback", "pause", "stop", "audio", "sound", "volume",
                    "background", "continues", "stops", "interrupts", "cuts off", "skip",
                ]);
                t.push(pattern(r"audio (?:cut|stop|skip)"));
                t
            }),
        ];

        let billing_terms = [
            "cancel", "cancelled", "cancellation", "refund", "charge", "charged",
            "billing", "subscription", "unsubscribe", "renew", "renewal", "auto-renew",
            "autorenewal", "free trial", "trial", "money back", "payment", "paypal",
            "credit card", "scam", "fraud", "fraudulent", "steal", "stolen", "theft",
            "rip off", "ripoff", "predatory", "deceptive", "misleading", "hidden fees",
            "unauthorized", "bank", "dispute", "chargeback", "$", "£", "€", "dollar",
            "pound", "price", "expensive", "overpriced", "cost", "fee", "pay", "paid",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let product_terms = [
            "app", "content", "meditation", "sleep", "feature", "bug", "crash",
            "audio", "interface", "design", "quality", "voice",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        RuleSet {
            categories,
            billing_terms,
            product_terms,
        }
    }
}
