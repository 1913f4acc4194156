//! Static catalogue data — distraction-app statistics and motivational
//! quotes.
//!
//! Pure lookups over display data; no state. Unknown app labels (including
//! free-text "other" entries) simply have no statistics.

use rand::seq::SliceRandom;

/// Usage statistics for one distraction app.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistractionStat {
    pub app: &'static str,
    pub daily_usage: &'static str,
    pub weekly_hours: f64,
    pub global_users: &'static str,
    pub mental_health_impact: &'static str,
    pub attention_span_effect: &'static str,
}

/// Apps with known statistics.
pub static APP_STATS: &[DistractionStat] = &[
    DistractionStat {
        app: "Instagram",
        daily_usage: "53 minutes",
        weekly_hours: 6.2,
        global_users: "2+ billion",
        mental_health_impact: "Linked to increased anxiety and depression in teens",
        attention_span_effect: "Reduces sustained attention by 25%",
    },
    DistractionStat {
        app: "TikTok",
        daily_usage: "95 minutes",
        weekly_hours: 11.1,
        global_users: "1.5+ billion",
        mental_health_impact: "Associated with dopamine dysregulation and ADHD-like symptoms",
        attention_span_effect: "Shortens attention span to under 8 seconds",
    },
    DistractionStat {
        app: "YouTube",
        daily_usage: "74 minutes",
        weekly_hours: 8.6,
        global_users: "2.5+ billion",
        mental_health_impact: "Endless autoplay increases procrastination by 40%",
        attention_span_effect: "Creates \"rabbit hole\" browsing patterns",
    },
    DistractionStat {
        app: "Twitter / X",
        daily_usage: "34 minutes",
        weekly_hours: 4.0,
        global_users: "600+ million",
        mental_health_impact: "Increases stress and negative emotions from doom-scrolling",
        attention_span_effect: "Fragments thinking into 280-character bursts",
    },
    DistractionStat {
        app: "Browser",
        daily_usage: "47 minutes",
        weekly_hours: 5.5,
        global_users: "Universal",
        mental_health_impact: "Tab overload increases cognitive fatigue",
        attention_span_effect: "Multi-tab browsing reduces focus by 30%",
    },
];

/// Quotes shown while a session runs.
pub static MOTIVATIONAL_QUOTES: &[&str] = &[
    "Your attention is your superpower. Reclaim it.",
    "Every minute you choose focus is a vote for your future self.",
    "The cost of distraction is measured in dreams delayed.",
    "You're not avoiding apps, you're choosing yourself.",
    "Breaking free from the scroll is an act of self-respect.",
    "Your brain wasn't designed for infinite content. Give it peace.",
    "Focus is the new wealth. Start investing today.",
    "One hour of deep work beats 4 hours of distracted effort.",
];

/// How heavy the user's weekly distraction load is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    /// A one-line message for the level.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Low => "You're doing well! Small improvements can still help.",
            Self::Medium => {
                "Moderate risk. Focus sessions will significantly boost your productivity."
            }
            Self::High => "High impact zone. Reclaiming this time could transform your week.",
            Self::Critical => "Critical attention debt. Your brain is begging for focused time.",
        }
    }
}

/// Statistics for a known app label, if any.
pub fn stat_for(app: &str) -> Option<&'static DistractionStat> {
    APP_STATS.iter().find(|stat| stat.app == app)
}

/// Statistics for the selected apps, skipping unknown labels.
pub fn stats_for_apps(apps: &[String]) -> Vec<&'static DistractionStat> {
    apps.iter().filter_map(|app| stat_for(app)).collect()
}

/// Combined weekly hours across the selected apps. Unknown labels count 0.
pub fn total_weekly_hours(apps: &[String]) -> f64 {
    apps.iter()
        .filter_map(|app| stat_for(app))
        .map(|stat| stat.weekly_hours)
        .sum()
}

/// Classify a weekly-hours total.
pub fn impact_level(hours: f64) -> ImpactLevel {
    if hours < 5.0 {
        ImpactLevel::Low
    } else if hours < 15.0 {
        ImpactLevel::Medium
    } else if hours < 25.0 {
        ImpactLevel::High
    } else {
        ImpactLevel::Critical
    }
}

/// One motivational quote at random.
pub fn random_quote() -> &'static str {
    MOTIVATIONAL_QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MOTIVATIONAL_QUOTES[0])
}
