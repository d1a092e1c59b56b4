//! Outcome labels and the threshold classifier.
//!
//! Tiers are evaluated top-down (viral, successful, standard) with the first
//! match winning; anything else is `failed`. All `min_*` bounds are inclusive.

use serde::{Deserialize, Serialize};

/// Final classification for a tracked video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeLabel {
    Viral,
    Successful,
    Standard,
    Failed,
}

impl OutcomeLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeLabel::Viral => "viral",
            OutcomeLabel::Successful => "successful",
            OutcomeLabel::Standard => "standard",
            OutcomeLabel::Failed => "failed",
        }
    }

    /// All labels in tier order, highest first.
    pub const ALL: [OutcomeLabel; 4] = [
        OutcomeLabel::Viral,
        OutcomeLabel::Successful,
        OutcomeLabel::Standard,
        OutcomeLabel::Failed,
    ];
}

impl std::fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutcomeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viral" => Ok(OutcomeLabel::Viral),
            "successful" => Ok(OutcomeLabel::Successful),
            "standard" => Ok(OutcomeLabel::Standard),
            "failed" => Ok(OutcomeLabel::Failed),
            other => Err(format!("unknown outcome label: {other}")),
        }
    }
}

/// Fixed threshold table for the four outcome tiers.
///
/// The `standard` tier bounds engagement on both sides (1%–3%). A video with
/// 10k–100k views and engagement above 3% therefore matches no positive tier
/// and falls through to `failed`; that asymmetry is intentional and covered
/// by tests rather than patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    pub viral_min_views: i64,
    pub viral_min_engagement_rate: f64,
    pub viral_min_coins: i64,
    pub successful_min_views: i64,
    pub successful_min_engagement_rate: f64,
    pub standard_min_views: i64,
    pub standard_min_engagement_rate: f64,
    pub standard_max_engagement_rate: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            viral_min_views: 1_000_000,
            viral_min_engagement_rate: 0.05,
            viral_min_coins: 10_000,
            successful_min_views: 100_000,
            successful_min_engagement_rate: 0.03,
            standard_min_views: 10_000,
            standard_min_engagement_rate: 0.01,
            standard_max_engagement_rate: 0.03,
        }
    }
}

impl LabelThresholds {
    /// Maps a metrics snapshot to an outcome label.
    ///
    /// Pure and deterministic. A video missing one viral bound (e.g. the coin
    /// floor) falls through to the `successful` check, not straight to
    /// `failed`; engagement gates every non-`failed` tier.
    #[must_use]
    pub fn classify(&self, views: i64, engagement_rate: f64, coins: i64) -> OutcomeLabel {
        if views >= self.viral_min_views
            && engagement_rate >= self.viral_min_engagement_rate
            && coins >= self.viral_min_coins
        {
            return OutcomeLabel::Viral;
        }

        if views >= self.successful_min_views
            && engagement_rate >= self.successful_min_engagement_rate
        {
            return OutcomeLabel::Successful;
        }

        if views >= self.standard_min_views
            && engagement_rate >= self.standard_min_engagement_rate
            && engagement_rate <= self.standard_max_engagement_rate
        {
            return OutcomeLabel::Standard;
        }

        OutcomeLabel::Failed
    }
}
