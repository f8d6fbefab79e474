//! Max-relative normalization
//!
//! Each signal is divided by its maximum over the current candidate set.
//! Reward-lower signals are flipped to `1 - raw/max`. A signal whose
//! maximum is 0 normalizes to 0 for every article, whatever its polarity.

use crate::RawSignals;
use serde::{Deserialize, Serialize};

/// Direction in which a raw value contributes to the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Larger raw value, larger normalized value
    RewardHigher,
    /// Larger raw value means the article is already well covered
    RewardLower,
}

/// Normalized ranking signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Langlinks,
    EditCount,
    References,
    EditWars,
    Templates,
    InLinkCount,
    OutLinkCount,
    WordsPerByte,
    SecsSinceLastEdit,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::Views,
        Metric::Langlinks,
        Metric::EditCount,
        Metric::References,
        Metric::EditWars,
        Metric::Templates,
        Metric::InLinkCount,
        Metric::OutLinkCount,
        Metric::WordsPerByte,
        Metric::SecsSinceLastEdit,
    ];

    pub fn polarity(self) -> Polarity {
        match self {
            Metric::EditCount | Metric::References | Metric::Templates | Metric::WordsPerByte => {
                Polarity::RewardLower
            }
            Metric::Views
            | Metric::Langlinks
            | Metric::EditWars
            | Metric::InLinkCount
            | Metric::OutLinkCount
            | Metric::SecsSinceLastEdit => Polarity::RewardHigher,
        }
    }

    /// Raw value of this metric
    pub fn raw(self, signals: &RawSignals) -> f64 {
        match self {
            Metric::Views => signals.views,
            Metric::Langlinks => signals.langlinks,
            Metric::EditCount => signals.edit_count,
            Metric::References => signals.references,
            Metric::EditWars => signals.edit_wars,
            Metric::Templates => signals.templates,
            Metric::InLinkCount => signals.in_link_count,
            Metric::OutLinkCount => signals.out_link_count,
            Metric::WordsPerByte => signals.words_per_byte,
            Metric::SecsSinceLastEdit => signals.secs_since_last_edit,
        }
    }
}

/// `raw / max`, or 0 when `max` is 0
pub fn safe_divide(raw: f64, max: f64) -> f64 {
    if max != 0.0 {
        raw / max
    } else {
        0.0
    }
}

/// Per-metric maxima over a candidate set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaxValues(RawSignals);

impl MaxValues {
    /// Maxima over an unordered set of signals; all zero for an empty set
    pub fn compute<'a, I>(signals: I) -> Self
    where
        I: IntoIterator<Item = &'a RawSignals>,
    {
        let mut max = RawSignals::default();
        for s in signals {
            max.views = max.views.max(s.views);
            max.langlinks = max.langlinks.max(s.langlinks);
            max.edit_count = max.edit_count.max(s.edit_count);
            max.editor_count = max.editor_count.max(s.editor_count);
            max.references = max.references.max(s.references);
            max.templates = max.templates.max(s.templates);
            max.edit_wars = max.edit_wars.max(s.edit_wars);
            max.in_link_count = max.in_link_count.max(s.in_link_count);
            max.out_link_count = max.out_link_count.max(s.out_link_count);
            max.words_per_byte = max.words_per_byte.max(s.words_per_byte);
            max.secs_since_last_edit = max.secs_since_last_edit.max(s.secs_since_last_edit);
            max.page_rank = max.page_rank.max(s.page_rank);
        }
        Self(max)
    }

    pub fn get(&self, metric: Metric) -> f64 {
        metric.raw(&self.0)
    }

    /// Normalize one metric value against this set's maximum
    pub fn normalize_value(&self, metric: Metric, raw: f64) -> f64 {
        let max = self.get(metric);
        if max == 0.0 {
            return 0.0;
        }
        match metric.polarity() {
            Polarity::RewardHigher => safe_divide(raw, max),
            Polarity::RewardLower => 1.0 - safe_divide(raw, max),
        }
    }

    /// Normalize every metric of one article
    pub fn normalize(&self, signals: &RawSignals) -> NormalizedMetrics {
        let mut out = NormalizedMetrics::default();
        for metric in Metric::ALL {
            out.set(metric, self.normalize_value(metric, metric.raw(signals)));
        }
        out
    }
}

/// Normalized values, each in `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    pub views: f64,
    pub langlinks: f64,
    pub edit_count: f64,
    pub references: f64,
    pub edit_wars: f64,
    pub templates: f64,
    pub in_link_count: f64,
    pub out_link_count: f64,
    pub words_per_byte: f64,
    pub secs_since_last_edit: f64,
}

impl NormalizedMetrics {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Views => self.views,
            Metric::Langlinks => self.langlinks,
            Metric::EditCount => self.edit_count,
            Metric::References => self.references,
            Metric::EditWars => self.edit_wars,
            Metric::Templates => self.templates,
            Metric::InLinkCount => self.in_link_count,
            Metric::OutLinkCount => self.out_link_count,
            Metric::WordsPerByte => self.words_per_byte,
            Metric::SecsSinceLastEdit => self.secs_since_last_edit,
        }
    }

    fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::Views => &mut self.views,
            Metric::Langlinks => &mut self.langlinks,
            Metric::EditCount => &mut self.edit_count,
            Metric::References => &mut self.references,
            Metric::EditWars => &mut self.edit_wars,
            Metric::Templates => &mut self.templates,
            Metric::InLinkCount => &mut self.in_link_count,
            Metric::OutLinkCount => &mut self.out_link_count,
            Metric::WordsPerByte => &mut self.words_per_byte,
            Metric::SecsSinceLastEdit => &mut self.secs_since_last_edit,
        };
        *slot = value;
    }
}
