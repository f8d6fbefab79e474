use crate::{Metric, NormalizedMetrics};
use serde::{Deserialize, Serialize};
use wikigap_common::config::RankingConfig;

/// Per-metric score weights.
///
/// Weights are used as given; they need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
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
    pub page_rank: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self::from(&RankingConfig::default())
    }
}

impl From<&RankingConfig> for Weights {
    fn from(config: &RankingConfig) -> Self {
        Self {
            views: config.views,
            langlinks: config.langlinks,
            edit_count: config.edit_count,
            references: config.references,
            edit_wars: config.edit_wars,
            templates: config.templates,
            in_link_count: config.in_link_count,
            out_link_count: config.out_link_count,
            words_per_byte: config.words_per_byte,
            secs_since_last_edit: config.secs_since_last_edit,
            page_rank: config.page_rank,
        }
    }
}

impl Weights {
    /// All weights zero
    pub fn zero() -> Self {
        Self {
            views: 0.0,
            langlinks: 0.0,
            edit_count: 0.0,
            references: 0.0,
            edit_wars: 0.0,
            templates: 0.0,
            in_link_count: 0.0,
            out_link_count: 0.0,
            words_per_byte: 0.0,
            secs_since_last_edit: 0.0,
            page_rank: 0.0,
        }
    }

    /// Weight 1 on a single metric, 0 elsewhere
    pub fn only(metric: Metric) -> Self {
        let mut weights = Self::zero();
        *weights.slot(metric) = 1.0;
        weights
    }

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

    fn slot(&mut self, metric: Metric) -> &mut f64 {
        match metric {
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
        }
    }

    /// Weighted sum of normalized metrics plus the raw page-rank term
    pub fn score(&self, normalized: &NormalizedMetrics, page_rank: f64) -> f64 {
        Metric::ALL
            .iter()
            .map(|&metric| self.get(metric) * normalized.get(metric))
            .sum::<f64>()
            + self.page_rank * page_rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_weighting() {
        let weights = Weights::default();
        assert_eq!(weights.views, 0.35);
        assert_eq!(weights.langlinks, 0.35);
        assert_eq!(weights.templates, 0.025);
        assert_eq!(weights.out_link_count, 0.10);
        assert_eq!(weights.secs_since_last_edit, 0.0);
    }

    #[test]
    fn test_score_is_not_renormalized() {
        let mut weights = Weights::zero();
        weights.views = 2.0;
        weights.langlinks = 3.0;
        let normalized = NormalizedMetrics {
            views: 1.0,
            langlinks: 1.0,
            ..Default::default()
        };
        assert_eq!(weights.score(&normalized, 0.0), 5.0);
    }

    #[test]
    fn test_only() {
        let weights = Weights::only(Metric::Templates);
        assert_eq!(weights.get(Metric::Templates), 1.0);
        assert_eq!(weights.get(Metric::Views), 0.0);
    }
}
