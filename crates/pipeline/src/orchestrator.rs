//! Batched ranking run
//!
//! Resolver → existence filter → metadata collector → ranking engine.
//! Candidates move through filter and collector in bounded batches; within a
//! batch every existence check runs concurrently, then every metadata
//! collection for the candidates the filter kept. After each batch the ranking is
//! recomputed over everything collected so far and emitted as progress.
//! Cancelling abandons the in-flight batch and returns the ranking of the
//! candidates completed before it.

use crate::collector::MetadataCollector;
use crate::existence::{ExistenceFilter, FilterOutcome};
use crate::links::ArticleLinks;
use crate::report::{MissingArticle, ProgressEvent, RunReport, RunSummary};
use crate::resolver::CandidateResolver;
use crate::upstreams::Upstreams;
use futures::future::join_all;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};
use wikigap_common::config::{EmptyMetadataPolicy, ServicesConfig};
use wikigap_common::metrics::{record_dropped, record_run};
use wikigap_common::{AppConfig, AppError, LanguageCode, Result, RunRequest};
use wikigap_ranking::{ArticleMetadata, Candidate, RankingEngine, Weights};

/// Resolves once when `cancel` turns true; never resolves if the sender is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn emit(progress: &Option<mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        if tx.send(event).await.is_err() {
            debug!("Progress receiver dropped");
        }
    }
}

/// End-to-end missing-article ranking
pub struct RankingPipeline {
    resolver: CandidateResolver,
    filter: ExistenceFilter,
    collector: MetadataCollector,
    engine: RankingEngine,
    services: ServicesConfig,
    batch_size: usize,
    batch_delay: Duration,
    empty_metadata: EmptyMetadataPolicy,
}

impl RankingPipeline {
    pub fn new(upstreams: Upstreams, config: &AppConfig) -> Self {
        let timeout = config.call_timeout();
        Self {
            resolver: CandidateResolver::new(upstreams.candidates, upstreams.catalog),
            filter: ExistenceFilter::new(
                upstreams.links,
                timeout,
                config.pipeline.unknown_verdict,
            ),
            collector: MetadataCollector::new(
                upstreams.stats,
                upstreams.lists,
                timeout,
                config.pipeline.max_continuations,
            ),
            engine: RankingEngine::from_config(&config.ranking),
            services: config.services.clone(),
            batch_size: config.pipeline.batch_size.max(1),
            batch_delay: config.batch_delay(),
            empty_metadata: config.pipeline.empty_metadata,
        }
    }

    /// Pipeline over the HTTP upstreams named in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let upstreams = Upstreams::from_config(config)?;
        Ok(Self::new(upstreams, config))
    }

    /// Replace the configured weights
    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.engine = RankingEngine::new(weights);
        self
    }

    /// Run to completion without progress reporting
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_with(request, None, cancel_rx).await
    }

    /// Run with optional progress events and a cancellation signal.
    ///
    /// Cancelling during resolution fails with `AppError::Cancelled`; after
    /// resolution it yields a partial report with `summary.cancelled` set.
    #[instrument(
        skip(self, request, progress, cancel),
        fields(
            category = %request.category,
            target = %request.target_lang,
            reference = %request.reference_lang
        )
    )]
    pub async fn run_with(
        &self,
        request: &RunRequest,
        progress: Option<mpsc::Sender<ProgressEvent>>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<RunReport> {
        let started = Instant::now();

        let candidates = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                record_run(started.elapsed().as_secs_f64(), "cancelled");
                return Err(AppError::Cancelled);
            }
            resolved = self.resolver.resolve(request) => match resolved {
                Ok(candidates) => candidates,
                Err(e) => {
                    record_run(started.elapsed().as_secs_f64(), "failed");
                    return Err(e);
                }
            },
        };

        let total = candidates.len();
        let total_batches = total.div_ceil(self.batch_size);
        emit(&progress, ProgressEvent::Resolved { candidates: total }).await;

        let mut summary = RunSummary {
            candidates: total,
            ..RunSummary::default()
        };
        let mut collected: Vec<ArticleMetadata> = Vec::with_capacity(total);
        let mut processed = 0;

        for (index, batch) in candidates.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel) => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.batch_delay) => {}
                }
            }

            let (outcome, records) = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    summary.cancelled = true;
                    break;
                }
                done = self.process_batch(batch, &request.target_lang) => done,
            };

            self.tally(&outcome, records, &mut summary, &mut collected);
            processed += batch.len();
            summary.batches_completed += 1;

            debug!(
                batch = index + 1,
                total_batches,
                processed,
                collected = collected.len(),
                "Batch completed"
            );

            if progress.is_some() {
                let ranking = self.engine.rank(&collected);
                emit(
                    &progress,
                    ProgressEvent::BatchCompleted {
                        batch: index + 1,
                        total_batches,
                        processed,
                        total,
                        ranking,
                    },
                )
                .await;
            }
        }

        if summary.cancelled {
            info!(processed, total, "Run cancelled, returning partial ranking");
            emit(&progress, ProgressEvent::Cancelled { processed }).await;
        }

        let articles = self
            .engine
            .rank(&collected)
            .into_iter()
            .enumerate()
            .map(|(i, article)| {
                let links = ArticleLinks::new(
                    &self.services,
                    article.title(),
                    &article.candidate.reference_lang,
                    &request.target_lang,
                )?;
                Ok(MissingArticle {
                    position: i + 1,
                    article,
                    links,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        summary.ranked = articles.len();
        summary.duration_ms = started.elapsed().as_millis() as u64;
        record_run(
            started.elapsed().as_secs_f64(),
            if summary.cancelled { "cancelled" } else { "completed" },
        );

        info!(
            candidates = summary.candidates,
            existing = summary.existing,
            unknown = summary.unknown_verdicts,
            ranked = summary.ranked,
            duration_ms = summary.duration_ms,
            "Ranking run finished"
        );

        Ok(RunReport {
            request: request.clone(),
            articles,
            summary,
        })
    }

    /// Filter one batch, then collect metadata for the candidates it keeps
    async fn process_batch(
        &self,
        batch: &[Candidate],
        target_lang: &LanguageCode,
    ) -> (FilterOutcome, Vec<Option<ArticleMetadata>>) {
        let outcome = self.filter.filter(batch.to_vec(), target_lang).await;
        let records = join_all(
            outcome
                .retained
                .iter()
                .map(|(candidate, _)| self.collector.collect(candidate)),
        )
        .await;
        (outcome, records)
    }

    fn tally(
        &self,
        outcome: &FilterOutcome,
        records: Vec<Option<ArticleMetadata>>,
        summary: &mut RunSummary,
        collected: &mut Vec<ArticleMetadata>,
    ) {
        summary.existing += outcome.existing;
        summary.unknown_verdicts += outcome.unknown;
        summary.dropped_unknown += outcome.dropped_unknown;

        let mut missing_reference = 0;
        let mut dropped_low_confidence = 0;
        for record in records {
            let Some(metadata) = record else {
                missing_reference += 1;
                continue;
            };
            if metadata.is_low_confidence() {
                summary.low_confidence += 1;
                if self.empty_metadata == EmptyMetadataPolicy::Drop {
                    dropped_low_confidence += 1;
                    continue;
                }
            }
            collected.push(metadata);
        }

        summary.missing_reference += missing_reference;
        summary.dropped_low_confidence += dropped_low_confidence;
        record_dropped("missing_reference", missing_reference);
        record_dropped("low_confidence", dropped_low_confidence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wikigap_common::config::UnknownVerdictPolicy;
    use wikigap_common::errors::ErrorCode;
    use wikigap_common::DEFAULT_BATCH_DELAY_MS;
    use wikigap_ranking::Metric;
    use wikigap_sources::mock::{ArticleStats, MockWiki};
    use wikigap_sources::ResolutionOutcome;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pipeline.batch_delay_ms = 0;
        config
    }

    fn request() -> RunRequest {
        RunRequest::new("he", "Health", "en").unwrap()
    }

    fn pipeline(wiki: &Arc<MockWiki>, config: &AppConfig) -> RankingPipeline {
        RankingPipeline::new(Upstreams::single(wiki.clone()), config)
    }

    fn views_wiki() -> MockWiki {
        MockWiki::new()
            .with_articles(["A", "B", "C"])
            .with_stats("A", ArticleStats::with_views(100))
            .with_stats("B", ArticleStats::with_views(50))
            .with_stats("C", ArticleStats::with_views(0))
    }

    #[tokio::test]
    async fn test_views_only_ranking() {
        let wiki = Arc::new(views_wiki());
        let report = pipeline(&wiki, &config())
            .with_weights(Weights::only(Metric::Views))
            .run(&request())
            .await
            .unwrap();

        assert_eq!(report.titles(), vec!["A", "B", "C"]);
        let normalized: Vec<f64> =
            report.articles.iter().map(|a| a.article.normalized.views).collect();
        assert_eq!(normalized, vec![1.0, 0.5, 0.0]);
        let positions: Vec<usize> = report.articles.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(report.articles[0].links.view_url, "https://en.wikipedia.org/wiki/A");
        assert_eq!(
            report.articles[0].links.edit_url,
            "https://he.wikipedia.org/w/index.php?title=A&action=edit"
        );
        assert_eq!(report.summary.ranked, 3);
        assert!(!report.summary.cancelled);
    }

    #[tokio::test]
    async fn test_category_not_found_processes_no_candidates() {
        let wiki = Arc::new(views_wiki().with_resolution(ResolutionOutcome::CategoryNotFound));
        let result = pipeline(&wiki, &config()).run(&request()).await;

        let err = tokio_test::assert_err!(result);
        assert_eq!(err.code(), ErrorCode::CategoryNotFound);
        assert_eq!(wiki.resolve_calls(), 1);
        assert_eq!(wiki.existence_calls(), 0);
        assert_eq!(wiki.stat_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_category_completes() {
        let wiki = Arc::new(MockWiki::new().with_articles(Vec::<String>::new()));
        let report = tokio_test::assert_ok!(pipeline(&wiki, &config()).run(&request()).await);
        assert!(report.articles.is_empty());
        assert_eq!(report.summary.candidates, 0);
        assert_eq!(report.summary.batches_completed, 0);
    }

    #[tokio::test]
    async fn test_existing_articles_are_removed() {
        let wiki = Arc::new(views_wiki().existing("B"));
        let report = pipeline(&wiki, &config()).run(&request()).await.unwrap();

        assert_eq!(report.titles(), vec!["A", "C"]);
        assert_eq!(report.summary.existing, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_existence_timeout_retains_candidate() {
        let wiki = Arc::new(
            views_wiki()
                .with_articles(["A", "X"])
                .with_stats("X", ArticleStats::with_views(10))
                .existence_delay("X", Duration::from_secs(30)),
        );
        let report = pipeline(&wiki, &config()).run(&request()).await.unwrap();

        assert_eq!(report.titles(), vec!["A", "X"]);
        assert_eq!(report.summary.unknown_verdicts, 1);
        assert_eq!(report.summary.dropped_unknown, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_closed_drops_timed_out_candidate() {
        let wiki = Arc::new(
            views_wiki()
                .with_articles(["A", "X"])
                .existence_delay("X", Duration::from_secs(30)),
        );
        let mut config = config();
        config.pipeline.unknown_verdict = UnknownVerdictPolicy::Drop;
        let report = pipeline(&wiki, &config).run(&request()).await.unwrap();

        assert_eq!(report.titles(), vec!["A"]);
        assert_eq!(report.summary.dropped_unknown, 1);
    }

    #[tokio::test]
    async fn test_failed_metadata_ranks_last_with_zero_score() {
        let wiki = Arc::new(
            MockWiki::new()
                .with_articles(["Y", "A"])
                .with_stats("A", ArticleStats::with_views(10)),
        );
        let report = pipeline(&wiki, &config()).run(&request()).await.unwrap();

        assert_eq!(report.titles(), vec!["A", "Y"]);
        let y = &report.articles[1];
        assert_eq!(y.score(), 0.0);
        assert!(y.article.low_confidence);
        assert_eq!(report.summary.low_confidence, 1);
        assert_eq!(report.summary.dropped_low_confidence, 0);
    }

    #[tokio::test]
    async fn test_drop_low_confidence_policy() {
        let wiki = Arc::new(
            MockWiki::new()
                .with_articles(["Y", "A"])
                .with_stats("A", ArticleStats::with_views(10)),
        );
        let mut config = config();
        config.pipeline.empty_metadata = EmptyMetadataPolicy::Drop;
        let report = pipeline(&wiki, &config).run(&request()).await.unwrap();

        assert_eq!(report.titles(), vec!["A"]);
        assert_eq!(report.summary.dropped_low_confidence, 1);
    }

    #[tokio::test]
    async fn test_progress_carries_interim_rankings() {
        let wiki = Arc::new(views_wiki());
        let mut config = config();
        config.pipeline.batch_size = 2;
        let (tx, mut rx) = mpsc::channel(16);
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let report = pipeline(&wiki, &config)
            .run_with(&request(), Some(tx), cancel_rx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ProgressEvent::Resolved { candidates: 3 }));
        match &events[1] {
            ProgressEvent::BatchCompleted {
                batch,
                total_batches,
                ranking,
                ..
            } => {
                assert_eq!((*batch, *total_batches), (1, 2));
                assert_eq!(ranking.len(), 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[2] {
            ProgressEvent::BatchCompleted { processed, ranking, .. } => {
                assert_eq!(*processed, 3);
                assert_eq!(ranking.len(), 3);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(report.summary.batches_completed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_first_batch_returns_partial_ranking() {
        let wiki = Arc::new(
            views_wiki()
                .with_articles(["A", "B", "C", "D"])
                .with_stats("D", ArticleStats::with_views(500))
                .stat_delay("C", Duration::from_secs(5))
                .stat_delay("D", Duration::from_secs(5)),
        );
        let mut config = config();
        config.pipeline.batch_size = 2;
        let (tx, mut rx) = mpsc::channel(16);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let driver = async move {
            while let Some(event) = rx.recv().await {
                if let ProgressEvent::BatchCompleted { batch: 1, .. } = event {
                    cancel_tx.send(true).unwrap();
                }
            }
        };
        let pipeline = pipeline(&wiki, &config);
        let request = request();
        let (report, _) = tokio::join!(pipeline.run_with(&request, Some(tx), cancel_rx), driver);
        let report = report.unwrap();

        assert!(report.summary.cancelled);
        assert_eq!(report.summary.batches_completed, 1);
        assert_eq!(report.titles(), vec!["A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_batch_abandons_it() {
        let wiki = Arc::new(
            views_wiki()
                .stat_delay("A", Duration::from_secs(8))
                .stat_delay("B", Duration::from_secs(8))
                .stat_delay("C", Duration::from_secs(8)),
        );
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = cancel_tx.send(true);
        });

        let report = pipeline(&wiki, &config())
            .run_with(&request(), None, cancel_rx)
            .await
            .unwrap();

        assert!(report.summary.cancelled);
        assert!(report.articles.is_empty());
        assert_eq!(report.summary.batches_completed, 0);
    }

    #[tokio::test]
    async fn test_missing_reference_page_is_skipped() {
        let wiki = Arc::new(views_wiki().missing_page("B"));
        let report = pipeline(&wiki, &config()).run(&request()).await.unwrap();

        assert_eq!(report.titles(), vec!["A", "C"]);
        assert_eq!(report.summary.missing_reference, 1);
        assert_eq!(report.summary.low_confidence, 0);
    }

    #[test]
    fn test_default_batch_delay() {
        assert_eq!(
            AppConfig::default().batch_delay(),
            Duration::from_millis(DEFAULT_BATCH_DELAY_MS)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_are_spaced_by_delay() {
        let wiki = Arc::new(views_wiki());
        let mut config = config();
        config.pipeline.batch_size = 1;
        config.pipeline.batch_delay_ms = 100;

        let started = tokio::time::Instant::now();
        let report = pipeline(&wiki, &config).run(&request()).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.summary.batches_completed, 3);
        assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert_eq!(report.titles(), vec!["A", "B", "C"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_batch_delay_returns_partial_ranking() {
        let wiki = Arc::new(views_wiki());
        let mut config = config();
        config.pipeline.batch_size = 1;
        config.pipeline.batch_delay_ms = 5_000;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = cancel_tx.send(true);
        });

        let started = tokio::time::Instant::now();
        let report = pipeline(&wiki, &config)
            .run_with(&request(), None, cancel_rx)
            .await
            .unwrap();

        assert!(report.summary.cancelled);
        assert_eq!(report.summary.batches_completed, 1);
        assert_eq!(report.titles(), vec!["A"]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_before_resolution_fails() {
        let wiki = Arc::new(views_wiki());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let err = pipeline(&wiki, &config())
            .run_with(&request(), None, cancel_rx)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(wiki.resolve_calls(), 0);
    }
}
