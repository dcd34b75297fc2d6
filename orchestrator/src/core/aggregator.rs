//! Ordered bookkeeping of slide outcomes for one run

use chrono::{DateTime, Utc};

use shared::{CarouselOptions, CarouselRun, JobAttempt, RenderOutcome, RunId, RunStatus, SlideEntry, SlideSpec};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Collects terminal outcomes in slide order.
///
/// `finish` consumes the aggregator, so a finished run cannot be mutated.
#[derive(Debug)]
pub struct ResultAggregator {
    run_id: RunId,
    options: CarouselOptions,
    started_at: DateTime<Utc>,
    entries: Vec<SlideEntry>,
    succeeded: usize,
    failed: usize,
}

impl ResultAggregator {
    pub fn new(run_id: RunId, options: CarouselOptions) -> Self {
        Self {
            run_id,
            options,
            started_at: Utc::now(),
            entries: Vec::new(),
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Ordinal the next recorded slide must carry
    pub fn expected_ordinal(&self) -> u32 {
        self.entries.last().map(|entry| entry.spec.ordinal + 1).unwrap_or(1)
    }

    /// Append a terminal outcome. Out-of-order, skipped or repeated
    /// ordinals are refused.
    pub fn record(
        &mut self,
        spec: SlideSpec,
        outcome: RenderOutcome,
        attempts: Vec<JobAttempt>,
    ) -> OrchestratorResult<()> {
        let expected = self.expected_ordinal();
        if spec.ordinal != expected {
            return Err(OrchestratorError::OrderingViolation {
                ordinal: spec.ordinal,
                expected,
            });
        }

        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.entries.push(SlideEntry { spec, outcome, attempts });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Status of a run that walked its whole slide list
    pub fn resolve_status(&self, total_slides: usize) -> RunStatus {
        if self.failed > 0 {
            RunStatus::PartiallyFailed
        } else if self.entries.len() == total_slides {
            RunStatus::Completed
        } else {
            RunStatus::Aborted
        }
    }

    /// Freeze the run
    pub fn finish(self, status: RunStatus) -> CarouselRun {
        CarouselRun {
            run_id: self.run_id,
            title: self.options.title,
            style: self.options.style,
            entries: self.entries,
            status,
            succeeded: self.succeeded,
            failed: self.failed,
            started_at: self.started_at,
            finished_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::Dimensions;

    fn spec(ordinal: u32) -> SlideSpec {
        SlideSpec::new(ordinal, json!({"text": format!("slide {}", ordinal)}), Dimensions::default())
    }

    fn success(ordinal: u32) -> RenderOutcome {
        RenderOutcome::Success {
            url: format!("https://cdn/{}.png", ordinal),
        }
    }

    #[test]
    fn test_records_in_order_and_counts() {
        let mut aggregator = ResultAggregator::new(RunId::new(), CarouselOptions::new("Deck"));

        aggregator.record(spec(1), success(1), vec![]).unwrap();
        aggregator.record(spec(2), success(2), vec![]).unwrap();
        aggregator
            .record(spec(3), RenderOutcome::FatalFailure { reason: "bad".to_string() }, vec![])
            .unwrap();

        assert_eq!(aggregator.len(), 3);
        assert_eq!(aggregator.succeeded(), 2);
        assert_eq!(aggregator.failed(), 1);

        let run = aggregator.finish(RunStatus::PartiallyFailed);
        assert_eq!(run.rendered_urls(), vec!["https://cdn/1.png", "https://cdn/2.png"]);
        assert_eq!(run.failed_ordinals(), vec![3]);
    }

    #[test]
    fn test_rejects_gaps_duplicates_and_wrong_start() {
        let mut aggregator = ResultAggregator::new(RunId::new(), CarouselOptions::default());

        assert!(matches!(
            aggregator.record(spec(2), success(2), vec![]),
            Err(OrchestratorError::OrderingViolation { ordinal: 2, expected: 1 })
        ));

        aggregator.record(spec(1), success(1), vec![]).unwrap();
        assert!(matches!(
            aggregator.record(spec(1), success(1), vec![]),
            Err(OrchestratorError::OrderingViolation { ordinal: 1, expected: 2 })
        ));
        assert!(matches!(
            aggregator.record(spec(3), success(3), vec![]),
            Err(OrchestratorError::OrderingViolation { ordinal: 3, expected: 2 })
        ));
        assert_eq!(aggregator.len(), 1);
    }

    #[test]
    fn test_resolve_status() {
        let mut aggregator = ResultAggregator::new(RunId::new(), CarouselOptions::default());
        aggregator.record(spec(1), success(1), vec![]).unwrap();

        assert_eq!(aggregator.resolve_status(1), RunStatus::Completed);
        assert_eq!(aggregator.resolve_status(2), RunStatus::Aborted);

        aggregator
            .record(spec(2), RenderOutcome::FatalFailure { reason: "bad".to_string() }, vec![])
            .unwrap();
        assert_eq!(aggregator.resolve_status(2), RunStatus::PartiallyFailed);
    }

    #[test]
    fn test_finish_carries_options_and_counts() {
        let run_id = RunId::new();
        let options = CarouselOptions::new("Launch").with_style(json!({"theme": "dark"}));
        let mut aggregator = ResultAggregator::new(run_id, options);
        aggregator.record(spec(1), success(1), vec![]).unwrap();

        let run = aggregator.finish(RunStatus::Completed);
        assert_eq!(run.run_id, run_id);
        assert_eq!(run.title, "Launch");
        assert_eq!(run.style, json!({"theme": "dark"}));
        assert_eq!(run.succeeded, 1);
        assert_eq!(run.failed, 0);
        assert!(run.finished_at.is_some());
        assert!(run.is_complete());
    }
}
