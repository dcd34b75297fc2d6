//! Service-specific tests
//!
//! HTTP services run against a local wiremock server; file persistence runs
//! in a temporary directory.


// Common test utilities for services
#[cfg(test)]
pub mod common {
    use serde_json::json;
    use shared::{
        CarouselOptions, CarouselRun, Dimensions, RenderOutcome, RunId, RunStatus, SlideEntry, SlideSpec,
    };

    pub fn test_slide(ordinal: u32) -> SlideSpec {
        SlideSpec::new(
            ordinal,
            json!({"headline": format!("Slide {}", ordinal)}),
            Dimensions::new(1080, 1350),
        )
    }

    /// A completed two-slide run
    pub fn completed_run(title: &str) -> CarouselRun {
        let options = CarouselOptions::new(title).with_style(json!({"palette": "sunset"}));
        CarouselRun {
            run_id: RunId::new(),
            title: options.title,
            style: options.style,
            entries: (1..=2)
                .map(|ordinal| SlideEntry {
                    spec: test_slide(ordinal),
                    outcome: RenderOutcome::Success {
                        url: format!("https://cdn.example.com/{}.png", ordinal),
                    },
                    attempts: vec![],
                })
                .collect(),
            status: RunStatus::Completed,
            succeeded: 2,
            failed: 0,
            started_at: chrono::Utc::now(),
            finished_at: Some(chrono::Utc::now()),
        }
    }
}
