//! Test fixtures for carousel runs

use std::time::Duration;
use serde_json::json;

use render_orchestrator::{OrchestratorConfig, RawResult};
use shared::{CarouselOptions, Dimensions, SlideSpec};

pub struct TestFixtures;

impl TestFixtures {
    pub const BASE_DELAY: Duration = Duration::from_secs(5);
    pub const COOL_DOWN: Duration = Duration::from_secs(8);

    /// Slide with its ordinal tagged into the payload
    pub fn slide(ordinal: u32) -> SlideSpec {
        SlideSpec::new(
            ordinal,
            json!({"headline": format!("Slide {}", ordinal), "tag": ordinal}),
            Dimensions::square(1080),
        )
    }

    /// Slides 1..=count
    pub fn slides(count: u32) -> Vec<SlideSpec> {
        (1..=count).map(Self::slide).collect()
    }

    pub fn options() -> CarouselOptions {
        CarouselOptions::new("Product Launch").with_style(json!({"theme": "midnight", "font": "Inter"}))
    }

    pub fn url(ordinal: u32) -> String {
        format!("https://cdn.example.com/carousel/slide-{}.png", ordinal)
    }

    pub fn rendered(ordinal: u32) -> RawResult {
        RawResult::rendered(Self::url(ordinal))
    }

    /// Well-formed answer pointing at the service's overload stand-in
    pub fn placeholder() -> RawResult {
        RawResult::rendered("https://cdn.example.com/static/placeholder.png")
    }

    pub fn overloaded() -> RawResult {
        RawResult::overloaded("renderer busy, try again later")
    }

    /// Default timing contract: 3 attempts, 5 s base, 8 s cool-down
    pub fn config() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }
}
