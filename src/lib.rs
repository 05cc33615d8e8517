//! # tfl-journey-e2e
//!
//! End-to-end browser tests for the TfL journey planner. Scenarios are YAML
//! step lists executed over CDP: a page model resolves semantic UI concepts
//! to freshly-located elements, and a runner owns every bounded wait and
//! assertion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tfl_journey_e2e::{run_scenario, Scenario};
//!
//! # #[tokio::main]
//! # async fn main() -> tfl_journey_e2e::Result<()> {
//! let scenario = Scenario::load("scenarios/plan_journey.yaml")?;
//! let report = run_scenario(&scenario).await?;
//! println!("Passed: {}", report.passed);
//! # Ok(())
//! # }
//! ```

mod page;
mod runner;
mod scenario;

pub use page::{ElementHandle, PlannerPage, UiConcept};
pub use runner::{run_scenario, Runner, ScenarioReport, Timeouts};
pub use scenario::{
    BrowserConfig, Field, JourneyMode, NamedButton, Scenario, Step, Viewport, PLANNER_URL,
};

/// Result type for scenario operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or running a scenario.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
