use crate::page::{ElementHandle, PlannerPage, UiConcept};
use crate::scenario::{
    BrowserConfig, Field, JourneyMode, NamedButton, Scenario, Step, PLANNER_URL,
};
use crate::{Error, Result};
use eoka::{Browser, Page};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const INVALID_START_FRAGMENT: &str = "We found more than one location matching";
const FROM_REQUIRED_TEXT: &str = "The From field is required.";
const TO_REQUIRED_TEXT: &str = "The To field is required.";

fn default_wait_ms() -> u64 {
    20_000
}
fn default_journey_ms() -> u64 {
    50_000
}
fn default_short_ms() -> u64 {
    10_000
}
fn default_cookie_ms() -> u64 {
    3_000
}
fn default_poll_ms() -> u64 {
    250
}

/// Wait bounds for the planner's asynchronous updates.
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    /// Default bound for presence/visibility waits.
    #[serde(default = "default_wait_ms")]
    pub default_ms: u64,

    /// Journey results take longer to compute.
    #[serde(default = "default_journey_ms")]
    pub journey_ms: u64,

    /// Shorter bound used where absence is the expected signal.
    #[serde(default = "default_short_ms")]
    pub short_ms: u64,

    /// Best-effort bound for the cookie-consent overlay.
    #[serde(default = "default_cookie_ms")]
    pub cookie_ms: u64,

    /// Poll interval for interactability checks.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: default_wait_ms(),
            journey_ms: default_journey_ms(),
            short_ms: default_short_ms(),
            cookie_ms: default_cookie_ms(),
            poll_ms: default_poll_ms(),
        }
    }
}

/// Outcome of one scenario run. A scenario is binary pass/fail; the error
/// names the failed step or assertion with expected vs. actual text where
/// applicable.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Whether every step completed.
    pub passed: bool,
    /// Failure message if any step raised.
    pub error: Option<String>,
    /// Number of steps executed.
    pub steps_executed: usize,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Launch a session, run the scenario, and tear the session down.
pub async fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport> {
    let mut runner = Runner::new(&scenario.browser).await?;
    runner.set_timeouts(scenario.timeouts.clone());
    runner.run(scenario).await
}

/// Drives one scenario over one exclusive browser session.
///
/// Owns all timing and assertion logic; the page model underneath is a pure
/// DOM accessor. Sessions are never shared or reused across scenarios.
pub struct Runner {
    browser: Browser,
    page: Page,
    timeouts: Timeouts,
}

impl Runner {
    /// Launch a browser session for one scenario.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1920),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(1080),
            ..Default::default()
        };

        debug!("launching browser (headless: {})", config.headless);
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            timeouts: Timeouts::default(),
        })
    }

    /// Get a reference to the page (for fixture-backed tests).
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    fn planner(&self) -> PlannerPage<'_> {
        PlannerPage::new(&self.page)
    }

    /// Run all steps, then close the browser. Teardown runs on every exit
    /// path, so a failed step never leaks a browser process into the next
    /// scenario.
    pub async fn run(mut self, scenario: &Scenario) -> Result<ScenarioReport> {
        info!("running scenario: {}", scenario.name);
        let start = Instant::now();

        let mut steps_executed = 0;
        let outcome = self.execute_steps(scenario, &mut steps_executed).await;
        let close = self.browser.close().await.map_err(Error::from);

        finish_report(
            &scenario.name,
            outcome,
            close,
            steps_executed,
            start.elapsed().as_millis() as u64,
        )
    }

    async fn execute_steps(&mut self, scenario: &Scenario, executed: &mut usize) -> Result<()> {
        for (i, step) in scenario.steps.iter().enumerate() {
            debug!("executing step {}: {}", i + 1, step.name());
            self.execute(step).await?;
            *executed += 1;
        }
        Ok(())
    }

    /// Execute a single step.
    pub async fn execute(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::OpenPlanner => self.open_planner().await,
            Step::BeginEntering(s) => self.begin_entering(s.field, &s.text).await,
            Step::PlanJourney => self.plan_journey().await,
            Step::Click(s) => self.click_named(s.button).await,
            Step::SelectLeastWalking => self.select_least_walking().await,
            Step::EnterInvalidStart(s) => self.enter_invalid_start(&s.start, &s.destination).await,
            Step::EnterInvalidLocations(s) => {
                self.enter_invalid_locations(&s.start, &s.destination).await
            }
            Step::ExpectJourneyTime(s) => self.expect_journey_time(s.mode).await,
            Step::ExpectUpdatedTime => self.expect_updated_time().await,
            Step::ExpectAccessInfo => self.expect_access_info().await,
            Step::ExpectInvalidStartError => self.expect_invalid_start_error().await,
            Step::ExpectBothLocationsRequired => self.expect_both_locations_required().await,
            Step::ExpectFieldValidationError(s) => {
                self.expect_field_validation_error(&s.text).await
            }
        }
    }

    /// Navigate to the planner, then best-effort dismiss the cookie
    /// overlay. Absence of the overlay is not an error.
    pub async fn open_planner(&mut self) -> Result<()> {
        info!("open planner: {}", PLANNER_URL);
        self.page.goto(PLANNER_URL).await?;
        self.dismiss_cookie_banner().await
    }

    /// Dismiss the cookie-consent overlay if it appears within the short
    /// bound. Only a missing overlay is downgraded to a no-op; any other
    /// error propagates.
    pub async fn dismiss_cookie_banner(&self) -> Result<()> {
        match self
            .wait_for_present(UiConcept::CookieConsent, self.timeouts.cookie_ms)
            .await
        {
            Ok(handle) => self.planner().click(&handle).await,
            Err(Error::Timeout(_)) | Err(Error::ElementNotFound(_)) => {
                debug!("no cookie banner");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Type into a location field, then click the first autocomplete
    /// suggestion if one appears within the bound. No suggestion within the
    /// bound completes without error; the absence path drives the invalid
    /// location scenarios.
    pub async fn begin_entering(&mut self, field: Field, text: &str) -> Result<()> {
        info!("enter {}: '{}'", field, text);
        let input = self
            .wait_for_present(field_concept(field), self.timeouts.default_ms)
            .await?;
        self.planner().set_text(&input, text).await?;
        self.click_suggestion(self.timeouts.default_ms).await
    }

    async fn click_suggestion(&self, timeout_ms: u64) -> Result<()> {
        match self
            .wait_for_visible(UiConcept::SuggestionItem, timeout_ms)
            .await
        {
            Ok(handle) => self.planner().click(&handle).await,
            Err(Error::Timeout(_)) | Err(Error::ElementNotFound(_)) => {
                debug!("no suggestion appeared within {}ms", timeout_ms);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for the plan control to be present and interactable before
    /// clicking. The control stays disabled while client-side validation
    /// runs, so presence alone is not enough.
    pub async fn plan_journey(&mut self) -> Result<()> {
        info!("plan journey");
        self.wait_for_present(UiConcept::PlanJourneyButton, self.timeouts.default_ms)
            .await?;
        let button = self
            .wait_for_interactable(UiConcept::PlanJourneyButton, self.timeouts.short_ms)
            .await?;
        self.planner().click(&button).await
    }

    /// Click one of the recognized named controls.
    pub async fn click_named(&mut self, button: NamedButton) -> Result<()> {
        info!("click: {}", button);
        let concept = match button {
            NamedButton::EditPreferences => UiConcept::EditPreferencesButton,
            NamedButton::UpdateJourney => UiConcept::UpdateJourneyButton,
            NamedButton::ViewDetails => UiConcept::ViewDetailsButton,
        };
        let handle = match button {
            // The results panel re-renders after option selection; poll for
            // the control to become interactable instead of sleeping.
            NamedButton::ViewDetails => {
                self.wait_for_interactable(concept, self.timeouts.default_ms)
                    .await?
            }
            _ => self.wait_for_present(concept, self.timeouts.default_ms).await?,
        };
        self.planner().click(&handle).await
    }

    /// Click the least-walking preference control.
    pub async fn select_least_walking(&mut self) -> Result<()> {
        info!("select least walking");
        let handle = self
            .wait_for_present(UiConcept::LeastWalkingOption, self.timeouts.default_ms)
            .await?;
        self.planner().click(&handle).await
    }

    /// Fill both fields; the suggestion wait uses the short bound and an
    /// absent suggestion is the expected signal of an invalid location.
    pub async fn enter_invalid_start(&mut self, start: &str, destination: &str) -> Result<()> {
        info!(
            "enter invalid start '{}', destination '{}'",
            start, destination
        );
        self.set_both_fields(start, destination).await?;
        self.click_suggestion(self.timeouts.short_ms).await
    }

    /// Fill both fields with no suggestion interaction at all.
    pub async fn enter_invalid_locations(&mut self, start: &str, destination: &str) -> Result<()> {
        info!(
            "enter invalid locations '{}' and '{}'",
            start, destination
        );
        self.set_both_fields(start, destination).await
    }

    async fn set_both_fields(&self, start: &str, destination: &str) -> Result<()> {
        let from = self
            .wait_for_present(UiConcept::FromInput, self.timeouts.default_ms)
            .await?;
        self.planner().set_text(&from, start).await?;
        let to = self
            .wait_for_present(UiConcept::ToInput, self.timeouts.default_ms)
            .await?;
        self.planner().set_text(&to, destination).await
    }

    /// Wait for the journey box for `mode` to become visible.
    pub async fn expect_journey_time(&mut self, mode: JourneyMode) -> Result<()> {
        let concept = match mode {
            JourneyMode::Walking => UiConcept::WalkingJourneyTime,
            JourneyMode::Cycling => UiConcept::CyclingJourneyTime,
        };
        self.expect_visible(concept, self.timeouts.journey_ms).await
    }

    /// Wait for the updated time summary to become visible.
    pub async fn expect_updated_time(&mut self) -> Result<()> {
        self.expect_visible(UiConcept::UpdatedJourneyTime, self.timeouts.default_ms)
            .await
    }

    /// Wait for the accessibility-information panel to become visible.
    pub async fn expect_access_info(&mut self) -> Result<()> {
        self.expect_visible(UiConcept::AccessInformation, self.timeouts.default_ms)
            .await
    }

    async fn expect_visible(&self, concept: UiConcept, timeout_ms: u64) -> Result<()> {
        info!("expect visible: {}", concept);
        let handle = self
            .wait_for_visible(concept, timeout_ms)
            .await
            .map_err(|e| Error::AssertionFailed(format!("{} is not displayed: {}", concept, e)))?;
        if !self.planner().is_displayed(&handle).await? {
            return Err(Error::AssertionFailed(format!(
                "{} is not displayed",
                concept
            )));
        }
        Ok(())
    }

    /// Wait for the info message and assert it reports an unmatched
    /// location (substring check; the message carries surrounding text).
    pub async fn expect_invalid_start_error(&mut self) -> Result<()> {
        info!("expect invalid-start message");
        let handle = self
            .wait_for_present(UiConcept::InfoMessage, self.timeouts.short_ms)
            .await
            .map_err(|e| Error::AssertionFailed(format!("info message was not found: {}", e)))?;
        let text = self.planner().text(&handle).await?;
        assert_contains(&text, INVALID_START_FRAGMENT, UiConcept::InfoMessage.label())
    }

    /// Wait for both field errors and assert each carries its
    /// required-field text.
    pub async fn expect_both_locations_required(&mut self) -> Result<()> {
        info!("expect required-field errors");
        let from = self
            .wait_for_visible(UiConcept::FromFieldError, self.timeouts.default_ms)
            .await
            .map_err(|e| {
                Error::AssertionFailed(format!("From field error is not displayed: {}", e))
            })?;
        let to = self
            .wait_for_visible(UiConcept::ToFieldError, self.timeouts.default_ms)
            .await
            .map_err(|e| {
                Error::AssertionFailed(format!("To field error is not displayed: {}", e))
            })?;
        let from_text = self.planner().text(&from).await?;
        let to_text = self.planner().text(&to).await?;
        assert_contains(&from_text, FROM_REQUIRED_TEXT, UiConcept::FromFieldError.label())?;
        assert_contains(&to_text, TO_REQUIRED_TEXT, UiConcept::ToFieldError.label())
    }

    /// Wait for the validation list item and assert its trimmed text equals
    /// `expected` exactly. Exact match, not substring: validation items
    /// carry the full sentence verbatim, unlike the info message.
    pub async fn expect_field_validation_error(&mut self, expected: &str) -> Result<()> {
        info!("expect validation error: '{}'", expected);
        let handle = self
            .wait_for_visible(UiConcept::FieldValidationError, self.timeouts.default_ms)
            .await
            .map_err(|e| {
                Error::AssertionFailed(format!("validation error is not displayed: {}", e))
            })?;
        let text = self.planner().text(&handle).await?;
        assert_exact(text.trim(), expected, UiConcept::FieldValidationError.label())
    }

    /// Close the browser. [`Runner::run`] does this on every exit path;
    /// callers driving steps by hand must call it themselves.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }

    // --- Bounded waits ---

    async fn wait_for_present(&self, concept: UiConcept, timeout_ms: u64) -> Result<ElementHandle> {
        debug!("wait_for: {} ({}ms)", concept, timeout_ms);
        self.page
            .wait_for(concept.selector(), timeout_ms)
            .await
            .map_err(|e| {
                Error::Timeout(format!(
                    "{} did not appear within {}ms: {}",
                    concept, timeout_ms, e
                ))
            })?;
        self.planner().locate(concept).await
    }

    async fn wait_for_visible(&self, concept: UiConcept, timeout_ms: u64) -> Result<ElementHandle> {
        debug!("wait_for_visible: {} ({}ms)", concept, timeout_ms);
        self.page
            .wait_for_visible(concept.selector(), timeout_ms)
            .await
            .map_err(|e| {
                Error::Timeout(format!(
                    "{} did not become visible within {}ms: {}",
                    concept, timeout_ms, e
                ))
            })?;
        self.planner().locate(concept).await
    }

    /// Bounded poll for visible + enabled. Replaces the fixed settle sleep
    /// the results panel used to need: interactability is directly
    /// observable, so there is no residual minimum delay.
    async fn wait_for_interactable(
        &self,
        concept: UiConcept,
        timeout_ms: u64,
    ) -> Result<ElementHandle> {
        debug!("wait_for_interactable: {} ({}ms)", concept, timeout_ms);
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Ok(handle) = self.planner().locate(concept).await {
                if self.planner().is_interactable(&handle).await? {
                    return Ok(handle);
                }
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "{} did not become interactable within {}ms",
                    concept, timeout_ms
                )));
            }
            self.page.wait(self.timeouts.poll_ms).await;
        }
    }
}

/// Fold the step outcome and the teardown result into one report. A
/// teardown failure never masks a step failure: the report keeps the step
/// error and the close error is only logged. A teardown failure after
/// passing steps does propagate, since the session leaked.
fn finish_report(
    scenario_name: &str,
    outcome: Result<()>,
    close: Result<()>,
    steps_executed: usize,
    duration_ms: u64,
) -> Result<ScenarioReport> {
    let error = match outcome {
        Ok(()) => None,
        Err(e) => {
            warn!("scenario '{}' failed: {}", scenario_name, e);
            Some(e.to_string())
        }
    };

    if let Err(e) = close {
        if error.is_none() {
            return Err(e);
        }
        warn!("failed to close browser: {}", e);
    }

    Ok(ScenarioReport {
        passed: error.is_none(),
        error,
        steps_executed,
        duration_ms,
    })
}

fn field_concept(field: Field) -> UiConcept {
    match field {
        Field::Start => UiConcept::FromInput,
        Field::Destination => UiConcept::ToInput,
    }
}

fn assert_contains(actual: &str, expected: &str, what: &str) -> Result<()> {
    if actual.contains(expected) {
        Ok(())
    } else {
        Err(Error::AssertionFailed(format!(
            "{}: expected text containing '{}', got '{}'",
            what,
            expected,
            actual.trim()
        )))
    }
}

fn assert_exact(actual: &str, expected: &str, what: &str) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::AssertionFailed(format!(
            "{}: expected '{}' exactly, got '{}'",
            what, expected, actual
        )))
    }
}
