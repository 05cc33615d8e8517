use crate::runner::Timeouts;
use crate::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Planner entry URL. Every scenario starts here.
pub const PLANNER_URL: &str = "https://tfl.gov.uk/plan-a-journey/?cid=plan-a-journey";

/// Top-level scenario document.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Name of this scenario.
    pub name: String,

    /// Browser configuration.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Wait bounds (optional overrides).
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Ordered list of steps to execute.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a scenario from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("name is required".into()));
        }
        if self.steps.is_empty() {
            return Err(Error::Config("at least one step is required".into()));
        }
        Ok(())
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BrowserConfig {
    /// Run in headless mode.
    #[serde(default)]
    pub headless: bool,

    /// Viewport size. CDP sessions are sized by viewport rather than a
    /// maximized window; defaults to 1920x1080.
    pub viewport: Option<Viewport>,
}

/// Viewport dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Which location field a step targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Start,
    Destination,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("starting point"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// Journey result mode. A closed set; anything else is rejected at parse
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyMode {
    Walking,
    Cycling,
}

impl fmt::Display for JourneyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walking => f.write_str("walking"),
            Self::Cycling => f.write_str("cycling"),
        }
    }
}

/// A recognized named control. Unrecognized labels fail with
/// [`Error::InvalidArgument`] before any browser call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedButton {
    EditPreferences,
    UpdateJourney,
    ViewDetails,
}

impl FromStr for NamedButton {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "edit_preferences" | "Edit preferences" => Ok(Self::EditPreferences),
            "update_journey" | "Update journey" => Ok(Self::UpdateJourney),
            "view_details" | "View Details" => Ok(Self::ViewDetails),
            other => Err(Error::InvalidArgument(format!(
                "button '{}' is not recognized",
                other
            ))),
        }
    }
}

impl fmt::Display for NamedButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EditPreferences => f.write_str("Edit preferences"),
            Self::UpdateJourney => f.write_str("Update journey"),
            Self::ViewDetails => f.write_str("View Details"),
        }
    }
}

impl<'de> Deserialize<'de> for NamedButton {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A step to execute against the planner.
#[derive(Debug, Clone)]
pub enum Step {
    // Actions
    OpenPlanner,
    BeginEntering(BeginEnteringStep),
    PlanJourney,
    Click(ClickStep),
    SelectLeastWalking,
    EnterInvalidStart(EnterInvalidStartStep),
    EnterInvalidLocations(EnterInvalidLocationsStep),

    // Verifications
    ExpectJourneyTime(ExpectJourneyTimeStep),
    ExpectUpdatedTime,
    ExpectAccessInfo,
    ExpectInvalidStartError,
    ExpectBothLocationsRequired,
    ExpectFieldValidationError(ExpectFieldValidationErrorStep),
}

impl Step {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenPlanner => "open_planner",
            Self::BeginEntering(_) => "begin_entering",
            Self::PlanJourney => "plan_journey",
            Self::Click(_) => "click",
            Self::SelectLeastWalking => "select_least_walking",
            Self::EnterInvalidStart(_) => "enter_invalid_start",
            Self::EnterInvalidLocations(_) => "enter_invalid_locations",
            Self::ExpectJourneyTime(_) => "expect_journey_time",
            Self::ExpectUpdatedTime => "expect_updated_time",
            Self::ExpectAccessInfo => "expect_access_info",
            Self::ExpectInvalidStartError => "expect_invalid_start_error",
            Self::ExpectBothLocationsRequired => "expect_both_locations_required",
            Self::ExpectFieldValidationError(_) => "expect_field_validation_error",
        }
    }
}

const STEP_NAMES: &[&str] = &[
    "open_planner",
    "begin_entering",
    "plan_journey",
    "click",
    "select_least_walking",
    "enter_invalid_start",
    "enter_invalid_locations",
    "expect_journey_time",
    "expect_updated_time",
    "expect_access_info",
    "expect_invalid_start_error",
    "expect_both_locations_required",
    "expect_field_validation_error",
];

const UNIT_STEP_NAMES: &[&str] = &[
    "open_planner",
    "plan_journey",
    "select_least_walking",
    "expect_updated_time",
    "expect_access_info",
    "expect_invalid_start_error",
    "expect_both_locations_required",
];

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StepVisitor)
    }
}

struct StepVisitor;

impl<'de> Visitor<'de> for StepVisitor {
    type Value = Step;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a step (string for unit verbs, or map with single key)")
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        match value {
            "open_planner" => Ok(Step::OpenPlanner),
            "plan_journey" => Ok(Step::PlanJourney),
            "select_least_walking" => Ok(Step::SelectLeastWalking),
            "expect_updated_time" => Ok(Step::ExpectUpdatedTime),
            "expect_access_info" => Ok(Step::ExpectAccessInfo),
            "expect_invalid_start_error" => Ok(Step::ExpectInvalidStartError),
            "expect_both_locations_required" => Ok(Step::ExpectBothLocationsRequired),
            other => Err(de::Error::unknown_variant(other, UNIT_STEP_NAMES)),
        }
    }

    fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::custom("expected step verb key"))?;

        let step = match key.as_str() {
            "open_planner" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::OpenPlanner
            }
            "begin_entering" => Step::BeginEntering(map.next_value()?),
            "plan_journey" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::PlanJourney
            }
            "click" => Step::Click(map.next_value()?),
            "select_least_walking" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::SelectLeastWalking
            }
            "enter_invalid_start" => Step::EnterInvalidStart(map.next_value()?),
            "enter_invalid_locations" => Step::EnterInvalidLocations(map.next_value()?),
            "expect_journey_time" => Step::ExpectJourneyTime(map.next_value()?),
            "expect_updated_time" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::ExpectUpdatedTime
            }
            "expect_access_info" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::ExpectAccessInfo
            }
            "expect_invalid_start_error" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::ExpectInvalidStartError
            }
            "expect_both_locations_required" => {
                let _: serde_yaml::Value = map.next_value()?;
                Step::ExpectBothLocationsRequired
            }
            "expect_field_validation_error" => {
                Step::ExpectFieldValidationError(map.next_value()?)
            }
            other => return Err(de::Error::unknown_variant(other, STEP_NAMES)),
        };

        Ok(step)
    }
}

// --- Step payloads ---

#[derive(Debug, Clone, Deserialize)]
pub struct BeginEnteringStep {
    /// Which location field to type into.
    pub field: Field,
    /// Location text to enter.
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickStep {
    pub button: NamedButton,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectJourneyTimeStep {
    pub mode: JourneyMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnterInvalidStartStep {
    pub start: String,
    pub destination: String,
}

/// Both fields filled with no suggestion interaction at all.
#[derive(Debug, Clone, Deserialize)]
pub struct EnterInvalidLocationsStep {
    pub start: String,
    pub destination: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectFieldValidationErrorStep {
    /// Expected text, compared exactly against the trimmed element text.
    pub text: String,
}
