use crate::{Error, Result};
use eoka::Page;
use std::fmt;

/// A semantic UI concept on the journey planner, mapped to a fixed CSS
/// selector.
///
/// The planner re-renders results asynchronously, so concepts are resolved
/// against the live DOM on every lookup; a node resolved in one step may be
/// gone by the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiConcept {
    FromInput,
    ToInput,
    PlanJourneyButton,
    EditPreferencesButton,
    LeastWalkingOption,
    UpdateJourneyButton,
    WalkingJourneyTime,
    CyclingJourneyTime,
    UpdatedJourneyTime,
    ViewDetailsButton,
    SuggestionItem,
    CookieConsent,
    InfoMessage,
    FromFieldError,
    ToFieldError,
    FieldValidationError,
    AccessInformation,
}

impl UiConcept {
    /// CSS selector for this concept. Locators are CSS exclusively; a DOM
    /// redesign by the site breaks them, which is acceptable for a suite
    /// that black-box verifies exactly that site.
    pub fn selector(self) -> &'static str {
        match self {
            Self::FromInput => "#InputFrom",
            Self::ToInput => "#InputTo",
            Self::PlanJourneyButton => "#plan-journey-button",
            Self::EditPreferencesButton => ".toggle-options.more-options",
            Self::LeastWalkingOption => "label[for='JourneyPreference_2']",
            Self::UpdateJourneyButton => {
                "div[id='more-journey-options'] div input[value='Update journey']"
            }
            Self::WalkingJourneyTime => ".journey-box.walking",
            Self::CyclingJourneyTime => ".journey-box.cycling",
            Self::UpdatedJourneyTime => {
                "div[id='option-1-heading'] div[class='clearfix time-boxes time-boxes-override']"
            }
            Self::ViewDetailsButton => {
                "div[id='option-1-content'] button.secondary-button.show-detailed-results.view-hide-details"
            }
            Self::SuggestionItem => ".tt-suggestion",
            Self::CookieConsent => "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
            Self::InfoMessage => ".info-message",
            Self::FromFieldError => "#InputFrom-error",
            Self::ToFieldError => "#InputTo-error",
            Self::FieldValidationError => "li.field-validation-error",
            Self::AccessInformation => "div.access-information",
        }
    }

    /// Label used in log lines and failure messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::FromInput => "From input",
            Self::ToInput => "To input",
            Self::PlanJourneyButton => "plan journey button",
            Self::EditPreferencesButton => "edit preferences button",
            Self::LeastWalkingOption => "least walking option",
            Self::UpdateJourneyButton => "update journey button",
            Self::WalkingJourneyTime => "walking journey time",
            Self::CyclingJourneyTime => "cycling journey time",
            Self::UpdatedJourneyTime => "updated journey time",
            Self::ViewDetailsButton => "view details button",
            Self::SuggestionItem => "suggestion item",
            Self::CookieConsent => "cookie consent button",
            Self::InfoMessage => "info message",
            Self::FromFieldError => "From field error",
            Self::ToFieldError => "To field error",
            Self::FieldValidationError => "field validation error",
            Self::AccessInformation => "access information panel",
        }
    }
}

impl fmt::Display for UiConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An ephemeral reference to a concept resolved against the live DOM.
///
/// Obtained fresh from [`PlannerPage::locate`] per interaction and never
/// cached across steps, since the underlying node may have been replaced by
/// an asynchronous update.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    concept: UiConcept,
}

impl ElementHandle {
    pub fn concept(&self) -> UiConcept {
        self.concept
    }

    pub fn selector(&self) -> &'static str {
        self.concept.selector()
    }
}

/// DOM-facing accessor for the journey planner page.
///
/// Pure lookup and primitive actions only: no waiting, no retries, no
/// assertions. All bounded waits live in the runner.
pub struct PlannerPage<'a> {
    page: &'a Page,
}

impl<'a> PlannerPage<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// Resolve a concept against the current document.
    ///
    /// Zero matches fail with [`Error::ElementNotFound`] immediately. When
    /// a selector matches more than one node the first match wins
    /// (querySelector semantics).
    pub async fn locate(&self, concept: UiConcept) -> Result<ElementHandle> {
        let js = format!("!!document.querySelector({})", js_string(concept.selector()));
        let exists: bool = self.page.evaluate(&js).await?;
        if exists {
            Ok(ElementHandle { concept })
        } else {
            Err(Error::ElementNotFound(format!(
                "{} ({})",
                concept,
                concept.selector()
            )))
        }
    }

    /// Clear the field and input `text`. Fires the page's input events,
    /// which may asynchronously populate the suggestion list.
    pub async fn set_text(&self, handle: &ElementHandle, text: &str) -> Result<()> {
        self.page.fill(handle.selector(), text).await?;
        Ok(())
    }

    /// Dispatch a click. May trigger navigation, panel expansion, or an
    /// asynchronous content load; waiting for those is a separate step.
    pub async fn click(&self, handle: &ElementHandle) -> Result<()> {
        self.page.click(handle.selector()).await?;
        Ok(())
    }

    /// Text content of the resolved node.
    pub async fn text(&self, handle: &ElementHandle) -> Result<String> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.textContent : null; }})()",
            js_string(handle.selector())
        );
        let text: Option<String> = self.page.evaluate(&js).await?;
        text.ok_or_else(|| {
            Error::ElementNotFound(format!("{} ({})", handle.concept(), handle.selector()))
        })
    }

    /// Whether the resolved node currently renders a visible box.
    pub async fn is_displayed(&self, handle: &ElementHandle) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }})()"#,
            js_string(handle.selector())
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Whether the resolved node is visible and enabled, i.e. safe to
    /// click. Controls stay disabled while client-side validation runs.
    pub async fn is_interactable(&self, handle: &ElementHandle) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el || el.disabled) return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }})()"#,
            js_string(handle.selector())
        );
        Ok(self.page.evaluate(&js).await?)
    }
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap()
}
