//! Integration tests for the journey-planner harness.
//!
//! These tests require Chrome to be installed and available. They drive the
//! page model and runner against `data:` URL fixtures that reproduce the
//! planner's DOM contract, so no network access is needed.
//! Run with: cargo test --test integration -- --ignored

use tfl_journey_e2e::{
    BrowserConfig, Error, Field, JourneyMode, PlannerPage, Runner, Scenario, Timeouts, UiConcept,
};

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

fn headless() -> BrowserConfig {
    BrowserConfig {
        headless: true,
        viewport: None,
    }
}

/// Short bounds so negative paths fail fast.
fn fast_timeouts() -> Timeouts {
    Timeouts {
        default_ms: 2_000,
        journey_ms: 2_000,
        short_ms: 500,
        cookie_ms: 300,
        poll_ms: 50,
    }
}

async fn fixture_runner(html: &str) -> Runner {
    let mut runner = Runner::new(&headless()).await.expect("Failed to launch browser");
    runner.set_timeouts(fast_timeouts());
    runner
        .page()
        .goto(&format!("data:text/html,{}", html))
        .await
        .expect("Failed to load fixture");
    runner
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_locate_resolves_fresh_and_fails_on_missing() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let runner = fixture_runner(
        r##"
        <input id="InputFrom" value="old">
        <input id="InputTo">
    "##,
    )
    .await;
    let planner = PlannerPage::new(runner.page());

    let from = planner.locate(UiConcept::FromInput).await.expect("From input");
    assert_eq!(from.selector(), "#InputFrom");
    planner.locate(UiConcept::ToInput).await.expect("To input");

    let missing = planner.locate(UiConcept::InfoMessage).await;
    assert!(matches!(missing, Err(Error::ElementNotFound(_))));

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_set_text_replaces_existing_value() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let runner = fixture_runner(r##"<input id="InputFrom" value="Old Street">"##).await;
    let planner = PlannerPage::new(runner.page());

    let from = planner.locate(UiConcept::FromInput).await.expect("From input");
    planner
        .set_text(&from, "Kings Cross")
        .await
        .expect("Failed to set text");

    let value: String = runner
        .page()
        .evaluate("document.querySelector('#InputFrom').value")
        .await
        .expect("Failed to read value");
    assert_eq!(value, "Kings Cross");

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_suggestion_clicked_exactly_once() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner = fixture_runner(
        r##"
        <input id="InputFrom">
        <div class="tt-suggestion" onclick="window.clicks = (window.clicks || 0) + 1">
            Kings Cross Underground Station
        </div>
    "##,
    )
    .await;

    runner
        .begin_entering(Field::Start, "Kings Cross")
        .await
        .expect("begin_entering failed");

    let clicks: u32 = runner
        .page()
        .evaluate("window.clicks || 0")
        .await
        .expect("Failed to read click count");
    assert_eq!(clicks, 1);

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_absent_suggestion_is_not_an_error() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner = fixture_runner(
        r##"
        <input id="InputFrom">
        <input id="InputTo">
    "##,
    )
    .await;

    runner
        .begin_entering(Field::Start, "zzzqqq123")
        .await
        .expect("absent suggestion must not raise");
    runner
        .enter_invalid_start("zzzqqq123", "Covent Garden")
        .await
        .expect("absent suggestion must not raise");

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_enter_invalid_locations_sets_both_fields() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner = fixture_runner(
        r##"
        <input id="InputFrom">
        <input id="InputTo">
    "##,
    )
    .await;

    runner
        .enter_invalid_locations("!!!", "???")
        .await
        .expect("enter_invalid_locations failed");

    let from: String = runner
        .page()
        .evaluate("document.querySelector('#InputFrom').value")
        .await
        .expect("Failed to read From value");
    let to: String = runner
        .page()
        .evaluate("document.querySelector('#InputTo').value")
        .await
        .expect("Failed to read To value");
    assert_eq!(from, "!!!");
    assert_eq!(to, "???");

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_cookie_banner_dismissed_when_present_and_skipped_when_absent() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let runner = fixture_runner(
        r##"
        <button id="CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll"
                onclick="window.consented = true">Allow all</button>
    "##,
    )
    .await;
    runner
        .dismiss_cookie_banner()
        .await
        .expect("present banner must be dismissed");
    let consented: bool = runner
        .page()
        .evaluate("!!window.consented")
        .await
        .expect("Failed to read marker");
    assert!(consented);
    runner.close().await.expect("Failed to close browser");

    let runner = fixture_runner(r##"<p>No banner here</p>"##).await;
    runner
        .dismiss_cookie_banner()
        .await
        .expect("absent banner must be a no-op");
    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_plan_journey_waits_for_enabled_control() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // The control starts disabled, as it does while client-side validation
    // runs, and is enabled shortly after load.
    let mut runner = fixture_runner(
        r##"
        <button id="plan-journey-button" disabled
                onclick="window.planned = true">Plan my journey</button>
        <script>
            setTimeout(() => {
                document.getElementById('plan-journey-button').disabled = false;
            }, 300);
        </script>
    "##,
    )
    .await;

    runner.plan_journey().await.expect("plan_journey failed");

    let planned: bool = runner
        .page()
        .evaluate("!!window.planned")
        .await
        .expect("Failed to read marker");
    assert!(planned);

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_plan_journey_times_out_when_never_enabled() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner =
        fixture_runner(r##"<button id="plan-journey-button" disabled>Plan</button>"##).await;

    let result = runner.plan_journey().await;
    assert!(matches!(result, Err(Error::Timeout(_))));

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_view_details_waits_for_rerendered_control() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // The results panel re-renders asynchronously; the control only exists
    // after a delay.
    let mut runner = fixture_runner(
        r##"
        <div id="option-1-content"></div>
        <script>
            setTimeout(() => {
                const btn = document.createElement('button');
                btn.className = 'secondary-button show-detailed-results view-hide-details';
                btn.textContent = 'View details';
                btn.onclick = () => { window.viewed = true; };
                document.getElementById('option-1-content').appendChild(btn);
            }, 300);
        </script>
    "##,
    )
    .await;

    runner
        .click_named("view_details".parse().unwrap())
        .await
        .expect("view details click failed");

    let viewed: bool = runner
        .page()
        .evaluate("!!window.viewed")
        .await
        .expect("Failed to read marker");
    assert!(viewed);

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_journey_time_visibility() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    // Walking results appear after a delay; cycling stays hidden.
    let mut runner = fixture_runner(
        r##"
        <div class="journey-box walking" style="display:none">24 mins</div>
        <div class="journey-box cycling" style="display:none">12 mins</div>
        <script>
            setTimeout(() => {
                document.querySelector('.journey-box.walking').style.display = 'block';
            }, 300);
        </script>
    "##,
    )
    .await;

    runner
        .expect_journey_time(JourneyMode::Walking)
        .await
        .expect("walking time should become visible");

    let result = runner.expect_journey_time(JourneyMode::Cycling).await;
    assert!(matches!(result, Err(Error::AssertionFailed(_))));

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_field_validation_error_requires_exact_trimmed_text() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner = fixture_runner(
        r##"<ul><li class="field-validation-error">  The From field is required.  </li></ul>"##,
    )
    .await;

    runner
        .expect_field_validation_error("The From field is required.")
        .await
        .expect("exact trimmed match should pass");

    let result = runner
        .expect_field_validation_error("the from field is required.")
        .await;
    assert!(matches!(result, Err(Error::AssertionFailed(_))));

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_invalid_start_message_matches_substring() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner = fixture_runner(
        r##"
        <div class="info-message">
            Sorry. We found more than one location matching 'zzzqqq123'.
            Please choose from the list below.
        </div>
    "##,
    )
    .await;

    runner
        .expect_invalid_start_error()
        .await
        .expect("substring match should pass");

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_both_required_field_errors() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner = fixture_runner(
        r##"
        <span id="InputFrom-error">The From field is required.</span>
        <span id="InputTo-error">The To field is required.</span>
    "##,
    )
    .await;

    runner
        .expect_both_locations_required()
        .await
        .expect("both required-field errors should pass");

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_required_field_error_missing_fails() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut runner =
        fixture_runner(r##"<span id="InputFrom-error">The From field is required.</span>"##).await;

    let result = runner.expect_both_locations_required().await;
    assert!(matches!(result, Err(Error::AssertionFailed(_))));

    runner.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_failed_scenario_still_reports_and_tears_down() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let scenario = Scenario::parse(
        r#"
name: "Doomed"
browser:
  headless: true
timeouts:
  default_ms: 1000
  short_ms: 500
  cookie_ms: 300
steps:
  - expect_access_info
"#,
    )
    .expect("Failed to parse scenario");

    // run() owns teardown; a failed step yields a failed report, not a
    // leaked session or an Err.
    let report = tfl_journey_e2e::run_scenario(&scenario)
        .await
        .expect("run_scenario failed");
    assert!(!report.passed);
    assert_eq!(report.steps_executed, 0);
    let error = report.error.expect("failure must carry an error");
    assert!(error.contains("not displayed"), "error: {}", error);

    // The session was released; a fresh launch must succeed.
    let runner = Runner::new(&headless()).await.expect("Failed to relaunch");
    runner.close().await.expect("Failed to close browser");
}
