use std::sync::Arc;
use std::time::Duration;

use pkgprobe_core::automation::{AutomationPort, ScriptedAutomationPort};
use pkgprobe_core::execution::{CommandExecutor, RetryPolicy};
use pkgprobe_core::models::CoreErrorKind;
use tokio::time::Instant;

fn executor(port: &Arc<ScriptedAutomationPort>) -> CommandExecutor {
    CommandExecutor::new(port.clone() as Arc<dyn AutomationPort>)
}

#[tokio::test(start_paused = true)]
async fn best_effort_gives_up_after_five_attempts_without_error() {
    let port = Arc::new(ScriptedAutomationPort::new().always_failing());
    let started = Instant::now();

    executor(&port).execute_best_effort("File.SaveAll").await;

    assert_eq!(port.attempts().len(), 5);
    assert!(port.executed().is_empty());

    // one settle delay plus a backoff between each of the five attempts
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(21), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(26), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn strict_execution_reports_exhaustion() {
    let port = Arc::new(ScriptedAutomationPort::new().always_failing());

    let error = executor(&port)
        .execute_with_retry("View.PackageManagerConsole")
        .await
        .expect_err("expected retry exhaustion");

    assert_eq!(error.kind, CoreErrorKind::RetryExhausted);
    assert!(error.message.contains("rejected 5 times"), "{}", error.message);
    assert_eq!(port.attempts().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn transient_rejections_are_retried_until_accepted() {
    let port = Arc::new(ScriptedAutomationPort::new().failing_first(2));

    let receipt = executor(&port)
        .execute_with_retry("File.SaveAll")
        .await
        .expect("third attempt should be accepted");

    assert_eq!(receipt.attempts, 3);
    assert_eq!(receipt.command, "File.SaveAll");
    assert_eq!(port.executed(), vec!["File.SaveAll"]);
}

#[tokio::test(start_paused = true)]
async fn attempt_budget_is_configurable() {
    let port = Arc::new(ScriptedAutomationPort::new().always_failing());

    let error = executor(&port)
        .max_attempts(2)
        .backoff(Duration::from_millis(10))
        .settle(Duration::ZERO)
        .execute_with_retry("File.SaveAll")
        .await
        .expect_err("expected retry exhaustion");

    assert_eq!(error.kind, CoreErrorKind::RetryExhausted);
    assert_eq!(port.attempts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_selects_between_swallowing_and_escalating() {
    let port = Arc::new(ScriptedAutomationPort::new().always_failing());
    let executor = executor(&port);

    executor
        .execute("File.SaveAll", RetryPolicy::Tolerate)
        .await
        .expect("tolerated exhaustion should not fail");

    let error = executor
        .execute("File.SaveAll", RetryPolicy::Escalate)
        .await
        .expect_err("escalated exhaustion should fail");
    assert_eq!(error.kind, CoreErrorKind::RetryExhausted);

    assert_eq!(port.attempts().len(), 10);
}
