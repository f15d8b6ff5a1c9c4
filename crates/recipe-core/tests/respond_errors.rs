//! Respond handler error paths: unknown executions, wrong-state calls and
//! payload validation, all without mutating stored state.

use recipe_core::{EngineError, ExecutionStatus, RecipeEngine, NoopInvoker};
use recipe_domain::{FieldType, InputField, RecipeRelease, ReleaseStep, StepKind};
use serde_json::json;
use uuid::Uuid;

fn scope() -> recipe_core::ExecutionScope {
    recipe_core::ExecutionScope { organization_id: Uuid::new_v4(),
                                  environment_id: Uuid::new_v4() }
}

fn gated_release() -> RecipeRelease {
    RecipeRelease::new(Uuid::new_v4(),
                       1,
                       vec![ReleaseStep::new("confirm",
                                             StepKind::HumanInput { fields: vec![
                                                 InputField::required("approved", "Approve?", FieldType::Boolean),
                                                 InputField::required("quota", "Quota", FieldType::Number),
                                                 InputField::optional("tag", "Tag", FieldType::Text, json!("default")),
                                             ] })])
}

#[test]
fn respond_to_unknown_execution_is_not_found() {
    let release = gated_release();
    let mut engine = RecipeEngine::in_memory(NoopInvoker);

    let missing = Uuid::new_v4();
    let err = engine.respond(missing, &release, &json!({"approved": true, "quota": 1})).unwrap_err();
    assert!(matches!(err, EngineError::ExecutionNotFound(id) if id == missing));
    assert_eq!(err.http_status(), 404);
}

#[test]
fn respond_outside_waiting_input_is_a_state_conflict() {
    // A release with no human gate completes immediately; respond on the
    // terminal row is the wrong-state case.
    let release = RecipeRelease::new(Uuid::new_v4(),
                                     1,
                                     vec![ReleaseStep::new("only",
                                                           StepKind::ToolCall { tool: "noop".into(),
                                                                                params: json!({}) })]);
    let mut engine = RecipeEngine::in_memory(NoopInvoker);
    let finished = engine.start(&release, scope(), json!({})).expect("start");
    assert_eq!(finished.status, ExecutionStatus::Completed);

    let err = engine.respond(finished.id, &release, &json!({})).unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { status: ExecutionStatus::Completed, .. }));
    assert_eq!(err.http_status(), 409);
}

#[test]
fn invalid_payload_lists_every_offending_field_and_mutates_nothing() {
    let release = gated_release();
    let mut engine = RecipeEngine::in_memory(NoopInvoker);
    let started = engine.start(&release, scope(), json!({})).expect("start");
    let writes_before = engine.store().journal().len();

    // approved missing, quota mistyped, plus an unknown key.
    let err = engine.respond(started.id, &release, &json!({"quota": "lots", "surprise": 1})).unwrap_err();
    let EngineError::InvalidResponse { fields } = err else {
        panic!("expected InvalidResponse, got {err}");
    };
    let named: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
    assert!(named.contains(&"approved"));
    assert!(named.contains(&"quota"));
    assert!(named.contains(&"surprise"));

    // Still suspended at the same step, nothing persisted.
    let stored = engine.resume(started.id, &release).expect("resume").expect("exists");
    assert_eq!(stored.status, ExecutionStatus::WaitingInput);
    assert!(stored.results.is_empty());
    assert_eq!(engine.store().journal().len(), writes_before);
}

#[test]
fn respond_and_resume_require_the_release_that_started_the_execution() {
    let release = gated_release();
    let foreign = RecipeRelease::new(Uuid::new_v4(),
                                     1,
                                     vec![ReleaseStep::new("foreign_step",
                                                           StepKind::ToolCall { tool: "noop".into(),
                                                                                params: json!({}) })]);
    let mut engine = RecipeEngine::in_memory(NoopInvoker);
    let started = engine.start(&release, scope(), json!({})).expect("start");
    let writes_before = engine.store().journal().len();

    // A valid payload with the wrong release must not advance the run with
    // steps the execution's release does not contain.
    let err = engine.respond(started.id, &foreign, &json!({"approved": true, "quota": 1})).unwrap_err();
    assert!(matches!(err, EngineError::ReleaseMismatch { expected, found, .. }
                     if expected == release.id && found == foreign.id));
    assert_eq!(err.http_status(), 409);
    assert_eq!(engine.store().journal().len(), writes_before);

    let err = engine.resume(started.id, &foreign).unwrap_err();
    assert!(matches!(err, EngineError::ReleaseMismatch { .. }));

    // The right release still drives the execution to completion, and no
    // foreign step ever shows up in the results.
    let finished = engine.respond(started.id, &release, &json!({"approved": true, "quota": 1})).expect("respond");
    assert_eq!(finished.status, ExecutionStatus::Completed);
    assert!(!finished.results.contains_key("foreign_step"));
}

#[test]
fn non_object_payload_is_rejected() {
    let release = gated_release();
    let mut engine = RecipeEngine::in_memory(NoopInvoker);
    let started = engine.start(&release, scope(), json!({})).expect("start");

    let err = engine.respond(started.id, &release, &json!(["approved"])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidResponse { .. }));
    assert_eq!(err.http_status(), 400);
}

#[test]
fn optional_field_defaults_are_applied_on_respond() {
    let release = gated_release();
    let mut engine = RecipeEngine::in_memory(NoopInvoker);
    let started = engine.start(&release, scope(), json!({})).expect("start");

    let finished = engine.respond(started.id, &release, &json!({"approved": true, "quota": 3})).expect("respond");
    assert_eq!(finished.status, ExecutionStatus::Completed);
    assert_eq!(finished.results["confirm"].value,
               json!({"approved": true, "quota": 3, "tag": "default"}));
}

#[test]
fn explicit_null_for_a_required_field_is_missing() {
    let release = gated_release();
    let mut engine = RecipeEngine::in_memory(NoopInvoker);
    let started = engine.start(&release, scope(), json!({})).expect("start");

    let err = engine.respond(started.id, &release, &json!({"approved": null, "quota": 2})).unwrap_err();
    let EngineError::InvalidResponse { fields } = err else {
        panic!("expected InvalidResponse, got {err}");
    };
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field, "approved");
}
