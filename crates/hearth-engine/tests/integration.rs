use async_trait::async_trait;
use hearth_core::config::Config;
use hearth_core::manual::{Manual, ManualKind};
use hearth_core::status::OnboardingStatus;
use hearth_core::types::{DomainId, PhaseId, UpdateSource};
use hearth_engine::{EngineError, EngineState, PhaseEngine, PhaseOutcome, RefreshEngine};
use hearth_oracle::{
    ConversationMode, ConversationRequest, ConversationResponse, Oracle, OracleError, ResponseKind,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Scripted oracle
// ---------------------------------------------------------------------------

/// Replays a fixed script of responses and records every request it saw.
struct ScriptedOracle {
    script: Mutex<VecDeque<Result<ConversationResponse, OracleError>>>,
    requests: Mutex<Vec<ConversationRequest>>,
}

impl ScriptedOracle {
    fn new(script: Vec<Result<ConversationResponse, OracleError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ConversationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn converse(
        &self,
        request: &ConversationRequest,
    ) -> Result<ConversationResponse, OracleError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted")
    }
}

fn question(message: &str, turn_count: u32) -> ConversationResponse {
    ConversationResponse {
        conversation_id: "c1".to_string(),
        kind: ResponseKind::Question,
        message: message.to_string(),
        structured_data: None,
        turn_count,
        min_turns: 2,
        max_turns: 10,
    }
}

fn synthesis(payload: Map<String, Value>, turn_count: u32) -> ConversationResponse {
    ConversationResponse {
        conversation_id: "c1".to_string(),
        kind: ResponseKind::Synthesis,
        message: "Here is what I heard.".to_string(),
        structured_data: Some(payload),
        turn_count,
        min_turns: 2,
        max_turns: 10,
    }
}

fn phase_payload(phase: PhaseId) -> Map<String, Value> {
    let mut payload = Map::new();
    for domain in phase.domains() {
        payload.insert(
            domain.as_str().to_string(),
            json!({ "summary": format!("{domain} as told to the oracle") }),
        );
    }
    payload
}

fn setup(dir: &TempDir) -> Manual {
    Manual::create(dir.path(), "fam1", ManualKind::Household, "Our Family").unwrap()
}

/// Run one full phase conversation through approval.
async fn run_phase(dir: &TempDir, manual_id: &str, phase: PhaseId) -> PhaseOutcome {
    let oracle = ScriptedOracle::new(vec![
        Ok(question("hello", 1)),
        Ok(synthesis(phase_payload(phase), 2)),
    ]);
    let mut engine = PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        manual_id,
        phase,
        &oracle,
    )
    .await
    .unwrap();
    engine.send_turn(&oracle, "our answer").await.unwrap();
    engine.approve().unwrap()
}

// ---------------------------------------------------------------------------
// Phase engine — conversation and review
// ---------------------------------------------------------------------------

#[tokio::test]
async fn engine_flips_to_review_on_synthesis() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let oracle = ScriptedOracle::new(vec![
        Ok(question("what matters most?", 1)),
        Ok(question("how do you repair?", 2)),
        Ok(synthesis(phase_payload(PhaseId::Foundation), 3)),
    ]);
    let mut engine = PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        &manual.manual_id,
        PhaseId::Foundation,
        &oracle,
    )
    .await
    .unwrap();
    assert_eq!(engine.state(), EngineState::Conversation);
    assert!(engine.review().is_none());

    engine.send_turn(&oracle, "honesty").await.unwrap();
    assert_eq!(engine.state(), EngineState::Conversation);

    engine.send_turn(&oracle, "we talk it out").await.unwrap();
    assert_eq!(engine.state(), EngineState::Review);
    let review = engine.review().unwrap();
    assert!(review.display().contains_key("values"));
    assert_eq!(review.summary(), "Here is what I heard.");
}

#[tokio::test]
async fn approve_before_synthesis_is_rejected() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let oracle = ScriptedOracle::new(vec![Ok(question("q", 1))]);
    let mut engine = PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        &manual.manual_id,
        PhaseId::Foundation,
        &oracle,
    )
    .await
    .unwrap();

    assert!(matches!(engine.approve(), Err(EngineError::NotInReview)));
}

#[tokio::test]
async fn second_phase_is_seeded_with_earlier_domains() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);
    run_phase(&dir, &manual.manual_id, PhaseId::Foundation).await;

    let oracle = ScriptedOracle::new(vec![Ok(question("hi again", 1))]);
    PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        &manual.manual_id,
        PhaseId::Relationships,
        &oracle,
    )
    .await
    .unwrap();

    let requests = oracle.requests();
    match &requests[0].mode {
        ConversationMode::Onboarding {
            phase_id,
            previous_domains,
        } => {
            assert_eq!(*phase_id, PhaseId::Relationships);
            assert!(previous_domains.contains_key("values"));
            assert!(previous_domains.contains_key("communication"));
            assert!(!previous_domains.contains_key("connection"));
        }
        other => panic!("expected onboarding mode, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Phase engine — approval and progression
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_phase_auto_advances() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let outcome = run_phase(&dir, &manual.manual_id, PhaseId::Foundation).await;
    assert_eq!(
        outcome,
        PhaseOutcome::AutoAdvance {
            next: PhaseId::Relationships
        }
    );

    let reloaded = Manual::load(dir.path(), &manual.manual_id).unwrap();
    assert_eq!(
        reloaded.domains[&DomainId::Values]["summary"],
        "values as told to the oracle"
    );
    assert_eq!(
        reloaded.domain_meta[&DomainId::Values].updated_by,
        UpdateSource::Onboarding
    );

    let status = OnboardingStatus::load(dir.path(), "u1").unwrap();
    assert_eq!(status.phases_completed, vec![PhaseId::Foundation]);
    assert_eq!(status.current_phase, Some(PhaseId::Relationships));
    assert_eq!(status.manual_id.as_deref(), Some(manual.manual_id.as_str()));
}

#[tokio::test]
async fn threshold_reached_offers_choice() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    run_phase(&dir, &manual.manual_id, PhaseId::Foundation).await;
    let outcome = run_phase(&dir, &manual.manual_id, PhaseId::Relationships).await;

    assert_eq!(
        outcome,
        PhaseOutcome::ChooseNext {
            next: PhaseId::Operations,
            remaining: vec![PhaseId::Operations, PhaseId::Strategy],
        }
    );

    let status = OnboardingStatus::load(dir.path(), "u1").unwrap();
    assert!(status.is_onboarding_complete(2));
}

#[tokio::test]
async fn all_phases_complete_launches() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    for &phase in &[PhaseId::Foundation, PhaseId::Relationships, PhaseId::Operations] {
        run_phase(&dir, &manual.manual_id, phase).await;
    }
    let outcome = run_phase(&dir, &manual.manual_id, PhaseId::Strategy).await;
    assert_eq!(outcome, PhaseOutcome::Launch);

    let status = OnboardingStatus::load(dir.path(), "u1").unwrap();
    assert_eq!(status.current_phase, None);
    assert_eq!(status.phases_completed.len(), PhaseId::all().len());
}

#[tokio::test]
async fn approving_edited_draft_persists_the_edit() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let oracle = ScriptedOracle::new(vec![
        Ok(question("q", 1)),
        Ok(synthesis(phase_payload(PhaseId::Foundation), 2)),
    ]);
    let mut engine = PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        &manual.manual_id,
        PhaseId::Foundation,
        &oracle,
    )
    .await
    .unwrap();
    engine.send_turn(&oracle, "answer").await.unwrap();

    engine.request_edit().unwrap();
    engine
        .set_domain(DomainId::Values, json!({ "summary": "corrected by hand" }))
        .unwrap();
    engine.approve().unwrap();

    let reloaded = Manual::load(dir.path(), &manual.manual_id).unwrap();
    assert_eq!(reloaded.domains[&DomainId::Values]["summary"], "corrected by hand");
    // the unedited domain still came through from the draft
    assert_eq!(
        reloaded.domains[&DomainId::Communication]["summary"],
        "communication as told to the oracle"
    );
}

#[tokio::test]
async fn cancelled_edit_approves_the_original() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let oracle = ScriptedOracle::new(vec![
        Ok(question("q", 1)),
        Ok(synthesis(phase_payload(PhaseId::Foundation), 2)),
    ]);
    let mut engine = PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        &manual.manual_id,
        PhaseId::Foundation,
        &oracle,
    )
    .await
    .unwrap();
    engine.send_turn(&oracle, "answer").await.unwrap();

    engine.request_edit().unwrap();
    engine
        .set_domain(DomainId::Values, json!({ "summary": "a mistake" }))
        .unwrap();
    engine.cancel_edit().unwrap();
    engine.approve().unwrap();

    let reloaded = Manual::load(dir.path(), &manual.manual_id).unwrap();
    assert_eq!(
        reloaded.domains[&DomainId::Values]["summary"],
        "values as told to the oracle"
    );
}

#[tokio::test]
async fn persistence_failure_keeps_review_intact() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let oracle = ScriptedOracle::new(vec![
        Ok(question("q", 1)),
        Ok(synthesis(phase_payload(PhaseId::Foundation), 2)),
    ]);
    let mut engine = PhaseEngine::start(
        dir.path(),
        Config::default(),
        "u1",
        &manual.manual_id,
        PhaseId::Foundation,
        &oracle,
    )
    .await
    .unwrap();
    engine.send_turn(&oracle, "answer").await.unwrap();

    // the manual vanishes out from under the engine
    let manual_dir = dir.path().join(".hearth/manuals").join(&manual.manual_id);
    std::fs::remove_dir_all(&manual_dir).unwrap();

    assert!(engine.approve().is_err());
    assert_eq!(engine.state(), EngineState::Review);
    assert!(engine.review().unwrap().display().contains_key("values"));

    // once the manual is back, re-approval completes normally
    manual.save(dir.path()).unwrap();
    let outcome = engine.approve().unwrap();
    assert_eq!(
        outcome,
        PhaseOutcome::AutoAdvance {
            next: PhaseId::Relationships
        }
    );
    let status = OnboardingStatus::load(dir.path(), "u1").unwrap();
    assert_eq!(status.phases_completed, vec![PhaseId::Foundation]);
}

// ---------------------------------------------------------------------------
// Refresh engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_is_seeded_with_current_value() {
    let dir = TempDir::new().unwrap();
    let mut manual = setup(&dir);
    manual.update_domain(
        DomainId::Organization,
        json!({ "summary": "sunday reset" }),
        UpdateSource::Onboarding,
    );
    manual.save(dir.path()).unwrap();

    let oracle = ScriptedOracle::new(vec![Ok(question("what changed?", 1))]);
    RefreshEngine::start(dir.path(), &manual.manual_id, DomainId::Organization, &oracle)
        .await
        .unwrap();

    let requests = oracle.requests();
    match &requests[0].mode {
        ConversationMode::Refresh {
            domain_id,
            current_domain_data,
        } => {
            assert_eq!(*domain_id, DomainId::Organization);
            assert_eq!(current_domain_data["summary"], "sunday reset");
        }
        other => panic!("expected refresh mode, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_writes_only_the_target_domain() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);
    let before_values = Manual::load(dir.path(), &manual.manual_id).unwrap().domains
        [&DomainId::Values]
        .clone();

    // the oracle emits a stray extra key alongside the target domain
    let mut payload = Map::new();
    payload.insert("organization".to_string(), json!({ "summary": "new routines" }));
    payload.insert("values".to_string(), json!({ "summary": "should be ignored" }));

    let oracle = ScriptedOracle::new(vec![Ok(question("q", 1)), Ok(synthesis(payload, 2))]);
    let mut engine =
        RefreshEngine::start(dir.path(), &manual.manual_id, DomainId::Organization, &oracle)
            .await
            .unwrap();
    engine.send_turn(&oracle, "we moved house").await.unwrap();
    engine.approve().unwrap();
    assert_eq!(engine.state(), EngineState::Finished);

    let reloaded = Manual::load(dir.path(), &manual.manual_id).unwrap();
    assert_eq!(reloaded.domains[&DomainId::Organization]["summary"], "new routines");
    assert_eq!(reloaded.domains[&DomainId::Values], before_values);
    assert_eq!(
        reloaded.domain_meta[&DomainId::Organization].updated_by,
        UpdateSource::Refresh
    );
    assert!(!reloaded.domain_meta.contains_key(&DomainId::Values));
}

#[tokio::test]
async fn refresh_touches_no_phase_bookkeeping() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);
    run_phase(&dir, &manual.manual_id, PhaseId::Foundation).await;

    let mut payload = Map::new();
    payload.insert("values".to_string(), json!({ "summary": "revisited" }));
    let oracle = ScriptedOracle::new(vec![Ok(question("q", 1)), Ok(synthesis(payload, 2))]);
    let mut engine =
        RefreshEngine::start(dir.path(), &manual.manual_id, DomainId::Values, &oracle)
            .await
            .unwrap();
    engine.send_turn(&oracle, "an update").await.unwrap();
    engine.approve().unwrap();

    let status = OnboardingStatus::load(dir.path(), "u1").unwrap();
    assert_eq!(status.phases_completed, vec![PhaseId::Foundation]);
    assert_eq!(status.current_phase, Some(PhaseId::Relationships));
}

#[tokio::test]
async fn refresh_persistence_failure_keeps_attempted_edit() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let mut payload = Map::new();
    payload.insert("values".to_string(), json!({ "summary": "fresh take" }));
    let oracle = ScriptedOracle::new(vec![Ok(question("q", 1)), Ok(synthesis(payload, 2))]);
    let mut engine =
        RefreshEngine::start(dir.path(), &manual.manual_id, DomainId::Values, &oracle)
            .await
            .unwrap();
    engine.send_turn(&oracle, "answer").await.unwrap();
    engine.request_edit().unwrap();
    engine.set_domain(json!({ "summary": "hand-polished" })).unwrap();

    let manual_dir = dir.path().join(".hearth/manuals").join(&manual.manual_id);
    std::fs::remove_dir_all(&manual_dir).unwrap();

    assert!(engine.approve().is_err());
    assert_eq!(engine.state(), EngineState::Review);
    assert_eq!(
        engine.review().unwrap().display()["values"]["summary"],
        "hand-polished"
    );

    manual.save(dir.path()).unwrap();
    engine.approve().unwrap();
    let reloaded = Manual::load(dir.path(), &manual.manual_id).unwrap();
    assert_eq!(reloaded.domains[&DomainId::Values]["summary"], "hand-polished");
}

#[tokio::test]
async fn oracle_failure_mid_refresh_allows_retry() {
    let dir = TempDir::new().unwrap();
    let manual = setup(&dir);

    let mut payload = Map::new();
    payload.insert("values".to_string(), json!({ "summary": "done" }));
    let oracle = ScriptedOracle::new(vec![
        Ok(question("q", 1)),
        Err(OracleError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }),
        Ok(synthesis(payload, 2)),
    ]);
    let mut engine =
        RefreshEngine::start(dir.path(), &manual.manual_id, DomainId::Values, &oracle)
            .await
            .unwrap();

    assert!(engine.send_turn(&oracle, "answer").await.is_err());
    assert_eq!(engine.state(), EngineState::Conversation);
    assert!(engine.session().error().is_some());

    engine.send_turn(&oracle, "answer").await.unwrap();
    assert_eq!(engine.state(), EngineState::Review);
}
