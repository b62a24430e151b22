use super::*;
use crate::llm::{GenerationError, GenerationRequest};
use crate::pipeline::stages::{final_report, functional, intake, morphological, risks};
use crate::retrieval::{RetrievalQuery, RetrievedChunk};
use crate::store::MemoryWorkflowStore;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

// =============================================================================
// Fixtures
// =============================================================================

fn mug_outputs() -> HashMap<Stage, Value> {
    HashMap::from([
        (
            Stage::Intake,
            json!({
                "cleanedIdea": "A travel mug that stirs itself and holds a set temperature",
                "objectives": ["Keep drinks at the chosen temperature", "Mix drinks without a spoon"],
                "constraints": ["Dishwasher safe", "Retail under $60"],
                "assumptions": ["Users commute with hot drinks"]
            }),
        ),
        (
            Stage::Functional,
            json!({
                "overallFunction": "Condition Beverage",
                "subFunctions": [
                    {"id": "store_liquid", "function": "Store Liquid", "description": "Hold the drink"},
                    {"id": "heat_liquid", "function": "Heat Liquid", "description": "Raise drink temperature"},
                    {"id": "agitate_liquid", "function": "Agitate Liquid", "description": "Mix the drink"}
                ]
            }),
        ),
        (
            Stage::Morphological,
            json!({
                "functionAlternatives": [
                    {"functionId": "store_liquid", "function": "Store Liquid", "alternatives": [
                        {"option": "Double-wall steel", "pros": ["Durable"], "cons": ["Heavy"]},
                        {"option": "Ceramic liner", "pros": ["Taste neutral"], "cons": ["Fragile"]},
                        {"option": "Glass insert", "pros": ["Clean"], "cons": ["Breakable"]}
                    ]},
                    {"functionId": "heat_liquid", "function": "Heat Liquid", "alternatives": [
                        {"option": "Resistive coil", "pros": ["Cheap"], "cons": ["Slow"]},
                        {"option": "Induction base", "pros": ["Fast"], "cons": ["Costly"]},
                        {"option": "Phase-change wax", "pros": ["Passive"], "cons": ["Limited"]}
                    ]},
                    {"functionId": "agitate_liquid", "function": "Agitate Liquid", "alternatives": [
                        {"option": "Magnetic stirrer", "pros": ["Sealed"], "cons": ["Needs power"]},
                        {"option": "Propeller", "pros": ["Strong"], "cons": ["Hard to clean"]},
                        {"option": "Shaker ball", "pros": ["No power"], "cons": ["Noisy"]}
                    ]}
                ]
            }),
        ),
        (
            Stage::Risks,
            json!({
                "risks": [
                    {"category": "Safety", "risk": "Scalding from overheated drink", "mitigation": "Thermal cutoff"},
                    {"category": "Technical", "risk": "Battery degrades in dishwasher", "mitigation": "Removable base"},
                    {"category": "Market", "risk": "Price above impulse range", "mitigation": "Two-tier lineup"},
                    {"category": "Compliance", "risk": "Food contact certification", "mitigation": "Certified liners"},
                    {"category": "Technical", "risk": "Seal leaks around stirrer", "mitigation": "Magnetic coupling"}
                ],
                "tradeoffs": [
                    {"decision": "Heating", "optionA": "Induction", "optionB": "Coil", "notes": "Speed vs cost"},
                    {"decision": "Body", "optionA": "Steel", "optionB": "Ceramic", "notes": "Durability vs taste"},
                    {"decision": "Power", "optionA": "Battery", "optionB": "Dock", "notes": "Portability vs weight"}
                ]
            }),
        ),
        (
            Stage::Final,
            json!({
                "summary": "A heated self-stirring travel mug is feasible with a removable power base.",
                "recommendedNextSteps": [
                    "Build a cardboard and tape form prototype",
                    "Bench test magnetic stirring in a steel body",
                    "Survey 10 commuters about price",
                    "Price out induction components",
                    "Review food-contact regulations"
                ]
            }),
        ),
    ])
}

fn stage_of(request: &GenerationRequest) -> Stage {
    match request.system.as_deref() {
        Some(intake::SYSTEM_PROMPT) => Stage::Intake,
        Some(functional::SYSTEM_PROMPT) => Stage::Functional,
        Some(morphological::SYSTEM_PROMPT) => Stage::Morphological,
        Some(risks::SYSTEM_PROMPT) => Stage::Risks,
        Some(final_report::SYSTEM_PROMPT) => Stage::Final,
        other => panic!("unexpected system prompt {:?}", other),
    }
}

/// Answers each stage with a canned payload, keyed by system prompt
#[derive(Default)]
struct ScriptedGenerator {
    overrides: HashMap<Stage, String>,
    fail_on: Option<Stage>,
    /// Held closed until notified before intake answers
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<(Stage, GenerationRequest)>>,
}

impl ScriptedGenerator {
    fn failing_on(stage: Stage) -> Self {
        Self {
            fail_on: Some(stage),
            ..Default::default()
        }
    }

    fn replying(stage: Stage, raw: &str) -> Self {
        Self {
            overrides: HashMap::from([(stage, raw.to_string())]),
            ..Default::default()
        }
    }

    fn user_prompt(&self, stage: Stage) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, r)| r.user.clone())
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let stage = stage_of(request);
        self.requests
            .lock()
            .unwrap()
            .push((stage, request.clone()));

        if stage == Stage::Intake {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }

        if self.fail_on == Some(stage) {
            return Err(GenerationError::api(503, "model overloaded"));
        }

        if let Some(raw) = self.overrides.get(&stage) {
            return Ok(raw.clone());
        }
        Ok(mug_outputs()[&stage].to_string())
    }
}

/// Returns one chunk per query, named after the first requested tag
#[derive(Default)]
struct TaggedRetriever {
    empty: bool,
    queries: Mutex<Vec<RetrievalQuery>>,
}

#[async_trait]
impl Retriever for TaggedRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> Vec<RetrievedChunk> {
        self.queries.lock().unwrap().push(query.clone());
        if self.empty {
            return Vec::new();
        }

        let tag = query.tags.first().cloned().unwrap_or_default();
        vec![RetrievedChunk {
            id: format!("{}-chunk", tag),
            text: format!("Notes about {}", tag),
            score: 0.8,
            document_title: None,
            metadata: json!({}),
        }]
    }
}

fn orchestrator(
    generator: ScriptedGenerator,
    retriever: TaggedRetriever,
) -> (
    PipelineOrchestrator,
    Arc<ScriptedGenerator>,
    Arc<TaggedRetriever>,
) {
    let generator = Arc::new(generator);
    let retriever = Arc::new(retriever);
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(MemoryWorkflowStore::new()),
        generator.clone(),
        retriever.clone(),
    );
    (orchestrator, generator, retriever)
}

async fn run_to_end(orchestrator: &PipelineOrchestrator) -> RunDetail {
    let project_id = Uuid::new_v4();
    let run = orchestrator.store().create_run(project_id).await.unwrap();
    let state = PipelineState::new(project_id, "mug that stirs itself and stays hot", None);

    orchestrator.execute(run.clone(), state).await.unwrap();
    orchestrator.get_run(run.id).await.unwrap()
}

async fn wait_for_terminal(orchestrator: &PipelineOrchestrator, run_id: Uuid) -> RunDetail {
    for _ in 0..500 {
        let detail = orchestrator.get_run(run_id).await.unwrap();
        if detail.run.status.is_terminal() {
            return detail;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run {} never finished", run_id);
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_start_returns_before_any_stage_runs() {
    let gate = Arc::new(Notify::new());
    let (orchestrator, _, _) = orchestrator(
        ScriptedGenerator {
            gate: Some(gate.clone()),
            ..Default::default()
        },
        TaggedRetriever::default(),
    );

    let run = orchestrator
        .start_workflow(Uuid::new_v4(), "mug", None)
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.version, 1);

    let pending = orchestrator.get_run(run.id).await.unwrap();
    assert_eq!(pending.run.status, RunStatus::Running);
    assert!(pending.outputs.is_empty());

    gate.notify_one();
    let done = wait_for_terminal(&orchestrator, run.id).await;
    assert_eq!(done.run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_successful_run_saves_every_stage_in_order() {
    let (orchestrator, _, _) = orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());

    let detail = run_to_end(&orchestrator).await;

    assert_eq!(detail.run.status, RunStatus::Completed);
    assert_eq!(detail.run.error_message, None);
    assert!(detail.run.finished_at.is_some());
    assert_eq!(detail.stages(), Stage::ALL.to_vec());

    let fixtures = mug_outputs();
    for output in &detail.outputs {
        assert_eq!(output.json_output, fixtures[&output.stage]);
        assert_eq!(output.user_edits, None);
    }
}

#[tokio::test]
async fn test_citations_follow_retrieved_chunks() {
    let (orchestrator, _, retriever) =
        orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());

    let detail = run_to_end(&orchestrator).await;

    let citations: Vec<&[String]> = detail.outputs.iter().map(|o| o.citations.as_slice()).collect();
    assert_eq!(
        citations,
        vec![
            &["framework-chunk".to_string()][..],
            &["functional_decomposition-chunk".to_string()][..],
            &["morphological_chart-chunk".to_string()][..],
            &["risk_tradeoffs-chunk".to_string()][..],
            &["example-chunk".to_string()][..],
        ]
    );

    let top_ks: Vec<Option<usize>> = retriever
        .queries
        .lock()
        .unwrap()
        .iter()
        .map(|q| q.top_k)
        .collect();
    assert_eq!(top_ks, vec![Some(4), Some(4), Some(3), Some(4), Some(2)]);
}

#[tokio::test]
async fn test_empty_decomposition_fails_morphological_stage() {
    let (orchestrator, generator, _) = orchestrator(
        ScriptedGenerator::replying(
            Stage::Functional,
            r#"{"overallFunction": "Condition Beverage", "subFunctions": []}"#,
        ),
        TaggedRetriever::default(),
    );

    let detail = run_to_end(&orchestrator).await;

    assert_eq!(detail.run.status, RunStatus::Failed);
    assert_eq!(detail.stages(), vec![Stage::Intake, Stage::Functional]);
    let message = detail.run.error_message.unwrap();
    assert!(message.starts_with("Morphological Chart stage failed"));
    assert!(message.contains("No sub-functions available for morphological analysis."));
    // the model is never asked for a chart
    assert!(generator.user_prompt(Stage::Morphological).is_none());
}

#[tokio::test]
async fn test_failure_at_each_stage_keeps_earlier_outputs() {
    for (position, failing) in Stage::ALL.into_iter().enumerate() {
        let (orchestrator, _, _) =
            orchestrator(ScriptedGenerator::failing_on(failing), TaggedRetriever::default());

        let detail = run_to_end(&orchestrator).await;

        assert_eq!(detail.run.status, RunStatus::Failed);
        assert_eq!(detail.outputs.len(), position);
        assert_eq!(detail.stages(), Stage::ALL[..position].to_vec());

        let message = detail.run.error_message.unwrap();
        assert!(message.starts_with(failing.label()), "{}", message);
        assert!(message.contains("model overloaded"));
    }
}

#[tokio::test]
async fn test_malformed_output_fails_run() {
    let (orchestrator, _, _) = orchestrator(
        ScriptedGenerator::replying(Stage::Risks, r#"{"risks": "many"}"#),
        TaggedRetriever::default(),
    );

    let detail = run_to_end(&orchestrator).await;

    assert_eq!(detail.run.status, RunStatus::Failed);
    assert_eq!(detail.outputs.len(), 3);
    assert!(
        detail
            .run
            .error_message
            .unwrap()
            .starts_with("Risks & Trade-offs stage failed")
    );
}

#[tokio::test]
async fn test_fenced_output_is_accepted() {
    let fenced = format!("```json\n{}\n```", mug_outputs()[&Stage::Final]);
    let (orchestrator, _, _) = orchestrator(
        ScriptedGenerator::replying(Stage::Final, &fenced),
        TaggedRetriever::default(),
    );

    let detail = run_to_end(&orchestrator).await;
    assert_eq!(detail.run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_run_proceeds_without_retrieval_context() {
    let (orchestrator, generator, _) = orchestrator(
        ScriptedGenerator::default(),
        TaggedRetriever {
            empty: true,
            ..Default::default()
        },
    );

    let detail = run_to_end(&orchestrator).await;

    assert_eq!(detail.run.status, RunStatus::Completed);
    assert!(detail.outputs.iter().all(|o| o.citations.is_empty()));
    let intake_prompt = generator.user_prompt(Stage::Intake).unwrap();
    assert!(intake_prompt.contains("No knowledge base context available."));
}

#[tokio::test]
async fn test_later_stages_see_earlier_outputs() {
    let (orchestrator, generator, _) =
        orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());

    run_to_end(&orchestrator).await;

    let functional_prompt = generator.user_prompt(Stage::Functional).unwrap();
    assert!(functional_prompt.contains("A travel mug that stirs itself"));
    assert!(functional_prompt.contains("Mix drinks without a spoon"));

    let morphological_prompt = generator.user_prompt(Stage::Morphological).unwrap();
    assert!(morphological_prompt.contains("ID: agitate_liquid"));

    let risks_prompt = generator.user_prompt(Stage::Risks).unwrap();
    assert!(risks_prompt.contains("Magnetic stirrer"));

    let final_prompt = generator.user_prompt(Stage::Final).unwrap();
    assert!(final_prompt.contains("Scalding from overheated drink"));
}

#[tokio::test]
async fn test_save_output_upserts() {
    let (orchestrator, _, _) = orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());
    let run = orchestrator
        .store()
        .create_run(Uuid::new_v4())
        .await
        .unwrap();

    let report = |summary: &str| {
        StageUpdate::new(
            ideaforge_core::contract::FinalReport {
                summary: summary.to_string(),
                recommended_next_steps: vec![],
            },
            vec![],
        )
    };

    let first = orchestrator
        .save_output(run.id, Stage::Final, &report("first"))
        .await
        .unwrap();
    let second = orchestrator
        .save_output(run.id, Stage::Final, &report("second"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let detail = orchestrator.get_run(run.id).await.unwrap();
    assert_eq!(detail.outputs.len(), 1);
    assert_eq!(detail.outputs[0].json_output["summary"], "second");
}

#[tokio::test]
async fn test_save_output_rejects_mismatched_stage() {
    let (orchestrator, _, _) = orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());
    let run = orchestrator
        .store()
        .create_run(Uuid::new_v4())
        .await
        .unwrap();

    let update = StageUpdate::new(
        ideaforge_core::contract::FinalReport {
            summary: "s".to_string(),
            recommended_next_steps: vec![],
        },
        vec![],
    );

    let err = orchestrator
        .save_output(run.id, Stage::Intake, &update)
        .await
        .unwrap_err();
    assert!(matches!(err, StageError::Precondition(_)));
}

#[tokio::test]
async fn test_get_run_unknown() {
    let (orchestrator, _, _) = orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());
    let err = orchestrator.get_run(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StoreError::RunNotFound(_)));
}

#[tokio::test]
async fn test_reruns_are_versioned() {
    let (orchestrator, _, _) = orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());
    let project_id = Uuid::new_v4();

    let first = orchestrator
        .start_workflow(project_id, "mug", None)
        .await
        .unwrap();
    let second = orchestrator
        .start_workflow(project_id, "mug", None)
        .await
        .unwrap();

    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_ne!(first.id, second.id);

    let first = wait_for_terminal(&orchestrator, first.id).await;
    let second = wait_for_terminal(&orchestrator, second.id).await;
    assert_eq!(first.outputs.len(), 5);
    assert_eq!(second.outputs.len(), 5);
}

#[tokio::test]
async fn test_mug_idea_end_to_end() {
    const IDEA: &str = "A self-stirring mug that keeps coffee at a set temperature";
    let (orchestrator, generator, _) =
        orchestrator(ScriptedGenerator::default(), TaggedRetriever::default());

    let run = orchestrator
        .start_workflow(Uuid::new_v4(), IDEA, None)
        .await
        .unwrap();
    let detail = wait_for_terminal(&orchestrator, run.id).await;

    assert_eq!(detail.run.status, RunStatus::Completed);
    assert_eq!(detail.stages(), Stage::ALL.to_vec());
    assert!(generator.user_prompt(Stage::Intake).unwrap().contains(IDEA));

    let state = PipelineState::from_outputs(run.project_id, IDEA, None, &detail.outputs).unwrap();

    assert_eq!(state.completed_stages(), Stage::ALL.to_vec());
    let functional = state.functional.as_ref().unwrap();
    assert!(!functional.sub_functions.is_empty());
    let chart = state.morphological.as_ref().unwrap();
    for id in functional.sub_function_ids() {
        let row = chart.row(id).unwrap();
        assert!((3..=5).contains(&row.alternatives.len()));
    }
    assert!(state.risks.as_ref().unwrap().risks.len() >= 5);
    assert_eq!(
        state
            .final_report
            .as_ref()
            .unwrap()
            .recommended_next_steps
            .len(),
        5
    );
}
