// Integration tests against a real Postgres
// Run with: DATABASE_URL=postgres://... cargo test -p agentdeck-storage -- --ignored

use agentdeck_core::{
    AgentPatch, AgentStatus, AgentStore, AnalyticsStore, ExecutionFilter, ExecutionMetrics,
    ExecutionOutcome, ExecutionStatus, ExecutionStore, NewAgent, NewExecution, NewExecutionLog,
    NewUser, NewWorkflow, NewWorkflowStep, StoreError, UserStore, WorkflowStatus, WorkflowStore,
};
use agentdeck_storage::Database;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

async fn database() -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::from_url(&url, 5).await.unwrap();
    db.migrate().await.unwrap();
    db
}

async fn user(db: &Database) -> Uuid {
    db.create_user(NewUser {
        email: format!("{}@example.com", Uuid::now_v7()),
        name: "Test".to_string(),
        avatar: None,
        role: Default::default(),
        password_hash: None,
    })
    .await
    .unwrap()
    .id
}

fn new_agent(user_id: Uuid, name: &str) -> NewAgent {
    NewAgent {
        user_id,
        name: name.to_string(),
        description: None,
        agent_type: Default::default(),
        model: "gpt-4o-mini-2024-07-18".to_string(),
        temperature: 0.7,
        max_tokens: 1000,
        system_prompt: None,
        tools: vec!["github".to_string()],
        triggers: vec![],
        is_public: false,
    }
}

#[tokio::test]
#[ignore]
async fn test_agent_lifecycle() {
    let db = database().await;
    let owner = user(&db).await;

    let agent = db.create_agent(new_agent(owner, "Helper")).await.unwrap();
    assert_eq!(agent.status, AgentStatus::Inactive);
    assert_eq!(agent.tools, vec!["github".to_string()]);

    let err = db
        .create_agent(new_agent(owner, "Helper"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let updated = db
        .update_agent(
            agent.id,
            AgentPatch {
                status: Some(AgentStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, AgentStatus::Active);
    assert_eq!(updated.name, "Helper");

    let listed = db.list_agents(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].execution_count, 0);
}

#[tokio::test]
#[ignore]
async fn test_unknown_owner_is_invalid_reference() {
    let db = database().await;
    let err = db
        .create_agent(new_agent(Uuid::now_v7(), "Orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference(_)));
}

#[tokio::test]
#[ignore]
async fn test_execution_terminal_update_is_guarded() {
    let db = database().await;
    let owner = user(&db).await;
    let agent = db.create_agent(new_agent(owner, "Runner")).await.unwrap();

    let started_at = Utc::now();
    let execution = db
        .create_execution(NewExecution {
            user_id: owner,
            agent_id: agent.id,
            input: json!({"message": "hi"}),
            started_at,
        })
        .await
        .unwrap();

    let finished = db
        .finish_execution(
            execution.id,
            ExecutionOutcome::Failed {
                error: "upstream 503".to_string(),
            },
            started_at + Duration::milliseconds(250),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, ExecutionStatus::Failed);
    assert_eq!(finished.duration, Some(250));

    let again = db
        .finish_execution(
            execution.id,
            ExecutionOutcome::Succeeded {
                output: json!({"message": "late"}),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(again.is_none());

    db.append_log(NewExecutionLog::info(execution.id, "one", json!({})))
        .await
        .unwrap();
    db.append_log(NewExecutionLog::error(execution.id, "two", json!({})))
        .await
        .unwrap();
    let messages: Vec<_> = db
        .list_logs(execution.id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.message)
        .collect();
    assert_eq!(messages, vec!["one", "two"]);

    let history = db
        .list_executions(ExecutionFilter {
            status: Some(ExecutionStatus::Failed),
            ..ExecutionFilter::for_user(owner)
        })
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_agent_cascades() {
    let db = database().await;
    let owner = user(&db).await;
    let agent = db.create_agent(new_agent(owner, "Doomed")).await.unwrap();
    let execution = db
        .create_execution(NewExecution {
            user_id: owner,
            agent_id: agent.id,
            input: json!({"message": "hi"}),
            started_at: Utc::now(),
        })
        .await
        .unwrap();
    db.record_analytics(
        ExecutionMetrics {
            agent_id: agent.id,
            user_id: owner,
            total_tokens: 12,
            ..Default::default()
        }
        .into(),
    )
    .await
    .unwrap();
    let workflow = db
        .create_workflow(NewWorkflow {
            user_id: owner,
            name: "Flow".to_string(),
            description: None,
            status: WorkflowStatus::Draft,
            config: json!({}),
            triggers: vec![],
            is_public: false,
            steps: vec![NewWorkflowStep {
                name: "ask".to_string(),
                step_type: "agent".to_string(),
                config: json!({}),
                position: 0,
                agent_id: Some(agent.id),
            }],
        })
        .await
        .unwrap();

    assert!(db.delete_agent(agent.id).await.unwrap());
    assert!(db.get_execution(execution.id).await.unwrap().is_none());
    assert_eq!(db.total_tokens(owner).await.unwrap(), 12);

    let workflow = db.get_workflow(workflow.id).await.unwrap().unwrap();
    assert_eq!(workflow.steps.len(), 1);
    assert_eq!(workflow.steps[0].agent_id, None);
}
