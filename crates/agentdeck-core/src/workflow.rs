// Workflow domain types
//
// Workflows are stored definitions: ordered steps that may reference agents.
// Nothing in the system runs them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::trigger::Trigger;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Inactive,
    Error,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "DRAFT",
            WorkflowStatus::Active => "ACTIVE",
            WorkflowStatus::Inactive => "INACTIVE",
            WorkflowStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub name: String,
    /// Free-form step kind chosen by the editor
    #[serde(rename = "type")]
    pub step_type: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub config: Value,
    pub position: i32,
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkflowStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub config: Value,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    pub is_public: bool,
    /// Ordered by position
    pub steps: Vec<WorkflowStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn is_visible_to(&self, requester: Option<Uuid>) -> bool {
        self.is_public || requester.is_some_and(|id| self.is_owned_by(id))
    }
}

#[derive(Debug, Clone)]
pub struct NewWorkflowStep {
    pub name: String,
    pub step_type: String,
    pub config: Value,
    pub position: i32,
    pub agent_id: Option<Uuid>,
}

impl NewWorkflowStep {
    pub fn into_step(self, workflow_id: Uuid) -> WorkflowStep {
        WorkflowStep {
            id: Uuid::now_v7(),
            workflow_id,
            name: self.name,
            step_type: self.step_type,
            config: self.config,
            position: self.position,
            agent_id: self.agent_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewWorkflow {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: WorkflowStatus,
    pub config: Value,
    pub triggers: Vec<Trigger>,
    pub is_public: bool,
    pub steps: Vec<NewWorkflowStep>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub config: Option<Value>,
    pub triggers: Option<Vec<Trigger>>,
    pub is_public: Option<bool>,
    /// Replaces every step when present
    pub steps: Option<Vec<NewWorkflowStep>>,
}

impl WorkflowPatch {
    pub fn apply(self, workflow: &mut Workflow) {
        if let Some(name) = self.name {
            workflow.name = name;
        }
        if let Some(description) = self.description {
            workflow.description = Some(description);
        }
        if let Some(status) = self.status {
            workflow.status = status;
        }
        if let Some(config) = self.config {
            workflow.config = config;
        }
        if let Some(triggers) = self.triggers {
            workflow.triggers = triggers;
        }
        if let Some(is_public) = self.is_public {
            workflow.is_public = is_public;
        }
        if let Some(steps) = self.steps {
            let id = workflow.id;
            let mut steps: Vec<WorkflowStep> =
                steps.into_iter().map(|s| s.into_step(id)).collect();
            steps.sort_by_key(|s| s.position);
            workflow.steps = steps;
        }
    }
}
