// Workflow service
//
// Workflows are stored definitions only. Step agent references are checked
// against the requester's visible agents when steps are written.

use agentdeck_core::{NewWorkflow, NewWorkflowStep, Store, StoreError, Workflow, WorkflowPatch};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::validation::{trimmed, Validator, MAX_DESCRIPTION_BYTES, MIN_WORKFLOW_NAME_CHARS};
use crate::api::workflows::{CreateWorkflowRequest, UpdateWorkflowRequest, WorkflowStepInput};
use crate::api::{ApiError, ApiResult};

pub struct WorkflowService {
    store: Arc<dyn Store>,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid) -> ApiResult<Vec<Workflow>> {
        Ok(self.store.list_workflows(user_id).await?)
    }

    pub async fn create(&self, user_id: Uuid, req: CreateWorkflowRequest) -> ApiResult<Workflow> {
        let mut validator = Validator::new();
        validator
            .required_name("name", req.name.as_deref(), MIN_WORKFLOW_NAME_CHARS)
            .max_bytes("description", req.description.as_deref(), MAX_DESCRIPTION_BYTES)
            .triggers(req.triggers.as_deref());
        let steps = self
            .steps(&mut validator, user_id, req.steps.unwrap_or_default())
            .await?;
        validator.finish()?;

        let name = trimmed(req.name).unwrap_or_default();
        let workflow = self
            .store
            .create_workflow(NewWorkflow {
                user_id,
                name: name.clone(),
                description: trimmed(req.description),
                status: req.status.unwrap_or_default(),
                config: req.config.unwrap_or_else(|| json!({})),
                triggers: req.triggers.unwrap_or_default(),
                is_public: req.is_public.unwrap_or(false),
                steps,
            })
            .await
            .map_err(|e| name_conflict(e, &name))?;

        tracing::info!(workflow_id = %workflow.id, steps = workflow.steps.len(), "workflow created");
        Ok(workflow)
    }

    pub async fn get(&self, workflow_id: Uuid, requester: Option<Uuid>) -> ApiResult<Workflow> {
        self.store
            .get_workflow(workflow_id)
            .await?
            .filter(|w| w.is_visible_to(requester))
            .ok_or_else(|| ApiError::not_found("Workflow not found"))
    }

    pub async fn update(
        &self,
        workflow_id: Uuid,
        user_id: Uuid,
        req: UpdateWorkflowRequest,
    ) -> ApiResult<Workflow> {
        let mut validator = Validator::new();
        if let Some(name) = req.name.as_deref() {
            validator.name("name", name, MIN_WORKFLOW_NAME_CHARS);
        }
        validator
            .max_bytes("description", req.description.as_deref(), MAX_DESCRIPTION_BYTES)
            .triggers(req.triggers.as_deref());
        let steps = match req.steps {
            Some(steps) => Some(self.steps(&mut validator, user_id, steps).await?),
            None => None,
        };
        validator.finish()?;

        self.owned(workflow_id, user_id).await?;

        let name = req.name.as_deref().map(str::trim).map(str::to_string);
        let patch = WorkflowPatch {
            name: name.clone(),
            description: req.description.map(|d| d.trim().to_string()),
            status: req.status,
            config: req.config,
            triggers: req.triggers,
            is_public: req.is_public,
            steps,
        };

        let workflow = self
            .store
            .update_workflow(workflow_id, patch)
            .await
            .map_err(|e| name_conflict(e, name.as_deref().unwrap_or_default()))?
            .ok_or_else(|| ApiError::not_found("Workflow not found"))?;

        tracing::info!(workflow_id = %workflow.id, "workflow updated");
        Ok(workflow)
    }

    pub async fn delete(&self, workflow_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        self.owned(workflow_id, user_id).await?;
        if !self.store.delete_workflow(workflow_id).await? {
            return Err(ApiError::not_found("Workflow not found"));
        }
        tracing::info!(workflow_id = %workflow_id, "workflow deleted");
        Ok(())
    }

    async fn owned(&self, workflow_id: Uuid, user_id: Uuid) -> ApiResult<Workflow> {
        self.store
            .get_workflow(workflow_id)
            .await?
            .filter(|w| w.is_owned_by(user_id))
            .ok_or_else(|| ApiError::not_found("Workflow not found"))
    }

    /// Validate step input and turn it into store input
    async fn steps(
        &self,
        validator: &mut Validator,
        user_id: Uuid,
        steps: Vec<WorkflowStepInput>,
    ) -> ApiResult<Vec<NewWorkflowStep>> {
        let mut out = Vec::with_capacity(steps.len());
        for (index, step) in steps.into_iter().enumerate() {
            let name = trimmed(step.name);
            let step_type = trimmed(step.step_type);
            validator
                .check(name.is_some(), format!("steps[{}].name is required", index))
                .check(
                    step_type.is_some(),
                    format!("steps[{}].type is required", index),
                );

            if let Some(agent_id) = step.agent_id {
                let visible = self
                    .store
                    .get_agent(agent_id)
                    .await?
                    .is_some_and(|a| a.is_visible_to(Some(user_id)));
                validator.check(
                    visible,
                    format!("steps[{}] references an unknown agent", index),
                );
            }

            out.push(NewWorkflowStep {
                name: name.unwrap_or_default(),
                step_type: step_type.unwrap_or_default(),
                config: step.config.unwrap_or(Value::Object(Default::default())),
                position: step.position.unwrap_or(index as i32),
                agent_id: step.agent_id,
            });
        }
        Ok(out)
    }
}

fn name_conflict(err: StoreError, name: &str) -> ApiError {
    if err.is_conflict() {
        ApiError::conflict(format!("A workflow named '{}' already exists", name))
    } else {
        err.into()
    }
}
