// Trigger definitions attached to agents and workflows
//
// Triggers are descriptive only: nothing in the system fires them. They are
// still a closed set so that malformed definitions are rejected at the edge.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trigger {
    /// Cron-style schedule (five fields: minute hour day month weekday)
    Schedule {
        cron: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Inbound webhook
    Webhook {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    /// Named application event
    Event { name: String },
    /// Started by hand from the console
    Manual,
}

impl Trigger {
    /// Check the shape of the trigger definition
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Trigger::Schedule { cron, .. } => {
                let fields = cron.split_whitespace().count();
                if fields != 5 {
                    return Err(format!(
                        "schedule trigger cron must have 5 fields, got {}",
                        fields
                    ));
                }
                Ok(())
            }
            Trigger::Webhook { path: Some(path) } if !path.starts_with('/') => {
                Err("webhook trigger path must start with '/'".to_string())
            }
            Trigger::Event { name } if name.trim().is_empty() => {
                Err("event trigger name must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}
