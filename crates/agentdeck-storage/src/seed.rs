// Built-in tool catalog, upserted at start-up

use agentdeck_core::{NewTool, StoreResult, ToolStore, ToolType};
use serde_json::{json, Value};
use tracing::info;

fn builtin(name: &str, description: &str, config: Value) -> NewTool {
    NewTool {
        name: name.to_string(),
        description: Some(description.to_string()),
        tool_type: ToolType::Api,
        config,
        schema: None,
        is_built_in: true,
        is_active: true,
    }
}

/// The tools every installation ships with
pub fn builtin_tools() -> Vec<NewTool> {
    vec![
        builtin(
            "openweather",
            "OpenWeatherMap API for weather data",
            json!({
                "baseUrl": "https://api.openweathermap.org/data/2.5",
                "requiresApiKey": true,
                "endpoints": [
                    {"path": "/weather", "method": "GET", "description": "Current weather"},
                    {"path": "/forecast", "method": "GET", "description": "5-day forecast"}
                ]
            }),
        ),
        builtin(
            "newsapi",
            "NewsAPI for latest news",
            json!({
                "baseUrl": "https://newsapi.org/v2",
                "requiresApiKey": true,
                "endpoints": [
                    {"path": "/top-headlines", "method": "GET", "description": "Top headlines"},
                    {"path": "/everything", "method": "GET", "description": "Search articles"}
                ]
            }),
        ),
        builtin(
            "github",
            "GitHub API for repository data",
            json!({
                "baseUrl": "https://api.github.com",
                "requiresApiKey": false,
                "endpoints": [
                    {"path": "/repos/{owner}/{repo}", "method": "GET", "description": "Get repository"},
                    {"path": "/users/{username}", "method": "GET", "description": "Get user"}
                ]
            }),
        ),
        builtin(
            "jsonplaceholder",
            "JSONPlaceholder for testing",
            json!({
                "baseUrl": "https://jsonplaceholder.typicode.com",
                "requiresApiKey": false,
                "endpoints": [
                    {"path": "/posts", "method": "GET", "description": "Get posts"},
                    {"path": "/users", "method": "GET", "description": "Get users"}
                ]
            }),
        ),
    ]
}

/// Upsert the built-in tools; returns how many were written
pub async fn seed_builtin_tools(store: &dyn ToolStore) -> StoreResult<usize> {
    let tools = builtin_tools();
    let count = tools.len();
    for tool in tools {
        store.upsert_builtin_tool(tool).await?;
    }
    info!(count, "Seeded built-in tools");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdeck_core::{InMemoryStore, ToolFilter};

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let store = InMemoryStore::new();
        assert_eq!(seed_builtin_tools(&store).await.unwrap(), 4);
        seed_builtin_tools(&store).await.unwrap();

        let tools = store.list_tools(ToolFilter::default()).await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["github", "jsonplaceholder", "newsapi", "openweather"]);
        assert!(tools.iter().all(|t| t.is_built_in && t.is_active));
    }
}
