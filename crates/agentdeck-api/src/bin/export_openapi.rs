// Export the OpenAPI document as JSON
//
// Usage: cargo run --bin export-openapi > docs/api/openapi.json

use agentdeck_api::openapi::ApiDoc;

fn main() {
    println!("{}", ApiDoc::to_json());
}
