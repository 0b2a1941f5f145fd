//! Prints the Cinelist OpenAPI document as JSON.
//!
//! Usage:
//!   cargo run -p cinelist-api --bin generate-openapi > openapi.json

use cinelist_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI document: {}", e);
            std::process::exit(1);
        }
    }
}
