//! Tool schema declared to the text generation provider

use serde_json::{json, Value};

/// Function declarations for the closed tool set, in the generation
/// provider's schema format.
pub fn function_declarations() -> Value {
    json!([
        {
            "name": "search_web",
            "description": "Search the web for current information, news, or any topic that might benefit from real-time data",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Max results to return"
                    }
                },
                "required": ["query"]
            }
        },
        {
            "name": "get_weather",
            "description": "Get current weather information for any location",
            "parameters": {
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city name, e.g., 'London, UK'"
                    },
                    "units": {
                        "type": "string",
                        "description": "Units for temperature",
                        "enum": ["metric", "imperial", "kelvin"]
                    }
                },
                "required": ["location"]
            }
        }
    ])
}
