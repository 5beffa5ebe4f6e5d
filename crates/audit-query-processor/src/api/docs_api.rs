//! `GET /openapi.json`, `GET /docs`, `GET /redoc` — human and
//! machine-readable API description.

use axum::response::{Html, IntoResponse, Json};
use serde_json::json;

pub async fn openapi_json() -> impl IntoResponse {
    Json(json!({
        "openapi": "3.0.0",
        "info": {
            "title": "genai-audit-query-processor",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Translates natural-language audit questions into normalized, validated structured query descriptors"
        },
        "paths": {
            "/query": {
                "post": {
                    "summary": "Translate one natural-language audit question",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "required": ["query", "session_id"],
                                    "properties": {
                                        "query": {"type": "string", "minLength": 1, "maxLength": 1000},
                                        "session_id": {"type": "string", "minLength": 1, "maxLength": 100},
                                        "model_type": {"type": "string", "maxLength": 50}
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {"description": "Translated structured query"},
                        "400": {"description": "Invalid request"},
                        "500": {"description": "Internal processing failure"}
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Liveness probe",
                    "responses": {"200": {"description": "Service is healthy"}}
                }
            }
        }
    }))
}

pub async fn docs_page() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>genai-audit-query-processor docs</title></head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist/swagger-ui-bundle.js"></script>
<script>
  window.onload = () => SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
</script>
</body>
</html>"#,
    )
}

pub async fn redoc_page() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>genai-audit-query-processor reference</title></head>
<body>
<redoc spec-url="/openapi.json"></redoc>
<script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
</body>
</html>"#,
    )
}
