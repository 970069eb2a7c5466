use crate::server::api;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    match (method, path) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/plain; charset=utf-8",
            body: index_text(),
        },
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/simulate") => api_result(api::simulate_payload(body)),
        ("POST", "/api/optimize") => api_result(api::optimize_payload(body)),
        ("POST", "/api/scenario") => api_result(api::scenario_payload(body)),
        _ => error_response(404, "Not Found", &format!("no route for {method} {path}")),
    }
}

fn api_result(result: Result<String, api::ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => json_ok(payload),
        Err(api::ApiError::Parse(err)) => {
            error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
        }
        Err(api::ApiError::Validation(response)) => HttpResponse {
            status_code: 400,
            status_text: "Bad Request",
            content_type: "application/json",
            body: serde_json::to_string_pretty(&response)
                .unwrap_or_else(|_| r#"{"status":"error"}"#.to_string()),
        },
        Err(api::ApiError::Dependency(message)) => {
            error_response(500, "Internal Server Error", &message)
        }
        Err(api::ApiError::Serialize(err)) => {
            error_response(500, "Internal Server Error", &err.to_string())
        }
    }
}

fn json_ok(body: String) -> HttpResponse {
    HttpResponse {
        status_code: 200,
        status_text: "OK",
        content_type: "application/json",
        body,
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::json!({
            "status": "error",
            "message": message,
        })
        .to_string(),
    }
}

fn index_text() -> String {
    [
        "feesim api",
        "",
        "GET  /api/health",
        "POST /api/simulate  {\"fees\": {\"high\": 2.5, \"mid\": 3.0, \"low\": 6.0}}",
        "POST /api/optimize  {\"step_pct\": 0.5, \"max_pct\": 6.0}",
        "POST /api/scenario  {\"listing_index\": 0}",
        "",
    ]
    .join("\n")
}
