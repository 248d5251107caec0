use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::server::api::{self, ApiError, Dashboard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// Dispatch one request. `path` may carry a query string.
pub fn route_request(dashboard: &Dashboard, method: &str, path: &str) -> HttpResponse {
    let route = path.split('?').next().unwrap_or("/");
    match (method, route) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/html; charset=utf-8",
            body: index_html(),
        },
        ("GET", "/api/health") => json_response(api::health_payload(dashboard).map_err(ApiError::from)),
        ("GET", "/api/countries") => json_response(api::countries_payload(dashboard).map_err(ApiError::from)),
        ("GET", "/api/years") => json_response(api::years_payload(dashboard).map_err(ApiError::from)),
        ("GET", "/api/series") => json_response(api::series_payload(dashboard, path)),
        ("GET", "/api/ranking") => json_response(api::ranking_payload(dashboard, path)),
        ("GET", "/api/map") => json_response(api::map_payload(dashboard, path)),
        (_, route) if route.starts_with("/api/") && is_known_route(route) => {
            error_response(405, "Method Not Allowed", "only GET is supported")
        }
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn is_known_route(route: &str) -> bool {
    matches!(
        route,
        "/api/health" | "/api/countries" | "/api/years" | "/api/series" | "/api/ranking" | "/api/map"
    )
}

fn json_response(result: Result<String, ApiError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        },
        Err(ApiError::BadRequest(message)) => error_response(400, "Bad Request", &message),
        Err(ApiError::NotFound(message)) => error_response(404, "Not Found", &message),
        Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

fn index_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Global Electricity Analysis</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    input { padding: 8px; box-sizing: border-box; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Global Electricity Analysis</h1>
  <p>Electricity consumption per capita, renewable share and transmission losses (World Bank).</p>

  <div class="card">
    <strong>Country series</strong>
    <label for="country">Country (ISO-3)</label>
    <input id="country" value="USA" />
    <label for="from">From / to</label>
    <input id="from" type="number" value="2000" style="width:90px" />
    <input id="to" type="number" value="2020" style="width:90px" />
    <div><button id="series-btn">GET /api/series</button></div>
  </div>

  <div class="card">
    <strong>Ranking and map</strong>
    <label for="year">Year</label>
    <input id="year" type="number" value="2020" style="width:90px" />
    <div>
      <button id="ranking-btn">GET /api/ranking</button>
      <button id="map-btn">GET /api/map</button>
    </div>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    const value = (id) => encodeURIComponent(document.getElementById(id).value.trim());

    async function request(path) {
      output.textContent = 'Loading…';
      const response = await fetch(path);
      const text = await response.text();
      output.textContent = 'HTTP ' + response.status + '\n' + text.slice(0, 20000);
    }

    document.getElementById('series-btn').addEventListener('click', () => {
      request('/api/series?country=' + value('country') + '&from=' + value('from') + '&to=' + value('to'));
    });
    document.getElementById('ranking-btn').addEventListener('click', () => {
      request('/api/ranking?year=' + value('year'));
    });
    document.getElementById('map-btn').addEventListener('click', () => {
      request('/api/map?year=' + value('year'));
    });
  </script>
</body>
</html>
"#
    .to_string()
}
