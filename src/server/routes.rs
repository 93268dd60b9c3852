use crate::server::api;
use crate::server::ConsoleState;
use crate::session::ApplyError;

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

fn json_ok(body: String) -> HttpResponse {
    HttpResponse {
        status_code: 200,
        status_text: "OK",
        content_type: "application/json",
        body,
    }
}

pub fn route_request(
    state: &mut ConsoleState,
    method: &str,
    path: &str,
    body: &str,
) -> HttpResponse {
    match (method, path) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/html; charset=utf-8",
            body: index_html(),
        },
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("GET", "/api/catalog") => match api::catalog_payload(state) {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/catalog/refresh") => match api::catalog_refresh_payload(state) {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("GET", "/api/selection") => match api::selection_payload(state) {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/selection/effect") => match api::add_effect_payload(state, body) {
            Ok(payload) => json_ok(payload),
            Err(api::RequestError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
        },
        ("POST", "/api/selection/condition") => match api::add_condition_payload(state, body) {
            Ok(payload) => json_ok(payload),
            Err(api::RequestError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
        },
        ("POST", "/api/selection/template") => match api::pick_template_payload(state, body) {
            Ok(payload) => json_ok(payload),
            Err(api::RequestError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
        },
        ("POST", "/api/selection/uses") => match api::set_uses_payload(state, body) {
            Ok(payload) => json_ok(payload),
            Err(api::RequestError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
        },
        ("POST", "/api/selection/clear") => match api::clear_payload(state) {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/apply") => match api::apply_payload(state) {
            Ok(payload) => json_ok(payload),
            Err(err) => apply_error_response(err),
        },
        ("GET", "/api/sync/log") => match api::sync_log_payload(state) {
            Ok(payload) => json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn apply_error_response(err: ApplyError) -> HttpResponse {
    let (status_code, status_text) = match err {
        ApplyError::AuthorityDenied => (403, "Forbidden"),
        ApplyError::MissingTemplate | ApplyError::MissingParticipant => (400, "Bad Request"),
        ApplyError::SyncRejected => (502, "Bad Gateway"),
        ApplyError::Unexpected(_) => (500, "Internal Server Error"),
    };
    error_response(status_code, status_text, &err.to_string())
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
  <title>Implantforge Console</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    input { width: 100%; padding: 8px; box-sizing: border-box; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>Implantforge Console</h1>
  <p>Discover the host's implant catalogs, compose a custom implant, apply it to the local participant.</p>

  <div class="card">
    <strong>Catalogs</strong>
    <div>
      <button id="catalog-btn">GET /api/catalog</button>
      <button id="refresh-btn">POST /api/catalog/refresh</button>
    </div>
  </div>

  <div class="card">
    <strong>Selection</strong>
    <label for="template">Template</label>
    <input id="template" value="ADRENALINE" />
    <label for="effect">Effect</label>
    <input id="effect" value="DAMAGE_BOOST" />
    <label for="magnitude">Magnitude (0-5)</label>
    <input id="magnitude" type="number" step="0.05" value="0.20" />
    <label for="condition">Condition</label>
    <input id="condition" value="" />
    <label for="uses">Uses (1-3)</label>
    <input id="uses" type="number" min="1" max="3" value="2" />
    <div>
      <button id="template-btn">Pick template</button>
      <button id="effect-btn">Add effect</button>
      <button id="condition-btn">Add condition</button>
      <button id="uses-btn">Set uses</button>
      <button id="clear-btn">Clear</button>
    </div>
  </div>

  <div class="card">
    <strong>Apply</strong>
    <div>
      <button id="apply-btn">POST /api/apply</button>
      <button id="log-btn">GET /api/sync/log</button>
    </div>
  </div>

  <pre id="output">Ready.</pre>

  <script>
    const output = document.getElementById('output');
    const value = id => document.getElementById(id).value;

    async function request(path, options) {
      output.textContent = 'Loading…';
      const response = await fetch(path, options);
      const text = await response.text();
      output.textContent = 'HTTP ' + response.status + '\n' + text;
    }

    function post(path, payload) {
      request(path, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: payload == null ? '' : JSON.stringify(payload),
      });
    }

    document.getElementById('catalog-btn').addEventListener('click', () => request('/api/catalog', { method: 'GET' }));
    document.getElementById('refresh-btn').addEventListener('click', () => post('/api/catalog/refresh', null));
    document.getElementById('template-btn').addEventListener('click', () => post('/api/selection/template', { name: value('template') }));
    document.getElementById('effect-btn').addEventListener('click', () => post('/api/selection/effect', { name: value('effect'), magnitude: Number(value('magnitude')) || 0 }));
    document.getElementById('condition-btn').addEventListener('click', () => post('/api/selection/condition', { name: value('condition') }));
    document.getElementById('uses-btn').addEventListener('click', () => post('/api/selection/uses', { uses: Number(value('uses')) || 2 }));
    document.getElementById('clear-btn').addEventListener('click', () => post('/api/selection/clear', null));
    document.getElementById('apply-btn').addEventListener('click', () => post('/api/apply', null));
    document.getElementById('log-btn').addEventListener('click', () => request('/api/sync/log', { method: 'GET' }));
  </script>
</body>
</html>
"#
    .to_string()
}
