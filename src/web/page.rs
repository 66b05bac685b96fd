//! The single-page chat UI.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Azure Data Explorer Agent</title>
<style>
  * { box-sizing: border-box; }
  body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: #f7f8fa; color: #1f2933; display: flex; min-height: 100vh; }
  aside { width: 300px; background: #eef1f5; padding: 20px; border-right: 1px solid #d9dee5; }
  main { flex: 1; padding: 24px 40px; display: flex; flex-direction: column; max-width: 1100px; }
  h1 { margin: 0 0 4px; font-size: 28px; }
  .caption { color: #6b7785; font-size: 14px; margin-bottom: 16px; }
  hr { border: none; border-top: 1px solid #d9dee5; margin: 16px 0; }
  .status-row { display: flex; gap: 8px; }
  .pill { flex: 1; padding: 8px; border-radius: 6px; font-size: 14px; text-align: center; }
  .ok { background: #dff5e3; color: #1b7f3b; }
  .bad { background: #fde2e1; color: #b42318; }
  .info { background: #e1efff; color: #1d4f91; padding: 10px; border-radius: 6px; font-size: 14px; }
  .error { background: #fde2e1; color: #b42318; padding: 10px; border-radius: 6px; margin: 6px 0; }
  label { display: block; font-size: 14px; margin: 10px 0 4px; }
  input, select { width: 100%; padding: 8px; border: 1px solid #c4ccd6; border-radius: 6px; font-size: 14px; }
  input:disabled { background: #e5e9ee; }
  button { padding: 8px 14px; border: 1px solid #c4ccd6; border-radius: 6px; background: white; cursor: pointer; font-size: 14px; }
  button.primary { background: #ff4b4b; border-color: #ff4b4b; color: white; }
  button.wide { width: 100%; margin-top: 8px; }
  button:disabled { opacity: .5; cursor: default; }
  .columns { display: flex; gap: 24px; }
  .columns > div { flex: 1; }
  .field-error { color: #b42318; font-size: 13px; margin-top: 4px; }
  details { background: white; border: 1px solid #d9dee5; border-radius: 6px; padding: 6px 10px; margin: 6px 0; font-size: 14px; }
  details p { color: #6b7785; margin: 6px 0 0; }
  pre.example { background: #f0f2f5; padding: 8px; border-radius: 6px; }
  #transcript { flex: 1; overflow-y: auto; }
  .msg { display: flex; gap: 10px; padding: 12px; border-radius: 8px; margin: 8px 0; }
  .msg.user { background: #f0f2f6; }
  .msg.assistant { background: white; border: 1px solid #e4e8ee; }
  .msg .avatar { font-size: 20px; }
  .msg .text { white-space: pre-wrap; word-break: break-word; line-height: 1.5; flex: 1; }
  #chat-form { display: flex; gap: 8px; margin-top: 12px; }
  #chat-form input { flex: 1; }
  .spinner { color: #6b7785; font-style: italic; padding: 8px 12px; }
  footer { display: flex; justify-content: space-between; color: #6b7785; font-size: 13px; margin-top: 16px; }
  .hidden { display: none !important; }
</style>
</head>
<body>
<aside>
  <h2>⚙️ Configuration</h2>
  <h3>📡 Connection Status</h3>
  <div class="status-row">
    <div id="llm-status" class="pill bad">❌ OpenAI</div>
    <div id="mcp-status" class="pill bad">❌ MCP</div>
  </div>
  <div id="server-details" class="hidden">
    <hr>
    <h3>🔌 Server Details</h3>
    <label>URL</label><input id="detail-url" disabled>
    <label>Transport</label><input id="detail-transport" disabled>
  </div>
  <div id="tools-section" class="hidden">
    <hr>
    <h3>🛠️ Available Tools</h3>
    <div id="tools"></div>
  </div>
  <div id="actions" class="hidden">
    <hr>
    <button id="reset" class="wide">🔄 Reset Connection</button>
  </div>
  <button id="clear" class="wide hidden">🗑️ Clear Chat</button>
</aside>

<main>
  <h1>📊 Azure Data Explorer Agent</h1>
  <div class="caption">AI agent specialized for KQL queries against Azure incident data</div>

  <section id="config-view" class="hidden">
    <hr>
    <h2>🔐 Connect to Services</h2>
    <form id="config-form" autocomplete="off">
      <div class="columns">
        <div>
          <h4>OpenAI Configuration</h4>
          <label for="credential">OpenAI API Key</label>
          <input id="credential" type="password" placeholder="sk-proj-..." title="Your OpenAI API key starting with 'sk-'">
          <div class="field-error" data-field="llm_credential"></div>
        </div>
        <div>
          <h4>MCP Server Configuration</h4>
          <label for="url">MCP Server URL</label>
          <input id="url" placeholder="https://your-mcp-server.com/sse" title="The URL of your MCP server endpoint (e.g., Azure Data Explorer MCP)">
          <div class="field-error" data-field="tool_server_url"></div>
          <label for="transport">Transport Type</label>
          <select id="transport" title="Select the transport protocol your MCP server uses">
            <option value="sse">sse</option>
            <option value="streamable_http">streamable_http</option>
          </select>
          <div class="field-error" data-field="transport"></div>
          <p id="transport-info" class="info"></p>
        </div>
      </div>
      <details>
        <summary>📋 Example Configurations</summary>
        <p><b>Azure MCP Server (SSE)</b></p>
        <pre class="example">URL: https://mcp-azure-agenticai-bootcamp.azurewebsites.net/sse
Transport: sse</pre>
      </details>
      <hr>
      <div id="config-errors"></div>
      <button class="primary wide" type="submit">🚀 Connect</button>
    </form>
  </section>

  <section id="connect-view" class="hidden">
    <hr>
    <div id="connect-status" class="info"></div>
    <div id="connect-error" class="hidden">
      <div id="connect-error-text" class="error"></div>
      <details id="connect-hint" class="hidden" open>
        <summary>🔍 Troubleshooting</summary>
        <p id="connect-hint-text"></p>
      </details>
      <button id="retry">🔄 Try Again</button>
    </div>
  </section>

  <section id="chat-view" class="hidden" style="display:flex; flex-direction:column; flex:1;">
    <hr>
    <div id="welcome" class="hidden">
      <h3>👋 Welcome to Azure Data Explorer Agent!</h3>
      <p>I'm your specialized KQL query assistant connected to Azure Data Explorer. I can help you:</p>
      <ul>
        <li><b>Query incident data</b> from the <span class="db-name">Azure_Issues</span> table</li>
        <li><b>Analyze support tickets</b> with nested data expansion</li>
        <li><b>Generate insights</b> on impacted regions, time to mitigation, and more</li>
        <li><b>Search and filter</b> incidents by keywords, dates, and services</li>
      </ul>
      <p><b>Example queries you can try:</b></p>
      <ul>
        <li>"Show me the latest 10 incidents"</li>
        <li>"Find all storage-related incidents"</li>
        <li>"What's the average time to mitigation?"</li>
        <li>"List incidents with the most support tickets"</li>
        <li>"Show incidents affecting the East US region"</li>
      </ul>
      <p><b>Type a message below to get started!</b></p>
    </div>
    <div id="transcript"></div>
    <div id="spinner" class="spinner hidden">🔍 Analyzing and executing KQL query...</div>
    <form id="chat-form">
      <input id="message" placeholder="Ask about Azure incidents... I'll write and execute KQL queries!" autocomplete="off">
      <button class="primary" type="submit">Send</button>
    </form>
  </section>

  <hr>
  <footer>
    <span id="footer-transport">🔌 Transport: SSE</span>
    <span>📊 Database: <span class="db-name">Azure_Issues</span></span>
    <span>MCP Client</span>
  </footer>
</main>

<script>
const TRANSPORT_INFO = {
  sse: "SSE (Server-Sent Events): Best for HTTP servers that stream responses. Common for cloud-hosted MCP servers.",
  streamable_http: "Streamable HTTP: For servers using the newer HTTP streaming transport protocol."
};
const SESSION_KEY = "adx-agent-session";
const $ = (id) => document.getElementById(id);
let sessionId = sessionStorage.getItem(SESSION_KEY);
let pending = false;

async function api(method, path, body) {
  const res = await fetch(path, {
    method,
    headers: body ? { "Content-Type": "application/json" } : {},
    body: body ? JSON.stringify(body) : undefined
  });
  const data = res.status === 204 ? null : await res.json().catch(() => null);
  if (!res.ok) {
    const err = new Error((data && data.error) || res.statusText);
    err.status = res.status;
    err.body = data;
    throw err;
  }
  return data;
}

async function ensureSession() {
  if (sessionId) {
    try {
      return await api("GET", `/api/sessions/${sessionId}`);
    } catch (e) {
      if (e.status !== 404 && e.status !== 400) throw e;
    }
  }
  const view = await api("POST", "/api/sessions");
  sessionId = view.id;
  sessionStorage.setItem(SESSION_KEY, sessionId);
  return view;
}

function show(id, visible) { $(id).classList.toggle("hidden", !visible); }

function setPill(id, ok, label) {
  const el = $(id);
  el.className = "pill " + (ok ? "ok" : "bad");
  el.textContent = (ok ? "✅ " : "❌ ") + label;
}

function render(view) {
  setPill("llm-status", view.configured, "OpenAI");
  setPill("mcp-status", view.phase === "connected", "MCP");

  show("server-details", !!view.server);
  if (view.server) {
    $("detail-url").value = view.server.url;
    $("detail-transport").value = view.server.transport.toUpperCase();
    $("footer-transport").textContent = "🔌 Transport: " + view.server.transport.toUpperCase();
  }

  const tools = $("tools");
  tools.replaceChildren(...view.tools.map((tool) => {
    const d = document.createElement("details");
    const s = document.createElement("summary");
    s.textContent = "📦 " + tool.name;
    const p = document.createElement("p");
    p.textContent = tool.description;
    d.append(s, p);
    return d;
  }));
  show("tools-section", view.tools.length > 0);
  show("actions", view.configured);
  show("clear", view.transcript.length > 0);

  show("config-view", view.phase === "unconfigured");
  show("connect-view", ["ready", "connecting", "failed"].includes(view.phase));
  show("chat-view", view.phase === "connected");

  if (view.phase === "connecting" || view.phase === "ready") {
    $("connect-status").textContent = "🔄 Initializing Azure Data Explorer Agent...";
    show("connect-error", view.phase === "ready");
    $("connect-error-text").textContent = view.phase === "ready" ? "Not connected yet." : "";
    show("connect-hint", false);
  } else if (view.phase === "failed") {
    $("connect-status").textContent = "❌ Initialization Failed";
    $("connect-error-text").textContent = "Error: " + view.failure;
    $("connect-hint-text").textContent = view.hint || "";
    show("connect-hint", !!view.hint);
    show("connect-error", true);
  }

  show("welcome", view.transcript.length === 0);
  const transcript = $("transcript");
  transcript.replaceChildren(...view.transcript.map(renderTurn));
  transcript.scrollTop = transcript.scrollHeight;

  const busy = view.busy || pending;
  $("message").disabled = busy;
  document.querySelector("#chat-form button").disabled = busy;
  show("spinner", busy);
}

function renderTurn(turn) {
  const row = document.createElement("div");
  row.className = "msg " + turn.role;
  const avatar = document.createElement("span");
  avatar.className = "avatar";
  avatar.textContent = turn.role === "user" ? "🧑" : "🤖";
  const text = document.createElement("div");
  text.className = "text";
  text.textContent = turn.text;
  row.append(avatar, text);
  return row;
}

function clearFieldErrors() {
  document.querySelectorAll(".field-error").forEach((el) => (el.textContent = ""));
  $("config-errors").replaceChildren();
}

function showFieldErrors(fields) {
  for (const { field, message } of fields) {
    const slot = document.querySelector(`.field-error[data-field="${field}"]`);
    if (slot) slot.textContent = "❌ " + message;
  }
}

function showConfigError(message) {
  const el = document.createElement("div");
  el.className = "error";
  el.textContent = "❌ " + message;
  $("config-errors").append(el);
}

async function connect() {
  render({ ...(await api("GET", `/api/sessions/${sessionId}`)), phase: "connecting" });
  try {
    render(await api("POST", `/api/sessions/${sessionId}/connect`));
  } catch (e) {
    render(await api("GET", `/api/sessions/${sessionId}`));
  }
}

$("transport").addEventListener("change", (e) => {
  $("transport-info").textContent = TRANSPORT_INFO[e.target.value] || "";
});

$("config-form").addEventListener("submit", async (e) => {
  e.preventDefault();
  clearFieldErrors();
  try {
    await api("POST", `/api/sessions/${sessionId}/config`, {
      llm_credential: $("credential").value,
      tool_server_url: $("url").value,
      transport: $("transport").value
    });
  } catch (err) {
    if (err.body && err.body.fields) showFieldErrors(err.body.fields);
    else showConfigError(err.body && err.body.hint ? `${err.message}. ${err.body.hint}` : err.message);
    return;
  }
  $("credential").value = "";
  await connect();
});

$("retry").addEventListener("click", connect);

$("reset").addEventListener("click", async () => {
  render(await api("POST", `/api/sessions/${sessionId}/reset`));
});

$("clear").addEventListener("click", async () => {
  try {
    render(await api("DELETE", `/api/sessions/${sessionId}/transcript`));
  } catch (e) {
    /* busy: the in-flight turn will re-render */
  }
});

$("chat-form").addEventListener("submit", async (e) => {
  e.preventDefault();
  const input = $("message");
  const message = input.value.trim();
  if (!message || pending) return;
  pending = true;
  input.value = "";
  const current = await api("GET", `/api/sessions/${sessionId}`);
  current.transcript.push({ role: "user", text: message });
  render(current);
  try {
    const res = await api("POST", `/api/sessions/${sessionId}/turns`, { message });
    pending = false;
    render(res.session);
  } catch (err) {
    pending = false;
    render(await api("GET", `/api/sessions/${sessionId}`));
  }
  input.focus();
});

(async () => {
  $("transport-info").textContent = TRANSPORT_INFO.sse;
  try {
    const health = await api("GET", "/health");
    document.querySelectorAll(".db-name").forEach((el) => (el.textContent = health.database));
  } catch (e) {
    /* footer keeps its default */
  }
  render(await ensureSession());
})();
</script>
</body>
</html>
"##;
