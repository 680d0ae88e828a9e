use crate::dashboard::DashboardView;

/// Render a self-contained HTML dashboard (view embedded as JSON).
///
/// The template is filled by placeholder replacement; its JS template literals
/// (`${x}`) would fight with `format!()`.
pub fn render_html_dashboard(view: &DashboardView) -> anyhow::Result<String> {
    // `</` would let contact data close the script element early.
    let json = serde_json::to_string(view)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Identity Reconciliation</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; background: #0f172a; color: #e2e8f0; }
  header { padding: 12px 16px; border-bottom: 1px solid #334155; display: flex; justify-content: space-between; align-items: center; }
  h1 { font-size: 18px; margin: 0; }
  .container { display: flex; height: calc(100vh - 58px); }
  .sidebar { width: 340px; border-right: 1px solid #334155; padding: 12px; overflow: auto; }
  .logs { width: 380px; border-left: 1px solid #334155; padding: 12px; overflow: auto; }
  .main { flex: 1; position: relative; overflow: auto; }

  .summary { display: flex; gap: 12px; flex-wrap: wrap; font-size: 14px; }
  .pill { padding: 4px 8px; border: 1px solid #334155; border-radius: 999px; background: #1e293b; }
  .pill.ok { border-color: #22c55e; color: #86efac; }
  .pill.bad { border-color: #ef4444; color: #fca5a5; }
  .muted { color: #94a3b8; font-size: 12px; }

  #canvas { position: relative; }
  #edges { position: absolute; left: 0; top: 0; pointer-events: none; }
  .node { position: absolute; width: 260px; padding: 8px 10px; border-radius: 8px; background: #1e293b; border: 1px solid #475569; font-size: 13px; box-sizing: border-box; }
  .node.primary { border: 2px solid #3b82f6; }
  .node h3 { margin: 0 0 4px 0; font-size: 14px; }
  .node ul { margin: 2px 0 0 0; padding-left: 16px; }
  .edge-label { font-size: 11px; fill: #94a3b8; }

  .log { border-left: 3px solid #475569; padding: 4px 8px; margin-bottom: 6px; background: #1e293b; border-radius: 4px; font-size: 13px; }
  .log.info { border-color: #3b82f6; }
  .log.warn { border-color: #eab308; }
  .log.error { border-color: #ef4444; }
  .log.debug { border-color: #a855f7; }
  code, pre { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 12px; }
  pre { white-space: pre-wrap; word-break: break-all; margin: 4px 0 0 0; color: #cbd5e1; }
</style>
</head>
<body>
<header>
  <h1 id="title"></h1>
  <div class="summary" id="summary"></div>
</header>

<div class="container">
  <div class="sidebar">
    <h2 style="font-size: 16px;">Last identify call</h2>
    <div id="result" class="muted">No call recorded.</div>
  </div>

  <div class="main">
    <div id="canvas">
      <svg id="edges"></svg>
    </div>
  </div>

  <div class="logs">
    <div style="display:flex; gap: 8px; margin-bottom: 8px; align-items: center;">
      <h2 style="font-size: 16px; flex: 1; margin: 0;">Logs</h2>
      <select id="levelFilter">
        <option value="all">all</option>
        <option value="info">info</option>
        <option value="warn">warn</option>
        <option value="error">error</option>
        <option value="debug">debug</option>
      </select>
    </div>
    <div id="logList"></div>
  </div>
</div>

<script>
// Embedded dashboard data (JSON object literal)
const DATA = __DATA__;

const NODE_WIDTH = 260;
const NODE_HEIGHT = 140;

const state = {
  level: "all"
};

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function list(items) {
  if (!items || items.length === 0) return `<span class="muted">none</span>`;
  return "<ul>" + items.map(x => `<li>${escapeHtml(x)}</li>`).join("") + "</ul>";
}

function renderSummary() {
  const t = DATA.totals;
  const conn = DATA.connection.state;
  const cls = conn === "connected" ? "ok" : "bad";
  const label = conn === "retrying" ? `retrying (${DATA.connection.attempt})` : conn.replace("_", " ");
  document.getElementById("title").textContent = DATA.title;
  document.getElementById("summary").innerHTML = `
    <span class="pill ${cls}">push: <b>${escapeHtml(label)}</b></span>
    <span class="pill">contacts: <b>${t.contacts}</b></span>
    <span class="pill">primaries: <b>${t.primaries}</b></span>
    <span class="pill">secondaries: <b>${t.secondaries}</b></span>
    <span class="pill">links: <b>${t.links}</b></span>
    <span class="muted">generated ${escapeHtml(DATA.generated_at)}</span>
  `;
}

function renderGraph() {
  const canvas = document.getElementById("canvas");
  const svg = document.getElementById("edges");
  const pos = new Map();

  let maxX = 0;
  let maxY = 0;
  for (const node of DATA.graph.nodes) {
    pos.set(node.id, node.position);
    maxX = Math.max(maxX, node.position.x + NODE_WIDTH);
    maxY = Math.max(maxY, node.position.y + NODE_HEIGHT);

    const el = document.createElement("div");
    el.className = "node" + (node.is_primary ? " primary" : "");
    el.style.left = node.position.x + "px";
    el.style.top = node.position.y + "px";
    const kind = node.is_primary
      ? `primary <span class="muted">(${node.secondary_count} linked)</span>`
      : `secondary <span class="muted">of ${escapeHtml(node.contact.linkedId)}</span>`;
    el.innerHTML = `
      <h3>#${escapeHtml(node.id)} ${kind}</h3>
      <div class="muted">emails</div>${list(node.emails)}
      <div class="muted">phone numbers</div>${list(node.phone_numbers)}
    `;
    canvas.appendChild(el);
  }

  canvas.style.width = (maxX + 100) + "px";
  canvas.style.height = (maxY + 100) + "px";
  svg.setAttribute("width", maxX + 100);
  svg.setAttribute("height", maxY + 100);

  const parts = [];
  for (const edge of DATA.graph.edges) {
    const a = pos.get(edge.source);
    const b = pos.get(edge.target);
    if (!a || !b) continue;
    const x1 = a.x + NODE_WIDTH, y1 = a.y + 30;
    const x2 = b.x, y2 = b.y + 30;
    const mx = (x1 + x2) / 2;
    parts.push(`<path d="M ${x1} ${y1} C ${mx} ${y1}, ${mx} ${y2}, ${x2} ${y2}" stroke="#64748b" stroke-width="2" fill="none" stroke-dasharray="${edge.animated ? "6 4" : "0"}"/>`);
    parts.push(`<text class="edge-label" x="${mx}" y="${(y1 + y2) / 2 - 4}" text-anchor="middle">${escapeHtml(edge.label)}</text>`);
  }
  svg.innerHTML = parts.join("");

  if (DATA.graph.nodes.length === 0) {
    const empty = document.createElement("div");
    empty.className = "muted";
    empty.style.padding = "24px";
    empty.textContent = "No contacts in snapshot.";
    canvas.appendChild(empty);
  }
}

function renderResult() {
  const r = DATA.last_result;
  if (!r) return;
  const el = document.getElementById("result");
  el.className = "";
  const req = `<div class="muted">request</div><pre>${escapeHtml(JSON.stringify(r.request, null, 2))}</pre>`;
  if (r.success && r.data) {
    const c = r.data.contact;
    el.innerHTML = `
      <span class="pill ok">success</span> <span class="muted">${r.duration_ms} ms</span>
      ${req}
      <div class="muted">primary contact</div><code>${escapeHtml(c.primaryContactId)}</code>
      <div class="muted">emails</div>${list(c.emails)}
      <div class="muted">phone numbers</div>${list(c.phoneNumbers)}
      <div class="muted">secondary contacts</div>${list(c.secondaryContactIds)}
    `;
  } else {
    el.innerHTML = `
      <span class="pill bad">error</span> <span class="muted">${r.duration_ms} ms</span>
      ${req}
      <pre>${escapeHtml(r.error || "Unknown error")}</pre>
    `;
  }
}

function renderLogs() {
  const root = document.getElementById("logList");
  root.innerHTML = "";
  const logs = DATA.logs.filter(l => state.level === "all" || l.level === state.level);
  if (logs.length === 0) {
    root.innerHTML = `<div class="muted">${state.level === "all" ? "No logs yet" : `No ${state.level} level logs found`}</div>`;
    return;
  }
  for (const log of logs.slice().reverse()) {
    const el = document.createElement("div");
    el.className = "log " + log.level;
    const data = log.data === undefined || log.data === null
      ? ""
      : `<pre>${escapeHtml(JSON.stringify(log.data, null, 2))}</pre>`;
    el.innerHTML = `
      <div><b>${escapeHtml(log.level)}</b> <span class="muted">${escapeHtml(log.source)} · ${escapeHtml(log.timestamp)}</span></div>
      <div>${escapeHtml(log.message)}</div>
      ${data}
    `;
    root.appendChild(el);
  }
}

document.getElementById("levelFilter").addEventListener("change", (e) => {
  state.level = e.target.value || "all";
  renderLogs();
});

renderSummary();
renderGraph();
renderResult();
renderLogs();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
