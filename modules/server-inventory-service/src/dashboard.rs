//! Dashboard HTML page and its form handlers.
//!
//! Serves a self-contained HTML page with inline CSS showing the server
//! table, per-column filters, search, the add/edit forms and YAML
//! import/export. Every form posts back to a `/ui/*` route that updates
//! the controller and redirects to `/`.

use crate::routes::{AppState, yaml_attachment};
use axum::Router;
use axum::extract::{Form, Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use server_inventory_client::{Action, Edit, ViewState};
use server_inventory_types::{COLUMNS, ServerRecord};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard))
        .route("/ui/search", post(search))
        .route("/ui/filters", post(set_filters))
        .route("/ui/filters/clear", post(clear_filters))
        .route("/ui/form", post(toggle_form))
        .route("/ui/servers", post(add_server))
        .route("/ui/edit/begin", post(begin_edit))
        .route("/ui/edit", post(submit_edit))
        .route("/ui/edit/cancel", post(cancel_edit))
        .route("/ui/import", post(import))
        .route("/ui/export", get(export))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    reload: bool,
}

#[derive(Debug, Deserialize)]
pub struct BeginEditForm {
    index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    q: String,
}

fn back() -> Redirect {
    Redirect::to("/")
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let mut controller = state.controller.lock().await;
    if query.reload {
        controller.edit(Edit::SetSearchQuery(String::new()));
        controller.dispatch(Action::Load).await.ok();
    } else {
        controller.refresh().await.ok();
    }

    let meta = PageMeta {
        uptime_secs: state.start_time.elapsed().as_secs(),
        source: &state.source,
    };
    let html = render_page(controller.state(), &meta);

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

// POST /ui/search
async fn search(State(state): State<Arc<AppState>>, Form(form): Form<SearchForm>) -> Redirect {
    let mut controller = state.controller.lock().await;
    controller.edit(Edit::SetSearchQuery(form.q));
    controller.dispatch(Action::Search).await.ok();
    back()
}

// POST /ui/filters
async fn set_filters(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Redirect {
    let mut controller = state.controller.lock().await;
    for c in COLUMNS {
        let value = fields.get(c.key).cloned().unwrap_or_default();
        controller.edit(Edit::SetFilter {
            key: c.key.to_string(),
            value,
        });
    }
    back()
}

// POST /ui/filters/clear
async fn clear_filters(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.lock().await.edit(Edit::ClearFilters);
    back()
}

// POST /ui/form
async fn toggle_form(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.lock().await.edit(Edit::ToggleForm);
    back()
}

// POST /ui/servers
async fn add_server(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Redirect {
    let mut controller = state.controller.lock().await;
    for (key, value) in fields {
        controller.edit(Edit::SetDraftField { key, value });
    }
    controller.dispatch(Action::SubmitNew).await.ok();
    back()
}

// POST /ui/edit/begin
async fn begin_edit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<BeginEditForm>,
) -> Redirect {
    state.controller.lock().await.edit(Edit::BeginEdit(form.index));
    back()
}

// POST /ui/edit
async fn submit_edit(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Redirect {
    let mut controller = state.controller.lock().await;
    for (key, value) in fields {
        controller.edit(Edit::SetEditField { key, value });
    }
    controller.dispatch(Action::SubmitEdit).await.ok();
    back()
}

// POST /ui/edit/cancel
async fn cancel_edit(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.lock().await.edit(Edit::CancelEdit);
    back()
}

// POST /ui/import
async fn import(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Redirect {
    let mut controller = state.controller.lock().await;
    match read_upload(&mut multipart).await {
        Ok(Some(text)) => {
            controller.dispatch(Action::Import(text)).await.ok();
        }
        Ok(None) => log::warn!("Import submitted without a file"),
        Err(message) => controller.record_error(message),
    }
    back()
}

/// Text of the `file` field, if the form carried one.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<String>, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed upload: {}", e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        return field
            .text()
            .await
            .map(Some)
            .map_err(|e| format!("Failed to read uploaded file: {}", e));
    }
    Ok(None)
}

// GET /ui/export
async fn export(State(state): State<Arc<AppState>>) -> Response {
    let controller = state.controller.lock().await;
    match controller.export().await {
        Ok(yaml) => yaml_attachment(yaml).into_response(),
        Err(e) => {
            log::error!("Export failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

// =====================================================
// Rendering
// =====================================================

pub struct PageMeta<'a> {
    pub uptime_secs: u64,
    pub source: &'a str,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_form(record: &ServerRecord, action: &str, title: &str, cancellable: bool) -> String {
    let mut fields = String::new();
    for c in COLUMNS {
        let value = record.field(c.key).unwrap_or("");
        let _ = write!(
            fields,
            r#"<label><span>{}</span><input type="text" name="{}" value="{}"></label>"#,
            escape(c.label),
            c.key,
            escape(value)
        );
        fields.push('\n');
    }

    // The cancel button belongs to the standalone #cancel-edit form.
    let cancel_button = if cancellable {
        r#"<button type="submit" form="cancel-edit" class="secondary">Abbrechen</button>"#
    } else {
        ""
    };

    format!(
        r#"<form class="record-form" method="post" action="{action}">
  <h2>{title}</h2>
  <div class="grid">
{fields}  </div>
  <div class="actions"><button type="submit">{title}</button>{cancel_button}</div>
</form>"#,
        action = action,
        title = escape(title),
        fields = fields,
        cancel_button = cancel_button,
    )
}

fn render_table(view: &ViewState) -> String {
    let mut head = String::new();
    let mut filter_row = String::new();
    for c in COLUMNS {
        let _ = write!(head, "<th>{}</th>", escape(c.label));
        let _ = write!(
            filter_row,
            r#"<th><input type="text" form="filters" name="{}" value="{}" placeholder="Filtern"></th>"#,
            c.key,
            escape(view.filters.get(c.key))
        );
    }

    let visible = view.visible();
    let mut rows = String::new();
    for (index, record) in &visible {
        rows.push_str("<tr>");
        for value in record.values() {
            let _ = write!(rows, "<td>{}</td>", escape(value));
        }
        let _ = write!(
            rows,
            r#"<td><form method="post" action="/ui/edit/begin"><input type="hidden" name="index" value="{}"><button type="submit" class="secondary">Bearbeiten</button></form></td></tr>"#,
            index
        );
        rows.push('\n');
    }
    if visible.is_empty() {
        let _ = write!(
            rows,
            r#"<tr><td colspan="{}">No servers to show.</td></tr>"#,
            COLUMNS.len() + 1
        );
    }

    format!(
        r#"<p class="meta">Showing {shown} of {total}</p>
<div class="scroll">
<table>
  <thead>
    <tr>{head}<th>Actions</th></tr>
    <tr class="filters">{filter_row}<th><button type="submit" form="filters">Filtern</button></th></tr>
  </thead>
  <tbody>
{rows}  </tbody>
</table>
</div>"#,
        shown = visible.len(),
        total = view.servers.len(),
        head = head,
        filter_row = filter_row,
        rows = rows,
    )
}

pub fn render_page(view: &ViewState, meta: &PageMeta) -> String {
    let error_html = view
        .last_error
        .as_deref()
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape(e)))
        .unwrap_or_default();

    let toggle_label = if view.show_form {
        "Ausblenden"
    } else {
        "Server hinzufügen"
    };

    let add_form = if view.show_form {
        render_form(&view.draft, "/ui/servers", "Server hinzufügen", false)
    } else {
        String::new()
    };

    let edit_form = view
        .editing
        .as_ref()
        .map(|r| render_form(r, "/ui/edit", "Server aktualisieren", true))
        .unwrap_or_default();

    let clear_filters = if view.filters.is_active() {
        r#"<form method="post" action="/ui/filters/clear"><button type="submit" class="secondary">Filter zurücksetzen</button></form>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Serverübersicht MxSQL</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  h1 a {{ color: inherit; text-decoration: none; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 12px; }}
  .toolbar {{ display: flex; gap: 8px; flex-wrap: wrap; margin-bottom: 20px; align-items: center; }}
  .toolbar form {{ display: flex; gap: 8px; }}
  .toolbar .search {{ flex-grow: 1; }}
  .toolbar .search input {{ flex-grow: 1; }}
  input[type=text] {{ background: #0d1117; border: 1px solid #30363d; border-radius: 6px; color: #e0e0e0; padding: 6px 8px; width: 100%; }}
  button, a.button {{ background: #238636; border: none; border-radius: 6px; color: #fff; cursor: pointer; padding: 7px 14px; font-size: 0.9em; text-decoration: none; white-space: nowrap; }}
  button.secondary {{ background: #30363d; }}
  .error {{ background: #3d1418; border: 1px solid #f85149; border-radius: 6px; color: #f85149; padding: 10px 14px; margin-bottom: 16px; }}
  .record-form {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px; margin-bottom: 24px; }}
  .record-form .grid {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; margin-bottom: 12px; }}
  .record-form label span {{ display: block; color: #8b949e; font-size: 0.8em; margin-bottom: 4px; }}
  .record-form .actions {{ display: flex; gap: 8px; }}
  .scroll {{ overflow-x: auto; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; border-bottom: 1px solid #30363d; white-space: nowrap; }}
  tr.filters th {{ padding: 4px 6px; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; white-space: nowrap; }}
  tr:hover {{ background: #161b22; }}
  a {{ color: #58a6ff; text-decoration: none; }}
  a:hover {{ text-decoration: underline; }}
</style>
</head>
<body>
  <h1><a href="/?reload=true">Serverübersicht MxSQL</a></h1>
  <p class="meta">Uptime: {uptime} &middot; Source: {source}</p>

  {error_html}

  <div class="toolbar">
    <form class="search" method="post" action="/ui/search">
      <input type="text" name="q" value="{query}" placeholder="Server suchen...">
      <button type="submit">Suchen</button>
    </form>
    <form method="post" action="/ui/form"><button type="submit">{toggle_label}</button></form>
    <form method="post" action="/ui/import" enctype="multipart/form-data">
      <input type="file" name="file" accept=".yaml,.yml">
      <button type="submit">YAML importieren</button>
    </form>
    <a class="button" href="/ui/export">YAML exportieren</a>
    {clear_filters}
  </div>

  {add_form}
  {edit_form}

  <form id="filters" method="post" action="/ui/filters"></form>
  <form id="cancel-edit" method="post" action="/ui/edit/cancel"></form>
  {table}
</body>
</html>"#,
        uptime = format_uptime(meta.uptime_secs),
        source = escape(meta.source),
        error_html = error_html,
        query = escape(&view.search_query),
        toggle_label = toggle_label,
        clear_filters = clear_filters,
        add_form = add_form,
        edit_form = edit_form,
        table = render_table(view),
    )
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
