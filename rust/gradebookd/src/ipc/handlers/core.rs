use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let conn = match db::open_db(&path) {
        Ok(conn) => conn,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };
    let data = match db::load_class_data(&conn) {
        Ok(data) => data,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };

    tracing::info!(
        workspace = %path.to_string_lossy(),
        students = data.students.len(),
        assessments = data.assessments.len(),
        "workspace selected"
    );

    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "classId": data.id,
        "studentCount": data.students.len(),
        "assessmentCount": data.assessments.len(),
    });
    state.workspace = Some(path);
    state.db = Some(conn);
    state.class_data = Some(data);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
