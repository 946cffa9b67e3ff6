use crate::backup;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(workspace_path)) = (state.db.as_ref(), state.workspace.clone()) else {
        return helpers::no_workspace(req);
    };
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };

    let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");

    let out = PathBuf::from(&out_path);
    let export = match backup::export_workspace_bundle(&workspace_path, &out) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "backup_failed",
                format!("{e:#}"),
                Some(json!({ "path": out_path })),
            )
        }
    };

    tracing::info!(path = %out_path, sha256 = %export.sha256, "workspace bundle exported");
    ok(
        &req.id,
        json!({
            "ok": true,
            "path": out_path,
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "sha256": export.sha256,
        }),
    )
}

fn handle_backup_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace_path) = state.workspace.clone() else {
        return helpers::no_workspace(req);
    };
    let in_path = match req.params.get("inPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing inPath", None),
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    // Drop open handle before replacing file.
    state.db = None;

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            // The old database is untouched; reattach it.
            match db::open_db(&workspace_path) {
                Ok(conn) => state.db = Some(conn),
                Err(reopen) => {
                    tracing::warn!("failed to reopen workspace after import error: {reopen:#}");
                    state.class_data = None;
                }
            }
            return err(
                &req.id,
                "backup_failed",
                format!("{e:#}"),
                Some(json!({ "path": in_path })),
            );
        }
    };

    let conn = match db::open_db(&workspace_path) {
        Ok(conn) => conn,
        Err(e) => {
            state.class_data = None;
            return err(&req.id, "db_open_failed", format!("{e:#}"), None);
        }
    };
    let data = match db::load_class_data(&conn) {
        Ok(data) => data,
        Err(e) => {
            state.class_data = None;
            return err(&req.id, "db_query_failed", format!("{e:#}"), None);
        }
    };

    let student_count = data.students.len();
    tracing::info!(path = %in_path, students = student_count, "workspace bundle imported");
    state.db = Some(conn);
    state.class_data = Some(data);
    ok(
        &req.id,
        json!({
            "ok": true,
            "workspacePath": workspace_path.to_string_lossy(),
            "bundleFormatDetected": import.bundle_format_detected,
            "studentCount": student_count,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportBundle" => Some(handle_backup_export_bundle(state, req)),
        "backup.importBundle" => Some(handle_backup_import_bundle(state, req)),
        _ => None,
    }
}
