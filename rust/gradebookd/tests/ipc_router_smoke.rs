mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn methods_require_a_workspace_until_one_is_selected() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
    assert!(health["workspacePath"].is_null());

    for (i, method) in [
        "class.get",
        "dashboard.get",
        "students.list",
        "assessments.list",
        "grades.sheet",
        "setup.get",
        "narrative.classAnalysis",
    ]
    .iter()
    .enumerate()
    {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("nows-{}", i),
            method,
            json!({}),
        );
        assert_eq!(error_code(&resp), Some("no_workspace"), "{}", method);
    }

    let _ = child.kill();
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("gradebook-router-smoke");
    let bundle_out = workspace.join("smoke-backup.zip");
    let csv_out = workspace.join("smoke-grades.csv");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["studentCount"], 50);

    let _ = request_ok(&mut stdin, &mut reader, "2", "class.get", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "3", "dashboard.get", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "5", "assessments.list", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "grades.update",
        json!({ "studentId": "1", "assessmentId": "a1", "value": "12" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "7", "grades.sheet", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "grades.exportCsv",
        json!({ "outPath": csv_out.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "9", "setup.get", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "setup.update",
        json!({ "section": "dashboard", "patch": { "chartStudentLimit": 5 } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "narrative.studentComment",
        json!({ "studentId": "1" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "backup.exportBundle",
        json!({ "outPath": bundle_out.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "backup.importBundle",
        json!({ "inPath": bundle_out.to_string_lossy() }),
    );

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unknown_methods_and_bad_json_get_error_responses() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{\"id\":\"x\",\"method\":\"grades.delete\"}}").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let resp: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(resp["id"], "x");
    assert_eq!(error_code(&resp), Some("not_implemented"));

    writeln!(stdin, "this is not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let resp: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(resp["ok"], false);
    assert_eq!(error_code(&resp), Some("bad_json"));

    // The loop keeps serving after a bad line.
    let _ = request_ok(&mut stdin, &mut reader, "after", "health", json!({}));

    let _ = child.kill();
}
