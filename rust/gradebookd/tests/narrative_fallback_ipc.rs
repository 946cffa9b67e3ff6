mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

const STUDENT_COMMENT_FALLBACK: &str = "Erreur lors de la génération de l'appréciation.";
const CLASS_ANALYSIS_FALLBACK: &str = "Impossible d'analyser la classe pour le moment.";

#[test]
fn unreachable_service_falls_back_to_fixed_text() {
    let workspace = temp_dir("gradebook-narrative");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let comment = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "narrative.studentComment",
        json!({ "studentId": "1" }),
    );
    assert_eq!(comment["text"], STUDENT_COMMENT_FALLBACK);
    assert_eq!(comment["generated"], false);
    let code = comment["error"]["code"].as_str().expect("error code");
    assert!(code == "transport" || code == "timeout", "{}", code);

    let analysis = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "narrative.classAnalysis",
        json!({}),
    );
    assert_eq!(analysis["text"], CLASS_ANALYSIS_FALLBACK);
    assert_eq!(analysis["generated"], false);

    let missing = request(
        &mut stdin,
        &mut reader,
        "4",
        "narrative.studentComment",
        json!({ "studentId": "404" }),
    );
    assert_eq!(error_code(&missing), Some("not_found"));

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}
