use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::narrative::{NarrativeError, CLASS_ANALYSIS_FALLBACK, STUDENT_COMMENT_FALLBACK};
use serde_json::json;

fn unavailable(id: &str, fallback: &str) -> serde_json::Value {
    ok(
        id,
        json!({
            "text": fallback,
            "generated": false,
            "error": { "code": "unavailable", "message": "narrative client is not running" },
        }),
    )
}

/// Generator failures never surface as IPC errors; the caller gets the
/// fixed fallback text and the failure code.
fn narrative_response(
    id: &str,
    result: Result<String, NarrativeError>,
    fallback: &str,
) -> serde_json::Value {
    match result {
        Ok(text) => ok(id, json!({ "text": text, "generated": true })),
        Err(e) => {
            tracing::warn!(code = e.code(), "narrative generation failed: {e}");
            ok(
                id,
                json!({
                    "text": fallback,
                    "generated": false,
                    "error": { "code": e.code(), "message": e.to_string() },
                }),
            )
        }
    }
}

fn handle_student_comment(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = match helpers::required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(student) = data.student(&student_id) else {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        );
    };
    let (Some(rt), Some(client)) = (state.runtime.as_ref(), state.narrative.as_ref()) else {
        return unavailable(&req.id, STUDENT_COMMENT_FALLBACK);
    };

    let result = rt.block_on(client.student_comment(student, &data.assessments));
    narrative_response(&req.id, result, STUDENT_COMMENT_FALLBACK)
}

fn handle_class_analysis(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (Some(rt), Some(client)) = (state.runtime.as_ref(), state.narrative.as_ref()) else {
        return unavailable(&req.id, CLASS_ANALYSIS_FALLBACK);
    };

    let result = rt.block_on(client.class_analysis(data));
    narrative_response(&req.id, result, CLASS_ANALYSIS_FALLBACK)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "narrative.studentComment" => Some(handle_student_comment(state, req)),
        "narrative.classAnalysis" => Some(handle_class_analysis(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn failures_collapse_to_fallback_text() {
        let resp = narrative_response(
            "1",
            Err(NarrativeError::Timeout {
                timeout: Duration::from_secs(30),
            }),
            STUDENT_COMMENT_FALLBACK,
        );
        assert_eq!(resp["ok"], true);
        assert_eq!(resp["result"]["text"], STUDENT_COMMENT_FALLBACK);
        assert_eq!(resp["result"]["generated"], false);
        assert_eq!(resp["result"]["error"]["code"], "timeout");
    }

    #[test]
    fn generated_text_passes_through() {
        let resp = narrative_response("2", Ok("Bon trimestre.".into()), CLASS_ANALYSIS_FALLBACK);
        assert_eq!(resp["result"]["text"], "Bon trimestre.");
        assert_eq!(resp["result"]["generated"], true);
        assert!(resp["result"].get("error").is_none());
    }
}
