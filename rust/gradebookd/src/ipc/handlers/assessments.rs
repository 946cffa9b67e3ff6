use crate::calc::{self, AssessmentPatch, MAX_GRADE};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{self, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Assessment;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(v: &Value, key: &str) -> Result<String, HandlerErr> {
    let s = v
        .as_str()
        .map(str::trim)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key)))?;
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

fn parse_positive(v: &Value, key: &str) -> Result<f64, HandlerErr> {
    match v.as_f64() {
        Some(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(HandlerErr::bad_params(format!(
            "{} must be a number greater than 0",
            key
        ))),
    }
}

fn parse_title(v: &Value) -> Result<String, HandlerErr> {
    match v.as_str().map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(HandlerErr::bad_params("title must be a non-empty string")),
    }
}

fn parse_new_assessment(params: &Value) -> Result<Assessment, HandlerErr> {
    let title = parse_title(params.get("title").unwrap_or(&Value::Null))?;
    let date = match params.get("date").filter(|v| !v.is_null()) {
        Some(v) => parse_date(v, "date")?,
        None => chrono::Local::now()
            .date_naive()
            .format(DATE_FORMAT)
            .to_string(),
    };
    let Some(coefficient) = params.get("coefficient") else {
        return Err(HandlerErr::bad_params("missing coefficient"));
    };
    let coefficient = parse_positive(coefficient, "coefficient")?;
    let max_score = match params.get("maxScore").filter(|v| !v.is_null()) {
        Some(v) => parse_positive(v, "maxScore")?,
        None => MAX_GRADE,
    };

    Ok(Assessment {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        date,
        coefficient,
        max_score,
    })
}

fn parse_patch(patch: &Map<String, Value>) -> Result<AssessmentPatch, HandlerErr> {
    let mut out = AssessmentPatch::default();
    for (k, v) in patch {
        match k.as_str() {
            "title" => out.title = Some(parse_title(v)?),
            "date" => out.date = Some(parse_date(v, k)?),
            "coefficient" => out.coefficient = Some(parse_positive(v, k)?),
            "maxScore" => out.max_score = Some(parse_positive(v, k)?),
            _ => {
                return Err(HandlerErr::bad_params(format!(
                    "unknown assessment field: {}",
                    k
                )))
            }
        }
    }
    Ok(out)
}

fn handle_assessments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "assessments": data.assessments }))
}

fn handle_assessments_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assessment = match parse_new_assessment(&req.params) {
        Ok(a) => a,
        Err(e) => return e.response(&req.id),
    };

    let assessment_id = assessment.id.clone();
    let next = calc::add_assessment(data, assessment);
    let persisted = helpers::commit(state, next);
    tracing::info!(assessment_id = %assessment_id, "assessment created");

    ok(
        &req.id,
        json!({ "assessmentId": assessment_id, "persisted": persisted }),
    )
}

fn handle_assessments_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assessment_id = match helpers::required_str(req, "assessmentId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };
    let patch = match parse_patch(patch_obj) {
        Ok(p) => p,
        Err(e) => return e.response(&req.id),
    };

    let Some(next) = calc::update_assessment(data, &assessment_id, &patch) else {
        return err(
            &req.id,
            "not_found",
            "assessment not found",
            Some(json!({ "assessmentId": assessment_id })),
        );
    };
    let persisted = helpers::commit(state, next);
    ok(&req.id, json!({ "ok": true, "persisted": persisted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessments.list" => Some(handle_assessments_list(state, req)),
        "assessments.create" => Some(handle_assessments_create(state, req)),
        "assessments.update" => Some(handle_assessments_update(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_assessment_defaults_max_score_and_normalizes_date() {
        let a = parse_new_assessment(&json!({
            "title": " Devoir 1 ",
            "date": "2024-04-02",
            "coefficient": 3
        }))
        .unwrap_or_else(|e| panic!("{}", e.message));
        assert_eq!(a.title, "Devoir 1");
        assert_eq!(a.date, "2024-04-02");
        assert_eq!(a.coefficient, 3.0);
        assert_eq!(a.max_score, MAX_GRADE);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn new_assessment_rejects_bad_fields() {
        for params in [
            json!({ "title": "", "coefficient": 1 }),
            json!({ "title": "T" }),
            json!({ "title": "T", "coefficient": 0 }),
            json!({ "title": "T", "coefficient": 1, "date": "02/04/2024" }),
            json!({ "title": "T", "coefficient": 1, "maxScore": -5 }),
        ] {
            assert!(parse_new_assessment(&params).is_err(), "{params}");
        }
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let patch = json!({ "weight": 2 });
        assert!(parse_patch(patch.as_object().expect("object")).is_err());

        let patch = json!({ "coefficient": 4, "title": "Bilan" });
        let parsed = parse_patch(patch.as_object().expect("object"))
            .unwrap_or_else(|e| panic!("{}", e.message));
        assert_eq!(parsed.coefficient, Some(4.0));
        assert_eq!(parsed.title.as_deref(), Some("Bilan"));
    }
}
