use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_class_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match serde_json::to_value(data) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_dashboard_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let settings = match setup::dashboard_settings(conn) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let stats = calc::class_stats(data, settings.struggling_threshold);
    let chart: Vec<serde_json::Value> = data
        .students
        .iter()
        .take(settings.chart_student_limit)
        .map(|s| {
            let average = calc::compute_student_average(s);
            json!({
                "studentId": s.id,
                "name": s.full_name(),
                "average": calc::round_off_2_decimals(average),
                "simpleAverage": calc::round_off_2_decimals(calc::simple_average(s)),
                "struggling": average < settings.struggling_threshold,
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "studentCount": stats.student_count,
            "average": calc::round_off_2_decimals(stats.average),
            "strugglingCount": stats.struggling_count,
            "threshold": stats.threshold,
            "chart": chart,
            "assessments": data.assessments.len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "class.get" => Some(handle_class_get(state, req)),
        "dashboard.get" => Some(handle_dashboard_get(state, req)),
        _ => None,
    }
}
