use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup;
use crate::ipc::helpers::{self, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{Gender, Student};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let threshold = match setup::dashboard_settings(conn) {
        Ok(s) => s.struggling_threshold,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let students: Vec<serde_json::Value> = data
        .students
        .iter()
        .map(|s| {
            let average = calc::compute_student_average(s);
            json!({
                "id": s.id,
                "matricule": calc::matricule(s),
                "firstName": s.first_name,
                "lastName": s.last_name,
                "gender": s.gender.as_str(),
                "average": calc::round_off_2_decimals(average),
                "gradeCount": s.grades.len(),
                "struggling": average < threshold,
            })
        })
        .collect();
    ok(&req.id, json!({ "students": students }))
}

struct NewStudent {
    first_name: String,
    last_name: String,
    gender: Gender,
}

fn parse_new_student(req: &Request) -> Result<NewStudent, HandlerErr> {
    let first_name = helpers::required_str(req, "firstName")?;
    let last_name = helpers::required_str(req, "lastName")?;
    let gender_raw = helpers::required_str(req, "gender")?;
    let Some(gender) = Gender::parse(&gender_raw) else {
        return Err(HandlerErr::bad_params("gender must be M or F"));
    };
    Ok(NewStudent {
        first_name,
        last_name,
        gender,
    })
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let new = match parse_new_student(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let student_id = calc::next_student_id(data);
    let student = Student::new(
        student_id.clone(),
        &new.first_name,
        &new.last_name,
        new.gender,
    );
    let next = calc::enroll_student(data, student);
    let persisted = helpers::commit(state, next);
    tracing::info!(student_id = %student_id, "student enrolled");

    ok(
        &req.id,
        json!({ "studentId": student_id, "persisted": persisted }),
    )
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = match helpers::required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    if data.student(&student_id).is_none() {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        );
    }

    let next = calc::remove_student(data, &student_id);
    let persisted = helpers::commit(state, next);
    tracing::info!(student_id = %student_id, "student removed");

    ok(&req.id, json!({ "ok": true, "persisted": persisted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
