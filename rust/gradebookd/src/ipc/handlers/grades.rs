use crate::calc::{self, GradeRejection};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{self, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::ClassData;
use serde_json::{json, Value};
use std::path::PathBuf;

struct GradeInput {
    student_id: String,
    assessment_id: String,
    value: Value,
}

fn parse_grade_input(req: &Request) -> Result<GradeInput, HandlerErr> {
    let student_id = helpers::required_str(req, "studentId")?;
    let assessment_id = helpers::required_str(req, "assessmentId")?;
    let Some(value) = req.params.get("value") else {
        return Err(HandlerErr::bad_params("missing value"));
    };
    Ok(GradeInput {
        student_id,
        assessment_id,
        value: value.clone(),
    })
}

/// Text goes through the same parser as keyboard entry; numbers skip it.
fn write_grade(data: &ClassData, input: &GradeInput) -> Result<ClassData, GradeRejection> {
    match &input.value {
        Value::String(raw) => {
            calc::update_grade(data, &input.student_id, &input.assessment_id, raw)
        }
        Value::Number(n) => match n.as_f64() {
            Some(v) => {
                calc::update_grade_value(data, &input.student_id, &input.assessment_id, v)
            }
            None => Err(GradeRejection::Unparseable),
        },
        _ => Err(GradeRejection::Unparseable),
    }
}

fn handle_grades_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match parse_grade_input(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match write_grade(data, &input) {
        Ok(next) => {
            let average = next
                .student(&input.student_id)
                .map(|s| calc::round_off_2_decimals(calc::compute_student_average(s)));
            let persisted = helpers::commit(state, next);
            ok(
                &req.id,
                json!({ "applied": true, "average": average, "persisted": persisted }),
            )
        }
        Err(rejection) => {
            tracing::debug!(
                student_id = %input.student_id,
                assessment_id = %input.assessment_id,
                reason = rejection.code(),
                "grade rejected"
            );
            let average = data
                .student(&input.student_id)
                .map(|s| calc::round_off_2_decimals(calc::compute_student_average(s)));
            ok(
                &req.id,
                json!({
                    "applied": false,
                    "reason": rejection.code(),
                    "average": average,
                    "persisted": false,
                }),
            )
        }
    }
}

fn sheet_values(data: &ClassData) -> Vec<(String, String, Vec<Option<f64>>, f64)> {
    data.students
        .iter()
        .map(|s| {
            let values = data
                .assessments
                .iter()
                .map(|a| s.grade_for(&a.id).map(|g| g.value))
                .collect();
            (
                s.id.clone(),
                s.sheet_name(),
                values,
                calc::compute_student_average(s),
            )
        })
        .collect()
}

fn handle_grades_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let rows: Vec<Value> = sheet_values(data)
        .into_iter()
        .map(|(student_id, name, values, average)| {
            json!({
                "studentId": student_id,
                "name": name,
                "values": values,
                "average": calc::round_off_2_decimals(average),
            })
        })
        .collect();
    ok(
        &req.id,
        json!({ "assessments": data.assessments, "rows": rows }),
    )
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// One row per student, one column per assessment in catalog order.
fn grade_sheet_csv(data: &ClassData) -> String {
    let mut csv = String::from("student_id,student_name");
    for a in data.assessments.iter() {
        csv.push(',');
        csv.push_str(&csv_quote(&a.title));
    }
    csv.push_str(",average\n");

    for (student_id, name, values, average) in sheet_values(data) {
        csv.push_str(&csv_quote(&student_id));
        csv.push(',');
        csv.push_str(&csv_quote(&name));
        for v in values {
            csv.push(',');
            csv.push_str(&v.map(|v| v.to_string()).unwrap_or_default());
        }
        csv.push_str(&format!(",{:.2}\n", average));
    }
    csv
}

fn handle_grades_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, data) = match helpers::workspace(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };

    let csv = grade_sheet_csv(data);
    let rows_exported = data.students.len();

    let out = PathBuf::from(&out_path);
    if let Some(parent) = out.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": out_path })),
            );
        }
    }
    if let Err(e) = std::fs::write(&out, csv) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path })),
        );
    }

    tracing::info!(path = %out_path, rows = rows_exported, "grade sheet exported");
    ok(
        &req.id,
        json!({ "ok": true, "rowsExported": rows_exported, "path": out_path }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.update" => Some(handle_grades_update(state, req)),
        "grades.sheet" => Some(handle_grades_sheet(state, req)),
        "grades.exportCsv" => Some(handle_grades_export_csv(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assessment, Gender, Student};
    use std::sync::Arc;

    fn small_class() -> ClassData {
        ClassData {
            id: "c".into(),
            name: "C".into(),
            students: vec![
                Arc::new(Student::new("1", "Awa", "Bamba", Gender::F)),
                Arc::new(Student::new("2", "Jean", "Kouassi, Jr", Gender::M)),
            ],
            assessments: Arc::new(vec![
                Assessment {
                    id: "a1".into(),
                    title: "Interro".into(),
                    date: "2024-03-01".into(),
                    coefficient: 1.0,
                    max_score: 20.0,
                },
                Assessment {
                    id: "a2".into(),
                    title: "Compo \"finale\"".into(),
                    date: "2024-03-15".into(),
                    coefficient: 2.0,
                    max_score: 20.0,
                },
            ]),
        }
    }

    fn input(value: Value) -> GradeInput {
        GradeInput {
            student_id: "1".into(),
            assessment_id: "a1".into(),
            value,
        }
    }

    #[test]
    fn numbers_and_text_both_write() {
        let data = small_class();
        let next = write_grade(&data, &input(json!(14.5))).expect("number");
        assert_eq!(
            next.student("1").and_then(|s| s.grade_for("a1")).map(|g| g.value),
            Some(14.5)
        );
        let next = write_grade(&next, &input(json!(" 12 "))).expect("text");
        assert_eq!(
            next.student("1").and_then(|s| s.grade_for("a1")).map(|g| g.value),
            Some(12.0)
        );
    }

    #[test]
    fn other_json_types_are_unparseable() {
        let data = small_class();
        for v in [json!(null), json!(true), json!([12])] {
            assert_eq!(
                write_grade(&data, &input(v)).err(),
                Some(GradeRejection::Unparseable)
            );
        }
        assert_eq!(
            write_grade(&data, &input(json!(20.5))).err(),
            Some(GradeRejection::OutOfRange)
        );
    }

    #[test]
    fn csv_has_one_column_per_assessment() {
        let data = calc::update_grade(&small_class(), "1", "a2", "15").expect("grade");
        let csv = grade_sheet_csv(&data);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "student_id,student_name,Interro,\"Compo \"\"finale\"\"\",average"
        );
        assert_eq!(lines[1], "1,Bamba Awa,,15,15.00");
        assert_eq!(lines[2], "2,\"Kouassi, Jr Jean\",,,0.00");
        assert_eq!(lines.len(), 3);
    }
}
