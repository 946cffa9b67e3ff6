use crate::model::{Assessment, ClassData, Grade, Student};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 20.0;
pub const DEFAULT_STRUGGLING_THRESHOLD: f64 = 10.0;

/// Coefficient applied when a grade names an assessment missing from the catalog.
pub const FALLBACK_COEFFICIENT: f64 = 1.0;

/// Why a grade edit left the class untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GradeRejection {
    #[error("grade is not a number")]
    Unparseable,
    #[error("grade must be between 0 and 20")]
    OutOfRange,
    #[error("student not found")]
    UnknownStudent,
}

impl GradeRejection {
    pub fn code(self) -> &'static str {
        match self {
            Self::Unparseable => "unparseable",
            Self::OutOfRange => "out_of_range",
            Self::UnknownStudent => "unknown_student",
        }
    }
}

/// Display rounding for averages: nearest hundredth.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Weighted average: sum(value * coefficient) / sum(coefficient).
/// A student without grades averages 0.
pub fn compute_student_average(student: &Student) -> f64 {
    let points: f64 = student.grades.iter().map(|g| g.value * g.coefficient).sum();
    let coefficients: f64 = student.grades.iter().map(|g| g.coefficient).sum();
    let denom = if coefficients > 0.0 { coefficients } else { 1.0 };
    points / denom
}

/// Unweighted mean of the grade values. Only the class-analysis report uses
/// this; dashboard figures go through `compute_student_average`.
pub fn simple_average(student: &Student) -> f64 {
    if student.grades.is_empty() {
        return 0.0;
    }
    let sum: f64 = student.grades.iter().map(|g| g.value).sum();
    sum / (student.grades.len() as f64)
}

/// Mean of each student's weighted average. Empty roster averages 0.
pub fn compute_class_average(data: &ClassData) -> f64 {
    if data.students.is_empty() {
        return 0.0;
    }
    let sum: f64 = data
        .students
        .iter()
        .map(|s| compute_student_average(s))
        .sum();
    sum / (data.students.len() as f64)
}

/// Students whose weighted average is strictly below `threshold`.
pub fn count_struggling_students(data: &ClassData, threshold: f64) -> usize {
    data.students
        .iter()
        .filter(|s| compute_student_average(s) < threshold)
        .count()
}

pub fn parse_grade_value(raw: &str) -> Result<f64, GradeRejection> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| GradeRejection::Unparseable)?;
    check_grade_value(value)
}

fn check_grade_value(value: f64) -> Result<f64, GradeRejection> {
    if !value.is_finite() {
        return Err(GradeRejection::Unparseable);
    }
    if !(MIN_GRADE..=MAX_GRADE).contains(&value) {
        return Err(GradeRejection::OutOfRange);
    }
    // "-0" is stored as 0.
    Ok(value + 0.0)
}

/// Writes one grade from raw text input. On `Err` the caller keeps `data`.
pub fn update_grade(
    data: &ClassData,
    student_id: &str,
    assessment_id: &str,
    raw: &str,
) -> Result<ClassData, GradeRejection> {
    let value = parse_grade_value(raw)?;
    update_grade_value(data, student_id, assessment_id, value)
}

/// Writes one grade. The coefficient is snapshotted from the catalog now;
/// later coefficient edits do not reach this grade.
pub fn update_grade_value(
    data: &ClassData,
    student_id: &str,
    assessment_id: &str,
    value: f64,
) -> Result<ClassData, GradeRejection> {
    let value = check_grade_value(value)?;
    let Some(pos) = data.students.iter().position(|s| s.id == student_id) else {
        return Err(GradeRejection::UnknownStudent);
    };

    let coefficient = data
        .assessment(assessment_id)
        .map(|a| a.coefficient)
        .unwrap_or(FALLBACK_COEFFICIENT);
    let grade = Grade {
        assessment_id: assessment_id.to_string(),
        value,
        coefficient,
    };

    let mut student = Student::clone(&data.students[pos]);
    match student
        .grades
        .iter_mut()
        .find(|g| g.assessment_id == assessment_id)
    {
        Some(existing) => *existing = grade,
        None => student.grades.push(grade),
    }

    let mut students = data.students.clone();
    students[pos] = Arc::new(student);
    Ok(ClassData {
        id: data.id.clone(),
        name: data.name.clone(),
        students,
        assessments: Arc::clone(&data.assessments),
    })
}

/// Permissive form of `update_grade`: rejected input returns `data` unchanged.
#[cfg(test)]
pub fn apply_grade(data: &ClassData, student_id: &str, assessment_id: &str, raw: &str) -> ClassData {
    update_grade(data, student_id, assessment_id, raw).unwrap_or_else(|_| data.clone())
}

/// Appends to the catalog. No grades are created for existing students.
pub fn add_assessment(data: &ClassData, assessment: Assessment) -> ClassData {
    let mut assessments = Vec::clone(&data.assessments);
    assessments.push(assessment);
    ClassData {
        id: data.id.clone(),
        name: data.name.clone(),
        students: data.students.clone(),
        assessments: Arc::new(assessments),
    }
}

pub fn remove_student(data: &ClassData, student_id: &str) -> ClassData {
    ClassData {
        id: data.id.clone(),
        name: data.name.clone(),
        students: data
            .students
            .iter()
            .filter(|s| s.id != student_id)
            .cloned()
            .collect(),
        assessments: Arc::clone(&data.assessments),
    }
}

pub fn enroll_student(data: &ClassData, student: Student) -> ClassData {
    let mut students = data.students.clone();
    students.push(Arc::new(student));
    ClassData {
        id: data.id.clone(),
        name: data.name.clone(),
        students,
        assessments: Arc::clone(&data.assessments),
    }
}

/// Roster ids are numeric strings; the next one is max + 1. When max is
/// `u64::MAX` the lowest unused id is taken instead.
pub fn next_student_id(data: &ClassData) -> String {
    let used: BTreeSet<u64> = data
        .students
        .iter()
        .filter_map(|s| s.id.trim().parse::<u64>().ok())
        .collect();
    let max = used.last().copied().unwrap_or(0);
    if let Some(next) = max.checked_add(1) {
        return next.to_string();
    }

    let mut candidate: u64 = 1;
    for &id in used.range(1..) {
        if id != candidate {
            break;
        }
        candidate = candidate.saturating_add(1);
    }
    candidate.to_string()
}

/// Roster number shown next to a name: the id padded to four digits.
pub fn matricule(student: &Student) -> String {
    format!("{:0>4}", student.id)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub coefficient: Option<f64>,
    pub max_score: Option<f64>,
}

/// Edits catalog fields only. Grades keep the coefficient they were written with.
pub fn update_assessment(
    data: &ClassData,
    assessment_id: &str,
    patch: &AssessmentPatch,
) -> Option<ClassData> {
    let pos = data.assessments.iter().position(|a| a.id == assessment_id)?;
    let mut assessments = Vec::clone(&data.assessments);
    let a = &mut assessments[pos];
    if let Some(title) = &patch.title {
        a.title = title.clone();
    }
    if let Some(date) = &patch.date {
        a.date = date.clone();
    }
    if let Some(c) = patch.coefficient {
        a.coefficient = c;
    }
    if let Some(m) = patch.max_score {
        a.max_score = m;
    }
    Some(ClassData {
        id: data.id.clone(),
        name: data.name.clone(),
        students: data.students.clone(),
        assessments: Arc::new(assessments),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStats {
    pub student_count: usize,
    pub average: f64,
    pub struggling_count: usize,
    pub threshold: f64,
}

pub fn class_stats(data: &ClassData, threshold: f64) -> ClassStats {
    ClassStats {
        student_count: data.students.len(),
        average: compute_class_average(data),
        struggling_count: count_struggling_students(data, threshold),
        threshold,
    }
}
