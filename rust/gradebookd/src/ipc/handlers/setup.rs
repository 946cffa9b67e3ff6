use crate::calc::{DEFAULT_STRUGGLING_THRESHOLD, MAX_GRADE, MIN_GRADE};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};

pub const DEFAULT_CHART_STUDENT_LIMIT: usize = 10;

#[derive(Clone, Copy)]
enum SetupSection {
    Dashboard,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Dashboard => "setup.dashboard",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Dashboard => json!({
            "strugglingThreshold": DEFAULT_STRUGGLING_THRESHOLD,
            "chartStudentLimit": DEFAULT_CHART_STUDENT_LIMIT
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_f64_range(v: &Value, key: &str, min: f64, max: f64) -> Result<f64, String> {
    let n = v
        .as_f64()
        .ok_or_else(|| format!("{} must be a number", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Dashboard => match k.as_str() {
                "strugglingThreshold" => {
                    let t = parse_f64_range(v, k, MIN_GRADE, MAX_GRADE)?;
                    obj.insert(k.clone(), Value::from(t));
                }
                "chartStudentLimit" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 200)?));
                }
                _ => return Err(format!("unknown dashboard field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &rusqlite::Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Stale fields from older builds are skipped, not fatal.
            let _ = merge_section_patch(section, &mut current, saved_obj);
        }
    }
    Ok(current)
}

/// Dashboard knobs read by the dashboard and roster views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSettings {
    pub struggling_threshold: f64,
    pub chart_student_limit: usize,
}

pub fn dashboard_settings(conn: &rusqlite::Connection) -> anyhow::Result<DashboardSettings> {
    let section = load_section(conn, SetupSection::Dashboard)?;
    Ok(DashboardSettings {
        struggling_threshold: section
            .get("strugglingThreshold")
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_STRUGGLING_THRESHOLD),
        chart_student_limit: section
            .get("chartStudentLimit")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_CHART_STUDENT_LIMIT),
    })
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return helpers::no_workspace(req);
    };
    let dashboard = match load_section(conn, SetupSection::Dashboard) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "dashboard": dashboard }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return helpers::no_workspace(req);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_query_failed", e.to_string(), None);
    }
    tracing::info!(section = section_raw, "setup updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
