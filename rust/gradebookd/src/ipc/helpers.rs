use crate::db;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::ClassData;
use rusqlite::Connection;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn no_workspace(req: &Request) -> serde_json::Value {
    err(&req.id, "no_workspace", "select a workspace first", None)
}

/// The open connection and current snapshot, or the `no_workspace` response.
pub fn workspace<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<(&'a Connection, &'a ClassData), serde_json::Value> {
    match (state.db.as_ref(), state.class_data.as_ref()) {
        (Some(conn), Some(data)) => Ok((conn, data)),
        _ => Err(no_workspace(req)),
    }
}

pub fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    match param_str(req, key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Swaps in the new snapshot, then saves it. A failed save is logged and
/// reported; the in-memory snapshot still advances.
pub fn commit(state: &mut AppState, next: ClassData) -> bool {
    let persisted = match state.db.as_ref() {
        Some(conn) => match db::save_class_data(conn, &next) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("failed to persist class data: {e:#}");
                false
            }
        },
        None => false,
    };
    state.class_data = Some(next);
    persisted
}
