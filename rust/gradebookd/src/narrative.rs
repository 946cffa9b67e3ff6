use crate::calc;
use crate::config::NarrativeConfig;
use crate::model::{Assessment, ClassData, Student};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const STUDENT_COMMENT_FALLBACK: &str = "Erreur lors de la génération de l'appréciation.";
pub const CLASS_ANALYSIS_FALLBACK: &str = "Impossible d'analyser la classe pour le moment.";
pub const NO_GRADES_TEXT: &str = "Aucune note saisie.";

/// Failure of a single generation call. Callers decide whether to fall back.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("no API key configured for the narrative service")]
    MissingApiKey,
    #[error("narrative service timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("failed to reach narrative service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("narrative service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode narrative response: {0}")]
    Decode(String),
    #[error("narrative service returned no text")]
    EmptyResponse,
}

impl NarrativeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::Timeout { .. } => "timeout",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "bad_status",
            Self::Decode(_) => "decode",
            Self::EmptyResponse => "empty_response",
        }
    }
}

/// "title: value/20 (Coeff c)" for each grade, in grade order.
pub fn student_grade_lines(student: &Student, assessments: &[Assessment]) -> Vec<String> {
    student
        .grades
        .iter()
        .map(|g| {
            let title = assessments
                .iter()
                .find(|a| a.id == g.assessment_id)
                .map(|a| a.title.as_str())
                .unwrap_or(g.assessment_id.as_str());
            format!("{}: {}/20 (Coeff {})", title, g.value, g.coefficient)
        })
        .collect()
}

pub fn student_comment_prompt(student: &Student, assessments: &[Assessment]) -> String {
    let grades = student_grade_lines(student, assessments).join(", ");
    let grades = if grades.is_empty() {
        NO_GRADES_TEXT.to_string()
    } else {
        grades
    };
    format!(
        "En tant que professeur principal d'un collège, rédige une appréciation trimestrielle concise et encourageante pour l'élève suivant :\n\
         Nom : {}\n\
         Notes : {}\n\n\
         L'appréciation doit être professionnelle, mettre en avant les points forts et suggérer des axes d'amélioration si nécessaire. Réponds en français.",
        student.full_name(),
        grades
    )
}

/// One line per student with the unweighted mean, as fed to the class report.
pub fn class_analysis_summary(data: &ClassData) -> String {
    data.students
        .iter()
        .map(|s| format!("{}: Moyenne {:.2}", s.full_name(), calc::simple_average(s)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn class_analysis_prompt(data: &ClassData) -> String {
    format!(
        "Analyse les performances globales de cette classe de collège :\n\
         {}\n\n\
         Identifie :\n\
         1. Le niveau global de la classe.\n\
         2. Les élèves en difficulté qui nécessitent un suivi particulier.\n\
         3. Des conseils pédagogiques pour améliorer les résultats du groupe.\n\n\
         Réponds sous forme de rapport structuré en français.",
        class_analysis_summary(data)
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn extract_text(body: &str) -> Result<String, NarrativeError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| NarrativeError::Decode(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(NarrativeError::EmptyResponse);
    }
    Ok(text)
}

pub struct NarrativeClient {
    http: reqwest::Client,
    config: NarrativeConfig,
}

impl NarrativeClient {
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(NarrativeError::Transport)?;
        Ok(Self { http, config })
    }

    /// One request/response round trip, bounded by the configured timeout.
    pub async fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(NarrativeError::MissingApiKey);
        };
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.send(api_key, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(NarrativeError::Timeout { timeout }),
        }
    }

    async fn send(&self, api_key: &str, prompt: &str) -> Result<String, NarrativeError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        );
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let timeout = self.config.timeout;
        let map_transport = |e: reqwest::Error| {
            if e.is_timeout() {
                NarrativeError::Timeout { timeout }
            } else {
                NarrativeError::Transport(e)
            }
        };

        tracing::debug!(model = %self.config.model, "calling narrative service");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;
        if !status.is_success() {
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        extract_text(&body)
    }

    pub async fn student_comment(
        &self,
        student: &Student,
        assessments: &[Assessment],
    ) -> Result<String, NarrativeError> {
        self.generate(&student_comment_prompt(student, assessments))
            .await
    }

    pub async fn class_analysis(&self, data: &ClassData) -> Result<String, NarrativeError> {
        self.generate(&class_analysis_prompt(data)).await
    }
}
