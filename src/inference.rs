//! External inference client with a graceful fallback chain.
//!
//! The primary path POSTs a completion request to the configured endpoint
//! with a bounded timeout. On any failure (non-200, timeout, malformed
//! body) it falls through, in order, to a local model-runner subprocess,
//! the same runner over alternate model-path candidates, and finally the
//! deterministic rule-based classifier and report templates. Every step is
//! non-fatal; a user-facing response is always produced.

use crate::config::InferenceConfig;
use crate::error::InsightError;
use crate::intent;
use crate::models::{MachineData, QueryIntent};
use crate::reports;
use serde_json::json;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    runner_command: Option<String>,
    model_candidates: Vec<String>,
    runner_timeout: Duration,
    candidate_timeout: Duration,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            runner_command: config.runner_command.clone(),
            model_candidates: config.model_candidates.clone(),
            runner_timeout: Duration::from_secs(config.runner_timeout_secs),
            candidate_timeout: Duration::from_secs(config.candidate_timeout_secs),
        }
    }

    /// Classify the query, preferring the external model, terminating at
    /// the rule-based classifier. Always yields an intent.
    pub async fn classify(&self, query: &str, machine: &str, data: &MachineData) -> QueryIntent {
        let prompt = analysis_prompt(query, machine, data);
        match self.complete(&prompt).await {
            Ok(text) => match extract_intent(&text) {
                Some(analysis) => analysis,
                None => {
                    warn!("model returned unparseable analysis, using rule-based classifier");
                    intent::classify(query)
                }
            },
            Err(err) => {
                debug!(%err, "classification fell back to rules");
                intent::classify(query)
            }
        }
    }

    /// Generate the narrative response, preferring the external model,
    /// terminating at the deterministic report templates.
    pub async fn compose(
        &self,
        query: &str,
        machine: &str,
        data: &MachineData,
        analysis: &QueryIntent,
    ) -> String {
        let prompt = response_prompt(query, machine, data, analysis);
        match self.complete(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                debug!(%err, "composition fell back to templates");
                reports::compose(query, machine, &data.summary)
            }
        }
    }

    /// Run the fallback chain for one prompt.
    async fn complete(&self, prompt: &str) -> Result<String, InsightError> {
        match self.request_completion(prompt).await {
            Ok(text) => return Ok(text),
            Err(err) => warn!(%err, "inference endpoint failed"),
        }

        if let Some(command) = &self.runner_command {
            match self
                .run_local_model(command, &self.model, prompt, self.runner_timeout)
                .await
            {
                Ok(text) => return Ok(text),
                Err(err) => warn!(%err, "local runner failed"),
            }

            for candidate in &self.model_candidates {
                if let Ok(text) = self
                    .run_local_model(command, candidate, prompt, self.candidate_timeout)
                    .await
                {
                    info!(model = %candidate, "used fallback model path");
                    return Ok(text);
                }
            }
        }

        Err(InsightError::ClassificationFailure(
            "all inference backends failed".to_string(),
        ))
    }

    async fn request_completion(&self, prompt: &str) -> Result<String, InsightError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({
                "prompt": prompt,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "model": self.model,
            }))
            .send()
            .await
            .map_err(|e| InsightError::ClassificationFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InsightError::ClassificationFailure(format!(
                "inference endpoint returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InsightError::ClassificationFailure(e.to_string()))?;

        body["choices"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                InsightError::ClassificationFailure("malformed completion payload".to_string())
            })
    }

    async fn run_local_model(
        &self,
        command: &str,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, InsightError> {
        let output = tokio::time::timeout(
            timeout,
            Command::new(command)
                .arg("run")
                .arg(model)
                .arg(prompt)
                .output(),
        )
        .await
        .map_err(|_| InsightError::ClassificationFailure("local runner timed out".to_string()))?
        .map_err(|e| InsightError::ClassificationFailure(e.to_string()))?;

        if !output.status.success() {
            return Err(InsightError::ClassificationFailure(format!(
                "local runner exited with {}",
                output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() || text.starts_with("ERROR:") {
            return Err(InsightError::ClassificationFailure(
                "local runner produced no usable output".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Pull the first JSON object out of free-form model output.
fn extract_intent(text: &str) -> Option<QueryIntent> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn analysis_prompt(query: &str, machine: &str, data: &MachineData) -> String {
    let context = if data.files.is_empty() {
        "No data available".to_string()
    } else {
        let parts: Vec<String> = data
            .files
            .iter()
            .map(|f| format!("{}: {} records", f.filename, f.records))
            .collect();
        format!("Files: {}", parts.join(", "))
    };

    format!(
        "Analyze this manufacturing data query and provide a structured response.\n\n\
         Machine: {machine}\n\
         Available data: {context}\n\n\
         User query: \"{query}\"\n\n\
         Respond with JSON:\n\
         {{\n\
           \"intent\": \"summary|comparison|trend|specific_metric|report\",\n\
           \"time_period\": \"specific dates or periods mentioned\",\n\
           \"metrics\": [\"list of specific metrics requested\"],\n\
           \"needs_chart\": true,\n\
           \"chart_types\": [\"bar\", \"line\", \"pie\", \"comparison\"],\n\
           \"analysis_type\": \"descriptive analysis needed\"\n\
         }}"
    )
}

fn response_prompt(query: &str, machine: &str, data: &MachineData, analysis: &QueryIntent) -> String {
    let summary = &data.summary;
    let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();

    format!(
        "You are a manufacturing data analyst. Generate a response to the user's query about machine {machine}.\n\n\
         User Query: \"{query}\"\n\n\
         Analysis Context: {analysis_json}\n\n\
         Data Summary:\n\
         Total Records: {}\n\
         Parts Produced: {:.0}\n\
         Parts Rejected: {:.0}\n\
         Average OEE: {:.2}%\n\
         Quality Rate: {:.2}%\n\
         Total Energy: {:.2} KwH\n\n\
         Provide a clear, professional response with specific numbers, key\n\
         performance indicators, and notable trends. Keep it concise.",
        summary.total_records,
        summary.total_parts_produced,
        summary.total_parts_rejected,
        summary.average_oee,
        summary.quality_rate,
        summary.total_energy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntentKind;

    #[test]
    fn test_extract_intent_from_fenced_output() {
        let text = "Here is the analysis:\n```json\n{\"intent\": \"trend\", \"needs_chart\": true, \"chart_types\": [\"line\"]}\n```";
        let analysis = extract_intent(text).unwrap();
        assert_eq!(analysis.intent, IntentKind::Trend);
        assert!(analysis.needs_chart);
        // Missing fields take defaults.
        assert!(analysis.metrics.is_empty());
    }

    #[test]
    fn test_extract_intent_rejects_garbage() {
        assert!(extract_intent("no json here").is_none());
        assert!(extract_intent("{\"intent\": \"no_such_intent\"}").is_none());
        assert!(extract_intent("}{").is_none());
    }

    #[test]
    fn test_extract_intent_requires_intent_field() {
        assert!(extract_intent("{\"needs_chart\": true}").is_none());
    }
}
