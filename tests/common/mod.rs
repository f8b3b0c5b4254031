use machine_insight::charts::NullChartGenerator;
use machine_insight::config::{InferenceConfig, SourcesConfig};
use machine_insight::inference::InferenceClient;
use machine_insight::sources::files::FileStore;
use machine_insight::InsightEngine;
use std::fs;
use std::path::Path;

/// Write one CSV export under `<data_dir>/<machine>/<filename>`.
pub fn write_machine_csv(data_dir: &Path, machine: &str, filename: &str, content: &str) {
    let machine_dir = data_dir.join(machine);
    fs::create_dir_all(&machine_dir).unwrap();
    fs::write(machine_dir.join(filename), content).unwrap();
}

/// An inference configuration whose every backend fails fast, so tests
/// always exercise the deterministic fallbacks.
pub fn offline_inference() -> InferenceConfig {
    InferenceConfig {
        endpoint: "http://127.0.0.1:9/v1/completions".to_string(),
        timeout_secs: 1,
        runner_command: None,
        model_candidates: Vec::new(),
        ..InferenceConfig::default()
    }
}

/// Engine over a file backend rooted at `data_dir`, with inference offline
/// and no chart backend.
pub fn offline_engine(data_dir: &Path) -> InsightEngine {
    let sources = SourcesConfig {
        backend: "files".to_string(),
        data_dir: data_dir.to_path_buf(),
    };
    InsightEngine::new(
        Box::new(FileStore::new(&sources)),
        InferenceClient::new(&offline_inference()),
        Box::new(NullChartGenerator),
    )
}
