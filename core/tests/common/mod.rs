use shush_core::api::{RunRequest, RunnerConfig};

pub fn sh(script: &str) -> RunRequest {
    RunRequest::new(vec!["sh".into(), "-c".into(), script.into()])
}

pub fn quiet_config() -> RunnerConfig {
    RunnerConfig {
        inherit_stdin: false,
        abort_grace_ms: 500,
        ..RunnerConfig::default()
    }
}
