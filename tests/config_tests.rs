//! Tests for layered configuration loading.

use std::io::Write;

use askdesk::config::AgentConfig;
use askdesk::error::AgentError;
use askdesk::models::LanguageModel;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        r#"
        model = "openai:gpt-4o-mini"
        system_prompt = "Answer in one word."
        max_iterations = 6
        run_deadline_secs = 30

        [retry]
        max_attempts = 5

        [generation]
        temperature = 0.0

        [search.arxiv]
        top_k = 4
        base_url = "http://localhost:9999/api/query"

        [server]
        bind = "0.0.0.0:8080"
        "#,
    );

    let config = AgentConfig::from_file(file.path()).unwrap();

    assert_eq!(
        config.language_model().unwrap(),
        LanguageModel::OpenAi("gpt-4o-mini".into())
    );
    assert_eq!(config.system_prompt(), Some("Answer in one word."));
    assert_eq!(config.max_iterations, 6);
    assert_eq!(config.run_deadline().as_secs(), 30);
    assert_eq!(config.tool_timeout().as_secs(), 30);
    assert_eq!(config.retry_policy().max_attempts, 5);
    assert_eq!(config.generation_settings().temperature, Some(0.0));
    assert_eq!(config.search.arxiv.top_k, 4);
    assert_eq!(config.search.arxiv.max_chars, 500);
    assert_eq!(
        config.search.arxiv.base_url.as_deref(),
        Some("http://localhost:9999/api/query")
    );
    assert_eq!(config.server.bind, "0.0.0.0:8080");
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let file = write_config("max_iterations = \"ten\"");
    let err = AgentConfig::from_file(file.path()).unwrap_err();
    match err {
        AgentError::Configuration(msg) => assert!(msg.contains("ten"), "{msg}"),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        AgentConfig::load(Some(&path)),
        Err(AgentError::Configuration(_))
    ));
}

#[test]
fn bad_model_selector_fails_validation() {
    let file = write_config(r#"model = "mystery:model-1""#);
    let config = AgentConfig::from_file(file.path()).unwrap();
    assert!(matches!(config.validate(), Err(AgentError::Configuration(_))));
}

#[test]
fn env_overlay_sets_credentials_and_base_urls() {
    let mut config = AgentConfig::default();
    config.apply_env(|name| match name {
        "GROQ_API_KEY" => Some("gsk-test".into()),
        "GROQ_BASE_URL" => Some("http://127.0.0.1:1/openai/v1".into()),
        "TAVILY_API_KEY" => Some("tvly-test".into()),
        "ASKDESK_BIND" => Some("127.0.0.1:0".into()),
        _ => None,
    });
    assert_eq!(config.api_key("groq").as_deref(), Some("gsk-test"));
    assert_eq!(config.api_key("tavily").as_deref(), Some("tvly-test"));
    assert_eq!(
        config.base_url("groq").as_deref(),
        Some("http://127.0.0.1:1/openai/v1")
    );
    assert_eq!(config.server.bind, "127.0.0.1:0");
}

#[test]
fn invalid_iteration_override_is_ignored() {
    let mut config = AgentConfig::default();
    config.apply_env(|name| (name == "ASKDESK_MAX_ITERATIONS").then(|| "many".to_string()));
    assert_eq!(config.max_iterations, 10);
}
