//! The Stage Executor: `Execute(stage, RunState, chat_endpoint) → RunState`.

use std::time::Duration;

use pipeline_extraction::{parse_dev, parse_pm, parse_qa};
use pipeline_llm::{ChatBackend, ChatRequest, Message, TokenAccountant};
use pipeline_types::{DevOutput, PmOutput, QaOutput, RunState, StageFailureSubkind, StageName, StageTokens};

use crate::prompts;

const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Parameters shared by every stage invocation.
pub struct ExecutorConfig<'a> {
    pub backend: &'a dyn ChatBackend,
    pub accountant: &'a TokenAccountant,
    pub model: &'a str,
    pub temperature: f64,
    pub stage_timeout: Duration,
}

impl<'a> ExecutorConfig<'a> {
    #[must_use]
    pub fn new(backend: &'a dyn ChatBackend, accountant: &'a TokenAccountant, model: &'a str, temperature: f64) -> Self {
        Self { backend, accountant, model, temperature, stage_timeout: DEFAULT_STAGE_TIMEOUT }
    }
}

/// Execute the PM stage. No-ops (returns state unchanged) if state already
/// carries an error.
pub async fn execute_pm(mut state: RunState, cfg: &ExecutorConfig<'_>) -> RunState {
    if state.has_error() {
        return state;
    }
    let Some(issue) = state.issue().cloned() else {
        state.set_error("pm stage invoked before issue loaded");
        return state;
    };
    let messages = vec![Message::system(prompts::pm_system()), Message::user(prompts::pm_user(&issue))];

    match invoke(cfg, StageName::Pm, messages).await {
        Ok((usage, raw)) => {
            state.record_stage_tokens(StageTokens { stage: StageName::Pm, usage });
            let output = parse_pm(&raw).unwrap_or_else(|| {
                tracing::warn!(stage = "PM", "structured-output parse failed, using fallback record");
                PmOutput::fallback(&raw)
            });
            state.set_pm(output);
        }
        Err((subkind, message)) => {
            record_failure(&mut state, StageName::Pm, subkind, message);
        }
    }
    state
}

/// Execute the Dev stage.
pub async fn execute_dev(mut state: RunState, cfg: &ExecutorConfig<'_>) -> RunState {
    if state.has_error() {
        return state;
    }
    let (Some(issue), Some(pm)) = (state.issue().cloned(), state.pm().cloned()) else {
        state.set_error("dev stage invoked before pm completed");
        return state;
    };
    let messages = vec![Message::system(prompts::dev_system()), Message::user(prompts::dev_user(&issue, &pm))];

    match invoke(cfg, StageName::Dev, messages).await {
        Ok((usage, raw)) => {
            state.record_stage_tokens(StageTokens { stage: StageName::Dev, usage });
            let output = parse_dev(&raw).unwrap_or_else(|| {
                tracing::warn!(stage = "Dev", "structured-output parse failed, using fallback record");
                DevOutput::fallback(&raw)
            });
            state.set_dev(output);
        }
        Err((subkind, message)) => {
            record_failure(&mut state, StageName::Dev, subkind, message);
        }
    }
    state
}

/// Execute the QA stage.
pub async fn execute_qa(mut state: RunState, cfg: &ExecutorConfig<'_>) -> RunState {
    if state.has_error() {
        return state;
    }
    let (Some(issue), Some(pm), Some(dev)) = (state.issue().cloned(), state.pm().cloned(), state.dev().cloned()) else {
        state.set_error("qa stage invoked before dev completed");
        return state;
    };
    let messages = vec![Message::system(prompts::qa_system()), Message::user(prompts::qa_user(&issue, &pm, &dev))];

    match invoke(cfg, StageName::Qa, messages).await {
        Ok((usage, raw)) => {
            state.record_stage_tokens(StageTokens { stage: StageName::Qa, usage });
            let output = parse_qa(&raw).unwrap_or_else(|| {
                tracing::warn!(stage = "QA", "structured-output parse failed, using fallback record");
                QaOutput::fallback(&raw)
            });
            state.set_qa(output);
        }
        Err((subkind, message)) => {
            record_failure(&mut state, StageName::Qa, subkind, message);
        }
    }
    state
}

/// Invoke the chat endpoint under the stage deadline, returning extracted
/// token usage alongside the raw response text, or a failure subkind.
async fn invoke(
    cfg: &ExecutorConfig<'_>,
    stage: StageName,
    messages: Vec<Message>,
) -> Result<(pipeline_types::TokenUsage, String), (StageFailureSubkind, String)> {
    let request = ChatRequest::new(cfg.model, cfg.temperature, messages);
    let outcome = tokio::time::timeout(cfg.stage_timeout, cfg.backend.send(request)).await;

    match outcome {
        Ok(Ok(response)) => {
            let usage = cfg.accountant.extract(&response);
            Ok((usage, response.text))
        }
        Ok(Err(err)) => {
            tracing::error!(stage = %stage, error = %err, "chat endpoint call failed");
            Err((StageFailureSubkind::Transport, err.to_string()))
        }
        Err(_) => {
            tracing::error!(stage = %stage, timeout_secs = cfg.stage_timeout.as_secs(), "chat endpoint call timed out");
            Err((StageFailureSubkind::Timeout, format!("{stage} stage exceeded {}s deadline", cfg.stage_timeout.as_secs())))
        }
    }
}

fn record_failure(state: &mut RunState, stage: StageName, subkind: StageFailureSubkind, message: String) {
    let error = pipeline_types::PipelineError::StageFailed { stage, subkind, message };
    state.set_error(error.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pipeline_llm::{ChatResponse, LlmError, PricingTable, ProviderUsage};
    use pipeline_types::{Issue, IssueSource};

    struct StubBackend {
        response: String,
        usage: Option<ProviderUsage>,
        fail: bool,
    }

    #[async_trait]
    impl ChatBackend for StubBackend {
        async fn send(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
            if self.fail {
                return Err(LlmError::Transport { provider: "stub".to_string(), message: "stub failure".to_string() });
            }
            Ok(ChatResponse { text: self.response.clone(), usage: self.usage, model: "anthropic/claude-3-5-haiku-20241022".to_string() })
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn issue() -> Issue {
        Issue::new("x/y#1", "x/y", 1, "t", "", vec![], "https://x", IssueSource::Mock).unwrap()
    }

    fn state_with_issue() -> RunState {
        let mut state = RunState::new("run-1", Utc::now(), None);
        state.set_issue(issue());
        state
    }

    #[tokio::test]
    async fn pm_stage_parses_well_formed_response() {
        let backend = StubBackend {
            response: r#"{"summary":"s","acceptance_criteria":["a"],"plan":["p"],"assumptions":[]}"#.to_string(),
            usage: Some(ProviderUsage { input_tokens: 10, output_tokens: 20 }),
            fail: false,
        };
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let cfg = ExecutorConfig::new(&backend, &accountant, "anthropic/claude-3-5-haiku-20241022", 0.2);
        let state = execute_pm(state_with_issue(), &cfg).await;
        assert!(!state.has_error());
        assert_eq!(state.pm().unwrap().summary, "s");
        assert_eq!(state.stage_tokens().len(), 1);
    }

    #[tokio::test]
    async fn pm_stage_falls_back_on_unparsable_response() {
        let backend = StubBackend { response: "prose only, no json".to_string(), usage: None, fail: false };
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let cfg = ExecutorConfig::new(&backend, &accountant, "anthropic/claude-3-5-haiku-20241022", 0.2);
        let state = execute_pm(state_with_issue(), &cfg).await;
        assert!(!state.has_error());
        assert!(state.pm().unwrap().assumptions.contains(&pipeline_types::DEGRADED_OUTPUT_SENTINEL.to_string()));
        assert_eq!(state.stage_tokens().len(), 1, "token usage recorded even on parse failure");
    }

    #[tokio::test]
    async fn pm_stage_transport_failure_sets_stage_failed_error() {
        let backend = StubBackend { response: String::new(), usage: None, fail: true };
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let cfg = ExecutorConfig::new(&backend, &accountant, "anthropic/claude-3-5-haiku-20241022", 0.2);
        let state = execute_pm(state_with_issue(), &cfg).await;
        assert!(state.has_error());
        assert!(state.pm().is_none());
    }

    #[tokio::test]
    async fn dev_stage_is_noop_when_state_already_has_error() {
        let backend = StubBackend { response: "{}".to_string(), usage: None, fail: false };
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let cfg = ExecutorConfig::new(&backend, &accountant, "anthropic/claude-3-5-haiku-20241022", 0.2);
        let mut state = state_with_issue();
        state.set_error("stage PM failed (transport): stub failure");
        let state = execute_dev(state, &cfg).await;
        assert!(state.dev().is_none());
        assert_eq!(state.error(), Some("stage PM failed (transport): stub failure"));
    }

    #[tokio::test]
    async fn dev_stage_records_tokens_after_pm_completes() {
        let backend = StubBackend {
            response: r#"{"files":[],"notes":["n"]}"#.to_string(),
            usage: Some(ProviderUsage { input_tokens: 5, output_tokens: 5 }),
            fail: false,
        };
        let accountant = TokenAccountant::new(PricingTable::default(), 200_000);
        let cfg = ExecutorConfig::new(&backend, &accountant, "anthropic/claude-3-5-haiku-20241022", 0.2);
        let mut state = state_with_issue();
        state.set_pm(PmOutput::fallback("x"));
        let state = execute_dev(state, &cfg).await;
        assert!(state.dev().is_some());
        assert_eq!(state.stage_tokens().len(), 1);
    }
}
