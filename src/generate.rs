//! Lesson plan generation with retry, backoff and fallback.
//!
//! [`LessonPlanner`] owns the attempt loop. It is constructed once at
//! startup with an explicit [`GenerationClient`] and shared by every
//! request; nothing inside it is mutated after construction, so concurrent
//! requests need no synchronisation.
//!
//! ## Loop
//!
//! ```text
//! prompt ──▶ attempt 1 ──ok──▶ Generated
//!               │ retryable
//!               ▼ sleep(delay)
//!            attempt 2 … attempt N
//!               │ exhausted / non-retryable
//!               ▼
//!            fallback template (or hard failure when disabled)
//! ```
//!
//! The only suspension point is the backoff sleep. If the request is
//! cancelled (client disconnect), dropping the future cancels both the
//! in-flight call and the sleep.

use crate::answers::AnswerSet;
use crate::config::GenerationConfig;
use crate::error::{GenerationError, PlannerError};
use crate::output::{GenerationResult, FALLBACK_NOTE};
use crate::pipeline::fallback::fallback_lesson_plan;
use crate::pipeline::llm::GenerationClient;
use crate::pipeline::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::prompts::build_lesson_prompt;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// The retry orchestrator.
pub struct LessonPlanner {
    client: Arc<dyn GenerationClient>,
    config: GenerationConfig,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for LessonPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonPlanner")
            .field("client", &"<dyn GenerationClient>")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

impl LessonPlanner {
    pub fn new(client: Arc<dyn GenerationClient>, config: GenerationConfig) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            client,
            config,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the suspension strategy used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Generate a lesson plan for the given PDF text and answers.
    ///
    /// # Returns
    /// `Ok(Generated)` on the first successful attempt. When generation
    /// fails (retries exhausted or a non-retryable error) and fallback is
    /// enabled, `Ok(Fallback)` with the number of attempts made.
    ///
    /// # Errors
    /// [`PlannerError::GenerationFailed`] only when fallback is disabled.
    pub async fn generate(
        &self,
        pdf_text: &str,
        answers: &AnswerSet,
    ) -> Result<GenerationResult, PlannerError> {
        let start = Instant::now();
        let prompt = build_lesson_prompt(pdf_text, answers);
        let max_attempts = self.policy.max_attempts;

        let mut attempt: u32 = 0;
        let last_err = loop {
            attempt += 1;
            info!("Attempt {} of {}", attempt, max_attempts);

            let err = match self.call_once(&prompt).await {
                Ok(lesson_plan) => {
                    info!(
                        "Lesson plan generated on attempt {} in {:?}",
                        attempt,
                        start.elapsed()
                    );
                    return Ok(GenerationResult::Generated { lesson_plan });
                }
                Err(e) => e,
            };
            warn!("Attempt {} failed: {}", attempt, err);

            if !err.is_retryable() {
                warn!("Non-retryable error, giving up after attempt {}", attempt);
                break err;
            }
            if attempt >= max_attempts {
                break err;
            }

            let delay = self.policy.delay_after(attempt, &err);
            warn!("Waiting {}ms before retry...", delay.as_millis());
            self.sleeper.sleep(delay).await;
        };

        if !self.config.fallback_enabled {
            error!(
                "Generation failed after {} attempt(s): {}",
                attempt, last_err
            );
            return Err(PlannerError::GenerationFailed {
                attempts: attempt,
                source: last_err,
            });
        }

        error!(
            "All retry attempts failed ({} made), providing fallback lesson plan",
            attempt
        );
        Ok(GenerationResult::Fallback {
            lesson_plan: fallback_lesson_plan(pdf_text, answers),
            note: FALLBACK_NOTE.to_string(),
            attempts: attempt,
        })
    }

    /// One generation call bounded by the per-call timeout.
    async fn call_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let timeout = Duration::from_millis(self.config.api_timeout_ms);
        match tokio::time::timeout(timeout, self.client.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout {
                elapsed_ms: self.config.api_timeout_ms,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed script of results, repeating the last one.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    /// Records requested waits and returns immediately.
    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    struct SlowClient;

    #[async_trait]
    impl GenerationClient for SlowClient {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".into())
        }
    }

    fn answers() -> AnswerSet {
        AnswerSet {
            grade: "4".into(),
            size: "22".into(),
            difficulty: "medium".into(),
            time: "60".into(),
            outcome: "Name the planets".into(),
        }
    }

    fn overloaded() -> Result<String, GenerationError> {
        Err(GenerationError::from_message(
            "[503 Service Unavailable] The model is overloaded",
        ))
    }

    fn build_planner(
        client: Arc<dyn GenerationClient>,
        config: GenerationConfig,
    ) -> (LessonPlanner, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let planner = LessonPlanner::new(client, config).with_sleeper(sleeper.clone());
        (planner, sleeper)
    }

    #[tokio::test]
    async fn first_success_returns_immediately() {
        let client = ScriptedClient::new(vec![Ok("# Generated".into())]);
        let (planner, sleeper) = build_planner(client.clone(), GenerationConfig::default());

        let result = planner.generate("Solar system", &answers()).await.unwrap();

        assert_eq!(
            result,
            GenerationResult::Generated {
                lesson_plan: "# Generated".into()
            }
        );
        assert_eq!(client.calls(), 1);
        assert!(sleeper.waits().is_empty());
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("Solar system"));
        assert!(prompts[0].contains("Name the planets"));
    }

    #[tokio::test]
    async fn succeeds_after_retryable_failures() {
        for n in 1..=5u32 {
            let mut script: Vec<_> = (1..n).map(|_| overloaded()).collect();
            script.push(Ok("# Plan".into()));
            let client = ScriptedClient::new(script);
            let (planner, sleeper) = build_planner(client.clone(), GenerationConfig::default());

            let result = planner.generate("text", &answers()).await.unwrap();

            assert_eq!(result.lesson_plan(), "# Plan", "n={n}");
            assert!(!result.is_fallback());
            assert_eq!(client.calls(), n);
            assert_eq!(sleeper.waits().len() as u32, n - 1, "n={n}");
        }
    }

    #[tokio::test]
    async fn exhaustion_falls_back_after_max_attempts() {
        let client = ScriptedClient::new(vec![overloaded()]);
        let (planner, sleeper) = build_planner(client.clone(), GenerationConfig::default());

        let result = planner.generate("Mercury Venus Earth", &answers()).await.unwrap();

        assert!(result.is_fallback());
        assert_eq!(result.attempts(), Some(5));
        assert_eq!(client.calls(), 5);
        let waits: Vec<u64> = sleeper.waits().iter().map(|d| d.as_secs()).collect();
        assert_eq!(waits, vec![10, 20, 40, 30]);
        assert!(result.lesson_plan().contains("Mercury Venus Earth"));
        match result {
            GenerationResult::Fallback { note, .. } => assert_eq!(note, FALLBACK_NOTE),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_retryable_error_aborts_without_waiting() {
        let client = ScriptedClient::new(vec![
            Err(GenerationError::from_message("[400 Bad Request] invalid argument")),
            Ok("never reached".into()),
        ]);
        let (planner, sleeper) = build_planner(client.clone(), GenerationConfig::default());

        let result = planner.generate("text", &answers()).await.unwrap();

        assert_eq!(client.calls(), 1);
        assert!(sleeper.waits().is_empty());
        assert_eq!(result.attempts(), Some(1));
    }

    #[tokio::test]
    async fn suggested_delay_drives_wait() {
        let client = ScriptedClient::new(vec![
            Err(GenerationError::from_message(
                r#"[429 Too Many Requests] {"retryDelay":"12s"}"#,
            )),
            Ok("# Plan".into()),
        ]);
        let (planner, sleeper) = build_planner(client, GenerationConfig::default());

        planner.generate("text", &answers()).await.unwrap();

        assert_eq!(sleeper.waits(), vec![Duration::from_secs(14)]);
    }

    #[tokio::test]
    async fn disabled_fallback_surfaces_hard_failure() {
        let config = GenerationConfig::builder()
            .max_attempts(3)
            .fallback_enabled(false)
            .build()
            .unwrap();
        let client = ScriptedClient::new(vec![overloaded()]);
        let (planner, sleeper) = build_planner(client, config);

        let err = planner.generate("text", &answers()).await.unwrap_err();

        match err {
            PlannerError::GenerationFailed { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.is_retryable());
            }
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[tokio::test]
    async fn slow_call_times_out_and_counts_as_retryable() {
        let config = GenerationConfig::builder()
            .max_attempts(2)
            .api_timeout_ms(20)
            .build()
            .unwrap();
        let (planner, sleeper) = build_planner(Arc::new(SlowClient), config);

        let result = planner.generate("text", &answers()).await.unwrap();

        assert!(result.is_fallback());
        assert_eq!(result.attempts(), Some(2));
        assert_eq!(sleeper.waits().len(), 1);
    }

    #[tokio::test]
    async fn single_attempt_config_never_sleeps() {
        let config = GenerationConfig::builder().max_attempts(1).build().unwrap();
        let client = ScriptedClient::new(vec![overloaded()]);
        let (planner, sleeper) = build_planner(client.clone(), config);

        let result = planner.generate("text", &answers()).await.unwrap();

        assert_eq!(result.attempts(), Some(1));
        assert_eq!(client.calls(), 1);
        assert!(sleeper.waits().is_empty());
    }
}
