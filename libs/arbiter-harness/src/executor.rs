/// Harness - High-Level Orchestration
///
/// **Responsibility:**
/// Run every test case of one submission through the pipeline and
/// aggregate the final `ExecutionResponse`.
///
/// **Architecture:**
/// 1. Synthesizer builds a runnable program per test case (synthesizer.rs)
/// 2. Backend accepts it and returns a token (client.rs)
/// 3. Poller waits for a terminal record (poller.rs)
/// 4. Evaluator grades the record (evaluator.rs)
///
/// Test cases run strictly in order, one at a time. The backend quota is
/// per credential and the compile-error short-circuit needs the first
/// outcome before anything else is decided.
use arbiter_common::config::{HarnessConfig, PollPolicy};
use arbiter_common::types::{
    ExecutionResponse, GradingReport, HealthStatus, SimulatedExecutionResponse, TestCase,
};
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::client::{BackendLanguage, ExecutionBackend, Judge0Client, SubmissionRecord};
use crate::error::{HarnessError, Result};
use crate::evaluator::{self, DecodedOutput};
use crate::fallback::FallbackExecutor;
use crate::language_config::LanguageConfigManager;
use crate::poller;
use crate::synthesizer::{self, SynthesizedProgram};

pub struct Harness<B> {
    backend: B,
    languages: LanguageConfigManager,
    poll: PollPolicy,
    batch_deadline: Option<Duration>,
    fallback: FallbackExecutor,
}

impl Harness<Judge0Client> {
    /// Production wiring: Judge0 client plus optional languages.json overrides
    pub fn from_config(config: &HarnessConfig) -> anyhow::Result<Self> {
        let client = Judge0Client::new(config)?;
        let languages = LanguageConfigManager::load_or_builtin(config.languages_file.as_deref())?;
        Ok(Harness::new(client)
            .with_languages(languages)
            .with_poll_policy(config.poll)
            .with_batch_deadline(config.batch_deadline))
    }
}

impl<B: ExecutionBackend> Harness<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            languages: LanguageConfigManager::builtin(),
            poll: PollPolicy::default(),
            batch_deadline: None,
            fallback: FallbackExecutor::new(),
        }
    }

    pub fn with_languages(mut self, languages: LanguageConfigManager) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_batch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.batch_deadline = deadline;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackExecutor) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn languages(&self) -> &LanguageConfigManager {
        &self.languages
    }

    /// Grade `source_code` against every test case on the real backend.
    ///
    /// Fails without touching the network when the source is blank, the
    /// test case list is empty, or the backend has no credential. Every
    /// other failure is scoped to its test case and recorded as an
    /// `Execution Error` result.
    #[instrument(skip(self, source_code, test_cases), fields(test_count = test_cases.len()))]
    pub async fn execute_code(
        &self,
        source_code: &str,
        language: &str,
        test_cases: &[TestCase],
    ) -> Result<ExecutionResponse> {
        validate_input(source_code, test_cases)?;
        self.backend.ensure_ready()?;

        let resolved = self.languages.resolve(language);
        let total_tests = test_cases.len();
        let started = Instant::now();

        info!(
            language = %resolved.language,
            backend_id = resolved.backend_id,
            source_size = source_code.len(),
            "Starting submission"
        );

        let mut results = Vec::with_capacity(total_tests);

        for (idx, test_case) in test_cases.iter().enumerate() {
            let remaining = self
                .batch_deadline
                .map(|deadline| deadline.saturating_sub(started.elapsed()));
            if remaining == Some(Duration::ZERO) {
                let deadline = self.batch_deadline.unwrap_or_default();
                warn!(test_num = idx + 1, "Batch deadline reached; test case not started");
                results.push(evaluator::execution_error(test_case, HarnessError::BatchDeadline(deadline)));
                continue;
            }

            let program = synthesizer::synthesize(source_code, resolved.language, test_case);
            debug!(
                test_num = idx + 1,
                test_id = %test_case.id,
                entry_point = program.entry_point.as_deref().unwrap_or("<raw>"),
                "Executing test case"
            );

            let outcome = match remaining {
                Some(remaining) => tokio::time::timeout(remaining, self.run_program(&program, resolved.backend_id))
                    .await
                    .unwrap_or_else(|_| Err(HarnessError::BatchDeadline(self.batch_deadline.unwrap_or_default()))),
                None => self.run_program(&program, resolved.backend_id).await,
            };

            let record = match outcome {
                Ok(record) => record,
                Err(e) => {
                    warn!(test_num = idx + 1, test_id = %test_case.id, error = %e, "Test case could not be executed");
                    results.push(evaluator::execution_error(test_case, &e));
                    continue;
                }
            };

            let result = evaluator::evaluate_test(&record, test_case);

            // A compilation failure belongs to the submission, not the test case
            if idx == 0 && record.status.is_compilation_error() {
                let diagnostic = DecodedOutput::from_record(&record)
                    .diagnostic()
                    .unwrap_or_else(|| "Compilation failed".to_string());
                warn!(
                    skipped = total_tests - 1,
                    error_preview = diagnostic.lines().next().unwrap_or(""),
                    "Compilation failed; remaining test cases skipped"
                );
                return Ok(ExecutionResponse {
                    success: false,
                    results: vec![result],
                    total_passed: 0,
                    total_tests,
                    compilation_error: Some(diagnostic),
                    runtime_error: None,
                });
            }

            debug!(
                test_num = idx + 1,
                status = %result.status,
                passed = result.passed,
                execution_time = %result.execution_time,
                "Test result"
            );
            results.push(result);
        }

        let response = ExecutionResponse::from_results(results, total_tests);
        info!(
            total_passed = response.total_passed,
            total_tests = response.total_tests,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Submission graded"
        );
        Ok(response)
    }

    /// Simulated grading for when the backend is unavailable
    pub fn execute_code_fallback(
        &self,
        source_code: &str,
        language: &str,
        test_cases: &[TestCase],
    ) -> Result<SimulatedExecutionResponse> {
        self.fallback.execute(source_code, language, test_cases)
    }

    /// Probe the language catalog to decide between real and simulated grading
    pub async fn health_check(&self) -> HealthStatus {
        let checked_at = Utc::now();
        if let Err(e) = self.backend.ensure_ready() {
            return HealthStatus {
                available: false,
                details: e.to_string(),
                language_count: None,
                checked_at,
            };
        }

        match self.backend.languages().await {
            Ok(languages) if !languages.is_empty() => HealthStatus {
                available: true,
                details: format!("{} languages available", languages.len()),
                language_count: Some(languages.len()),
                checked_at,
            },
            Ok(_) => HealthStatus {
                available: false,
                details: "backend returned an empty language catalog".to_string(),
                language_count: Some(0),
                checked_at,
            },
            Err(e) => {
                warn!(error = %e, "Backend health check failed");
                HealthStatus {
                    available: false,
                    details: e.to_string(),
                    language_count: None,
                    checked_at,
                }
            }
        }
    }

    /// Health-checked grading: real execution when possible, labelled simulation otherwise
    pub async fn grade(
        &self,
        source_code: &str,
        language: &str,
        test_cases: &[TestCase],
    ) -> Result<GradingReport> {
        validate_input(source_code, test_cases)?;

        let health = self.health_check().await;
        if health.available {
            let response = self.execute_code(source_code, language, test_cases).await?;
            return Ok(GradingReport::Executed(response));
        }

        warn!(details = %health.details, "Backend unavailable, grading is simulated");
        let simulated = self.execute_code_fallback(source_code, language, test_cases)?;
        Ok(GradingReport::Simulated(simulated))
    }

    pub async fn backend_languages(&self) -> Result<Vec<BackendLanguage>> {
        self.backend.ensure_ready()?;
        self.backend.languages().await
    }

    async fn run_program(&self, program: &SynthesizedProgram, backend_id: u32) -> Result<SubmissionRecord> {
        let token = self
            .backend
            .submit(&program.source, backend_id, program.stdin.as_deref())
            .await?;
        poller::await_result(&self.backend, &token, &self.poll).await
    }
}

fn validate_input(source_code: &str, test_cases: &[TestCase]) -> Result<()> {
    if source_code.trim().is_empty() {
        return Err(HarnessError::Input("source code is empty".to_string()));
    }
    if test_cases.is_empty() {
        return Err(HarnessError::Input("no test cases supplied".to_string()));
    }
    Ok(())
}
