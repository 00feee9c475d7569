// CLI commands for grading submissions
use anyhow::{Context, Result};
use arbiter_common::config::HarnessConfig;
use arbiter_common::types::{ExecutionResponse, GradingReport, Language, TestCase};
use arbiter_harness::{Harness, Judge0Client};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Real backend only
    Execute,
    /// Heuristic simulation, no network
    Simulate,
    /// Backend when healthy, simulation otherwise
    Auto,
}

/// Accepted layouts for the test case file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TestFile {
    List(Vec<TestCase>),
    #[serde(rename_all = "camelCase")]
    Wrapped { test_cases: Vec<TestCase> },
}

pub fn parse_test_cases(content: &str) -> Result<Vec<TestCase>> {
    let file: TestFile = serde_json::from_str(content).context("Failed to parse test cases")?;
    Ok(match file {
        TestFile::List(cases) => cases,
        TestFile::Wrapped { test_cases } => test_cases,
    })
}

fn build_harness() -> Result<Harness<Judge0Client>> {
    let config = HarnessConfig::from_env().context("Invalid harness configuration")?;
    Harness::from_config(&config)
}

/// Grade one source file; returns whether any test case passed
pub async fn run(source: &Path, language: &str, tests: &Path, mode: RunMode, json: bool) -> Result<bool> {
    let source_code = fs::read_to_string(source)
        .with_context(|| format!("Failed to read source file {}", source.display()))?;
    let content = fs::read_to_string(tests)
        .with_context(|| format!("Failed to read test file {}", tests.display()))?;
    let test_cases = parse_test_cases(&content)?;

    let harness = build_harness()?;

    if !json {
        println!("🚀 Grading {} ({}) against {} test case(s)", source.display(), language, test_cases.len());
    }

    let outcome = match mode {
        RunMode::Execute => harness
            .execute_code(&source_code, language, &test_cases)
            .await
            .map(GradingReport::Executed),
        RunMode::Simulate => harness
            .execute_code_fallback(&source_code, language, &test_cases)
            .map(GradingReport::Simulated),
        RunMode::Auto => harness.grade(&source_code, language, &test_cases).await,
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) if e.is_precondition() => {
            GradingReport::Executed(ExecutionResponse::rejected(test_cases.len(), e.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(report.response().success)
}

fn print_report(report: &GradingReport) {
    if let GradingReport::Simulated(simulated) = report {
        println!("\n⚠️  {}", simulated.notice);
    }

    let response = report.response();

    if let Some(error) = &response.compilation_error {
        println!("\n❌ Compilation failed:\n{}", error);
    }
    if let Some(error) = &response.runtime_error {
        println!("\n❌ Request rejected: {}", error);
    }

    println!();
    for (idx, result) in response.results.iter().enumerate() {
        let mark = if result.passed { "✅" } else { "❌" };
        println!("{} Test {:<3} {:<24} {}s", mark, idx + 1, result.status, result.execution_time);
        if !result.passed {
            println!("     expected: {}", result.expected);
            println!("     actual:   {}", result.actual);
            if let Some(error) = &result.error {
                println!("     error:    {}", error.lines().next().unwrap_or(""));
            }
        }
    }

    println!("{}", "─".repeat(60));
    println!("Passed {}/{}", response.total_passed, response.total_tests);
}

pub async fn health() -> Result<()> {
    let harness = build_harness()?;
    let status = harness.health_check().await;

    if status.available {
        println!("✅ Backend available: {}", status.details);
    } else {
        println!("❌ Backend unavailable: {}", status.details);
    }
    println!("   checked at {}", status.checked_at.to_rfc3339());
    Ok(())
}

pub async fn languages(remote: bool) -> Result<()> {
    let harness = build_harness()?;

    if remote {
        let catalog = harness
            .backend_languages()
            .await
            .context("Failed to fetch backend language catalog")?;
        println!("📋 Backend Languages:\n");
        println!("{:<6} {}", "ID", "NAME");
        println!("{}", "─".repeat(60));
        for language in &catalog {
            println!("{:<6} {}", language.id, language.name);
        }
        println!("\n✅ Total: {} language(s)", catalog.len());
        return Ok(());
    }

    let table = harness.languages();
    println!("📋 Configured Languages:\n");
    println!("{:<12} {:<10}", "LANGUAGE", "BACKEND ID");
    println!("{}", "─".repeat(24));
    for language in Language::ALL {
        println!("{:<12} {:<10}", language.to_string(), table.backend_id(language));
    }
    println!("\n✅ Total: {} language(s)", Language::ALL.len());
    Ok(())
}
