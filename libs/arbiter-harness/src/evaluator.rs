/// Result Normalizer / Classifier - Language-Agnostic Grading
///
/// **Core Responsibility:**
/// Decode a terminal backend record and decide pass/fail for one test case.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or polling
/// - Knows nothing about language templates
/// - Pure function: (terminal record, test case) → CodeExecutionResult
///
/// **Classification Rules:**
/// - Only the Accepted status can pass
/// - Every other status (wrong answer, time limit, compilation error,
///   runtime error, ...) fails regardless of output
///
/// **Normalization Rules (applied to actual and expected):**
/// - All whitespace removed, including internal whitespace: YES
/// - Case sensitivity: NO
/// - Numeric tolerance: NO
/// - Structural array comparison: NO (textual only)
use arbiter_common::types::{CodeExecutionResult, TestCase};
use base64::{engine::general_purpose, Engine as _};
use tracing::warn;

use crate::client::SubmissionRecord;

/// Status reported for test cases that could not be graded at all
pub const EXECUTION_ERROR_STATUS: &str = "Execution Error";

/// Shown as `actual` when the program printed nothing
pub const NO_OUTPUT: &str = "No output";

/// Normalize output for comparison
///
/// Strips every whitespace character and lowercases, so `[0, 1]` and
/// `[0,1]\n` compare equal. Idempotent.
pub fn normalize_output(output: &str) -> String {
    output
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decode one base64 stream of a backend record
///
/// Line breaks inside the encoding are ignored. A stream that is not valid
/// base64 is returned as-is.
pub fn decode_stream(encoded: Option<&str>) -> String {
    let Some(encoded) = encoded else {
        return String::new();
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    match general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(error = %e, "Backend stream is not base64, keeping raw text");
            encoded.to_string()
        }
    }
}

/// Decoded streams of a terminal record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedOutput {
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    pub message: String,
}

impl DecodedOutput {
    pub fn from_record(record: &SubmissionRecord) -> Self {
        Self {
            stdout: decode_stream(record.stdout.as_deref()),
            stderr: decode_stream(record.stderr.as_deref()),
            compile_output: decode_stream(record.compile_output.as_deref()),
            message: decode_stream(record.message.as_deref()),
        }
    }

    /// stdout if non-empty, else stderr if non-empty, else `No output`
    pub fn actual(&self) -> String {
        [&self.stdout, &self.stderr]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(NO_OUTPUT)
            .to_string()
    }

    /// First diagnostic worth surfacing: compile output, stderr, then backend message
    pub fn diagnostic(&self) -> Option<String> {
        [&self.compile_output, &self.stderr, &self.message]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Grade a single terminal record against its test case
///
/// `passed = accepted && normalize(actual) == normalize(expected)`
pub fn evaluate_test(record: &SubmissionRecord, test_case: &TestCase) -> CodeExecutionResult {
    let output = DecodedOutput::from_record(record);
    let actual = output.actual();
    let passed = record.status.is_accepted()
        && normalize_output(&actual) == normalize_output(&test_case.expected_output);

    CodeExecutionResult {
        passed,
        input: test_case.input.clone(),
        expected: test_case.expected_output.clone(),
        actual,
        execution_time: record.time.clone().unwrap_or_else(|| "0".to_string()),
        status: record.status.description.clone(),
        error: output.diagnostic(),
        memory: record.memory,
    }
}

/// Failing result for a test case that never produced a terminal record
pub fn execution_error(test_case: &TestCase, error: impl std::fmt::Display) -> CodeExecutionResult {
    CodeExecutionResult {
        passed: false,
        input: test_case.input.clone(),
        expected: test_case.expected_output.clone(),
        actual: String::new(),
        execution_time: "0".to_string(),
        status: EXECUTION_ERROR_STATUS.to_string(),
        error: Some(error.to_string()),
        memory: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BackendStatus;

    fn encode(s: &str) -> Option<String> {
        Some(general_purpose::STANDARD.encode(s))
    }

    fn make_record(status: (u32, &str), stdout: &str) -> SubmissionRecord {
        SubmissionRecord {
            stdout: encode(stdout),
            status: BackendStatus::new(status.0, status.1),
            time: Some("0.042".to_string()),
            memory: Some(3180),
            ..Default::default()
        }
    }

    fn make_test_case(expected_output: &str) -> TestCase {
        TestCase::new("1", "nums = [2,7,11,15], target = 9", expected_output)
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("  Hello  "), "hello");
        assert_eq!(normalize_output("[0, 1]\n"), "[0,1]");
        assert_eq!(normalize_output("line1\r\nLine2"), "line1line2");
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output(" \t\n"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["  A b\tC  ", "[0, 1]", "TRUE", "", "Error: division by zero"] {
            let once = normalize_output(s);
            assert_eq!(normalize_output(&once), once);
        }
    }

    #[test]
    fn test_decode_stream_with_line_breaks() {
        let encoded = general_purpose::STANDARD.encode("a fairly long line of output that wraps");
        let wrapped = format!("{}\n{}", &encoded[..20], &encoded[20..]);
        assert_eq!(decode_stream(Some(&wrapped)), "a fairly long line of output that wraps");
        assert_eq!(decode_stream(None), "");
        assert_eq!(decode_stream(Some("not base64!")), "not base64!");
    }

    #[test]
    fn test_accepted_with_spacing_difference_passes() {
        let result = evaluate_test(&make_record((3, "Accepted"), "[0, 1]\n"), &make_test_case("[0,1]"));
        assert!(result.passed);
        assert_eq!(result.actual, "[0, 1]");
        assert_eq!(result.status, "Accepted");
        assert_eq!(result.execution_time, "0.042");
        assert_eq!(result.memory, Some(3180));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_case_insensitive_match() {
        let result = evaluate_test(&make_record((3, "Accepted"), "True\n"), &make_test_case("true"));
        assert!(result.passed);
    }

    #[test]
    fn test_non_accepted_status_fails_even_when_output_matches() {
        let result = evaluate_test(&make_record((5, "Time Limit Exceeded"), "[0,1]"), &make_test_case("[0,1]"));
        assert!(!result.passed);
        assert_eq!(result.status, "Time Limit Exceeded");
    }

    #[test]
    fn test_mismatch_fails() {
        let result = evaluate_test(&make_record((3, "Accepted"), "[1,0]"), &make_test_case("[0,1]"));
        assert!(!result.passed);
    }

    #[test]
    fn test_no_numeric_tolerance() {
        let result = evaluate_test(&make_record((3, "Accepted"), "1.0"), &make_test_case("1"));
        assert!(!result.passed);
    }

    #[test]
    fn test_actual_falls_back_to_stderr_then_placeholder() {
        let mut record = make_record((11, "Runtime Error (NZEC)"), "");
        record.stderr = encode("Traceback: ZeroDivisionError\n");
        let result = evaluate_test(&record, &make_test_case("1"));
        assert_eq!(result.actual, "Traceback: ZeroDivisionError");
        assert_eq!(result.error.as_deref(), Some("Traceback: ZeroDivisionError"));
        assert!(!result.passed);

        let record = SubmissionRecord {
            status: BackendStatus::new(3, "Accepted"),
            ..Default::default()
        };
        let result = evaluate_test(&record, &make_test_case(""));
        assert_eq!(result.actual, NO_OUTPUT);
        assert_eq!(result.execution_time, "0");
        assert!(!result.passed);
    }

    #[test]
    fn test_compile_output_is_preferred_diagnostic() {
        let mut record = make_record((6, "Compilation Error"), "");
        record.compile_output = encode("Main.java:3: error: ';' expected");
        record.message = encode("Exited with error status 1");
        let result = evaluate_test(&record, &make_test_case("1"));
        assert_eq!(result.error.as_deref(), Some("Main.java:3: error: ';' expected"));
    }

    #[test]
    fn test_execution_error_result() {
        let result = execution_error(&make_test_case("[0,1]"), "poll timed out");
        assert!(!result.passed);
        assert_eq!(result.status, EXECUTION_ERROR_STATUS);
        assert_eq!(result.error.as_deref(), Some("poll timed out"));
        assert_eq!(result.expected, "[0,1]");
    }
}
