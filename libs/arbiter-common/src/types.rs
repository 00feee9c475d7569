use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages known to the execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    CSharp,
    Go,
    Rust,
    Ruby,
    Php,
    Kotlin,
    Swift,
}

impl Language {
    pub const ALL: [Language; 13] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::CSharp,
        Language::Go,
        Language::Rust,
        Language::Ruby,
        Language::Php,
        Language::Kotlin,
        Language::Swift,
    ];

    /// Resolve a user-facing language identifier, accepting common aliases
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" => Some(Language::Python),
            "javascript" | "js" | "node" | "nodejs" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "cpp" | "c++" | "cxx" => Some(Language::Cpp),
            "c" => Some(Language::C),
            "csharp" | "c#" | "cs" => Some(Language::CSharp),
            "go" | "golang" => Some(Language::Go),
            "rust" | "rs" => Some(Language::Rust),
            "ruby" | "rb" => Some(Language::Ruby),
            "php" => Some(Language::Php),
            "kotlin" | "kt" => Some(Language::Kotlin),
            "swift" => Some(Language::Swift),
            _ => None,
        }
    }

    /// Judge0 CE language id used when no override is configured
    pub fn default_backend_id(&self) -> u32 {
        match self {
            Language::Python => 71,
            Language::JavaScript => 63,
            Language::TypeScript => 74,
            Language::Java => 62,
            Language::Cpp => 54,
            Language::C => 50,
            Language::CSharp => 51,
            Language::Go => 60,
            Language::Rust => 73,
            Language::Ruby => 72,
            Language::Php => 68,
            Language::Kotlin => 78,
            Language::Swift => 83,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Python
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
        };
        write!(f, "{}", name)
    }
}

/// Declared type of a test case parameter, written as `int`, `string[]`, `int[][]`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Int,
    Long,
    Double,
    Bool,
    Str,
    Array(Box<ValueType>),
    Unknown,
}

impl ValueType {
    pub fn array_of(inner: ValueType) -> Self {
        ValueType::Array(Box::new(inner))
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(ValueType::array_of(inner.parse()?));
        }
        match s.to_lowercase().as_str() {
            "int" | "integer" => Ok(ValueType::Int),
            "long" => Ok(ValueType::Long),
            "double" | "float" | "number" => Ok(ValueType::Double),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "string" | "str" => Ok(ValueType::Str),
            "any" | "unknown" => Ok(ValueType::Unknown),
            other => Err(format!("unknown parameter type '{}'", other)),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Long => write!(f, "long"),
            ValueType::Double => write!(f, "double"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Str => write!(f, "string"),
            ValueType::Array(inner) => write!(f, "{}[]", inner),
            ValueType::Unknown => write!(f, "any"),
        }
    }
}

/// One typed argument of the entry point call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub literal_value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    /// Legacy `name = value, name = value` form, used when `parameters` is absent
    #[serde(default)]
    pub input: String,
    pub expected_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            expected_output: expected_output.into(),
            description: None,
            hidden: false,
            entry_point: None,
            parameters: None,
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// Outcome of running one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExecutionResult {
    pub passed: bool,
    pub input: String,
    pub expected: String,
    pub actual: String,
    /// Wall time in seconds, as reported by the backend
    pub execution_time: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Peak memory in KB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub success: bool,
    pub results: Vec<CodeExecutionResult>,
    pub total_passed: usize,
    pub total_tests: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compilation_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<String>,
}

impl ExecutionResponse {
    /// Build a response from per-test results; `success` is derived from the pass count
    pub fn from_results(results: Vec<CodeExecutionResult>, total_tests: usize) -> Self {
        let total_passed = results.iter().filter(|r| r.passed).count();
        Self {
            success: total_passed > 0,
            results,
            total_passed,
            total_tests,
            compilation_error: None,
            runtime_error: None,
        }
    }

    /// Response for a request that was refused before any test case ran
    pub fn rejected(total_tests: usize, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            total_passed: 0,
            total_tests,
            compilation_error: None,
            runtime_error: Some(reason.into()),
        }
    }
}

/// Heuristic grading produced without running the code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedExecutionResponse {
    #[serde(flatten)]
    pub response: ExecutionResponse,
    pub notice: String,
}

/// Grading outcome tagged with how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GradingReport {
    Executed(ExecutionResponse),
    Simulated(SimulatedExecutionResponse),
}

impl GradingReport {
    pub fn is_simulated(&self) -> bool {
        matches!(self, GradingReport::Simulated(_))
    }

    pub fn response(&self) -> &ExecutionResponse {
        match self {
            GradingReport::Executed(response) => response,
            GradingReport::Simulated(simulated) => &simulated.response,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub available: bool,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_count: Option<usize>,
    pub checked_at: DateTime<Utc>,
}
