/// Code Synthesizer - Bare Function → Runnable Program
///
/// **Core Responsibility:**
/// Turn a candidate's function plus one test case into a self-contained
/// program that needs no stdin and prints exactly one canonical line.
///
/// **Canonical Output:**
/// - Arrays/lists print as compact JSON: `[0,1]`, `["a","b"]`
/// - Booleans print lowercase: `true` / `false`; null prints `null`
/// - Doubles print the shortest text that round-trips, keeping a `.0`
/// - Everything else prints its natural text form
/// - Any exception prints `Error: <message>` instead
///
/// **Templates:**
/// Python, JavaScript, Java and C++ have templates. Any other language runs
/// the raw source unmodified with the test input piped to stdin.
///
/// Pure and synchronous: no I/O, no state between calls.
use arbiter_common::types::{Language, TestCase, ValueType};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

/// Entry point assumed when none is declared and none can be found
pub const DEFAULT_ENTRY_POINT: &str = "solution";

lazy_static! {
    static ref PYTHON_DEF: Regex = Regex::new(r"(?m)^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").unwrap();
    static ref JS_FUNCTION: Regex = Regex::new(r"function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(").unwrap();
    static ref JS_BOUND_FUNCTION: Regex = Regex::new(
        r"(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)"
    )
    .unwrap();
    static ref JS_METHOD: Regex =
        Regex::new(r"(?m)^\s*(?:async\s+)?(?:static\s+)?([A-Za-z_$][\w$]*)\s*\([^()]*\)\s*\{").unwrap();
    static ref C_FAMILY_METHOD: Regex = Regex::new(
        r"([A-Za-z_]\w*)\s*\([^()]*\)\s*(?:const\s*)?(?:noexcept\s*)?(?:throws\s+[\w.,\s]+?)?\{"
    )
    .unwrap();
    static ref CLASS_DECL: Regex = Regex::new(r"\bclass\s+([A-Za-z_]\w*)").unwrap();
    static ref SOLUTION_CLASS: Regex = Regex::new(r"\bclass\s+Solution\b").unwrap();
    static ref JAVA_PUBLIC_CLASS: Regex =
        Regex::new(r"\bpublic\s+((?:final\s+|abstract\s+)*)class\b").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
}

const C_FAMILY_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "sizeof", "main", "else", "do", "new",
    "delete", "synchronized", "try",
];
const JS_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "function", "constructor", "return"];

/// A program ready for submission
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedProgram {
    pub source: String,
    pub stdin: Option<String>,
    /// Function invoked by the harness; `None` when the raw source runs as-is
    pub entry_point: Option<String>,
}

/// One argument of the entry point call
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Literal,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Json(Value),
    /// Text we could not parse; emitted verbatim
    Raw(String),
}

pub fn has_template(language: Language) -> bool {
    matches!(
        language,
        Language::Python | Language::JavaScript | Language::Java | Language::Cpp
    )
}

/// Build the program that runs `source` against `test_case`
pub fn synthesize(source: &str, language: Language, test_case: &TestCase) -> SynthesizedProgram {
    if !has_template(language) {
        return SynthesizedProgram {
            source: source.to_string(),
            stdin: Some(test_case.input.clone()).filter(|s| !s.is_empty()),
            entry_point: None,
        };
    }

    let entry_point = test_case
        .entry_point
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| detect_entry_point(source, language))
        .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string());
    let args = arguments(test_case);

    let program = match language {
        Language::Python => python_program(source, &entry_point, &args),
        Language::JavaScript => javascript_program(source, &entry_point, &args),
        Language::Java => java_program(source, &entry_point, &args),
        _ => cpp_program(source, &entry_point, &args),
    };

    SynthesizedProgram {
        source: program,
        stdin: None,
        entry_point: Some(entry_point),
    }
}

/// Best-effort guess at the candidate's function name
pub fn detect_entry_point(source: &str, language: Language) -> Option<String> {
    match language {
        Language::Python => PYTHON_DEF
            .captures_iter(source)
            .map(|c| c[1].to_string())
            .find(|name| !(name.starts_with("__") && name.ends_with("__"))),
        Language::JavaScript | Language::TypeScript => {
            first_match(&[&*JS_FUNCTION, &*JS_BOUND_FUNCTION, &*JS_METHOD], source, JS_KEYWORDS)
        }
        Language::Java | Language::Cpp | Language::C | Language::CSharp => {
            let class_names: Vec<String> = CLASS_DECL
                .captures_iter(source)
                .map(|c| c[1].to_string())
                .collect();
            // Helper classes declared ahead of Solution are not candidates
            let scope = SOLUTION_CLASS
                .find(source)
                .map_or(source, |m| &source[m.start()..]);
            C_FAMILY_METHOD
                .captures_iter(scope)
                .map(|c| c[1].to_string())
                .find(|name| !C_FAMILY_KEYWORDS.contains(&name.as_str()) && !class_names.contains(name))
        }
        _ => None,
    }
}

/// Earliest capture across several patterns, ignoring keywords
fn first_match(patterns: &[&Regex], source: &str, skip: &[&str]) -> Option<String> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(source))
        .filter_map(|c| c.get(1))
        .filter(|m| !skip.contains(&m.as_str()))
        .min_by_key(|m| m.start())
        .map(|m| m.as_str().to_string())
}

/// Arguments in call order, preferring structured parameters over the legacy input text
pub fn arguments(test_case: &TestCase) -> Vec<Argument> {
    match &test_case.parameters {
        Some(params) => params
            .iter()
            .map(|p| {
                let value = parse_literal(&p.literal_value);
                let value_type = p.value_type.clone().unwrap_or_else(|| infer_type(&value));
                Argument {
                    name: p.name.clone(),
                    value,
                    value_type,
                }
            })
            .collect(),
        None => parse_assignments(&test_case.input)
            .into_iter()
            .map(|(name, text)| {
                let value = parse_literal(&text);
                let value_type = infer_type(&value);
                Argument {
                    name,
                    value,
                    value_type,
                }
            })
            .collect(),
    }
}

/// Split `nums = [1,2], target = 9` into name/value pairs.
///
/// Segments without a valid `name =` prefix become positional `argN`.
pub fn parse_assignments(input: &str) -> Vec<(String, String)> {
    split_top_level(input)
        .into_iter()
        .enumerate()
        .map(|(idx, segment)| {
            match segment.split_once('=') {
                Some((name, value)) if IDENTIFIER.is_match(name.trim()) && !value.starts_with('=') => {
                    (name.trim().to_string(), value.trim().to_string())
                }
                _ => (format!("arg{}", idx), segment),
            }
        })
        .collect()
}

/// Split on commas outside brackets and string quotes
pub fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '{' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | '}' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parse a literal as JSON, accepting Python spellings (`True`, `None`, single quotes)
pub fn parse_literal(text: &str) -> Literal {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Literal::Json(value);
    }
    match serde_json::from_str::<Value>(&pythonic_to_json(text)) {
        Ok(value) => Literal::Json(value),
        Err(_) => Literal::Raw(text.to_string()),
    }
}

fn pythonic_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        match word.as_str() {
            "True" => out.push_str("true"),
            "False" => out.push_str("false"),
            "None" => out.push_str("null"),
            other => out.push_str(other),
        }
        word.clear();
    };

    while let Some(ch) = chars.next() {
        if ch.is_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }
        flush(&mut word, &mut out);
        match ch {
            '\'' => {
                out.push('"');
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(next) = chars.next() {
                                if next != '\'' {
                                    out.push('\\');
                                }
                                out.push(next);
                            }
                        }
                        '\'' => break,
                        '"' => out.push_str("\\\""),
                        _ => out.push(c),
                    }
                }
                out.push('"');
            }
            '"' => {
                out.push('"');
                while let Some(c) = chars.next() {
                    out.push(c);
                    match c {
                        '\\' => {
                            if let Some(next) = chars.next() {
                                out.push(next);
                            }
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    flush(&mut word, &mut out);
    out
}

pub fn infer_type(literal: &Literal) -> ValueType {
    match literal {
        Literal::Json(value) => infer_json_type(value),
        Literal::Raw(_) => ValueType::Unknown,
    }
}

fn infer_json_type(value: &Value) -> ValueType {
    match value {
        Value::Bool(_) => ValueType::Bool,
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => ValueType::Int,
            Some(_) => ValueType::Long,
            None if n.is_u64() => ValueType::Long,
            None => ValueType::Double,
        },
        Value::String(_) => ValueType::Str,
        Value::Array(items) => {
            let inner = items
                .iter()
                .map(infer_json_type)
                .reduce(unify)
                .unwrap_or(ValueType::Int);
            ValueType::array_of(inner)
        }
        Value::Null | Value::Object(_) => ValueType::Unknown,
    }
}

fn unify(a: ValueType, b: ValueType) -> ValueType {
    use ValueType::*;
    match (a, b) {
        (a, b) if a == b => a,
        (Unknown, other) | (other, Unknown) => other,
        (Int, Long) | (Long, Int) => Long,
        (Int | Long | Double, Int | Long | Double) => Double,
        (Array(x), Array(y)) => ValueType::array_of(unify(*x, *y)),
        _ => Unknown,
    }
}

fn call_args(args: &[Argument]) -> String {
    args.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
}

// ---- Python ----

fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => json_quote(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(python_literal).collect::<Vec<_>>().join(",")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}:{}", json_quote(k), python_literal(v)))
                .collect::<Vec<_>>()
                .join(",")
        ),
    }
}

fn python_program(source: &str, entry_point: &str, args: &[Argument]) -> String {
    let callee = if SOLUTION_CLASS.is_match(source) {
        format!("Solution().{}", entry_point)
    } else {
        entry_point.to_string()
    };

    let mut declarations = String::new();
    for arg in args {
        let literal = match &arg.value {
            Literal::Json(value) => python_literal(value),
            Literal::Raw(text) => text.clone(),
        };
        declarations.push_str(&format!("        {} = {}\n", arg.name, literal));
    }

    format!(
        r#"import json
from typing import *

{source}


def _render(value):
    if value is None:
        return "null"
    if isinstance(value, bool):
        return "true" if value else "false"
    if isinstance(value, (list, tuple, dict)):
        return json.dumps(value, separators=(",", ":"), ensure_ascii=False)
    return str(value)


if __name__ == "__main__":
    try:
{declarations}        result_ = {callee}({call})
        print(_render(result_))
    except Exception as e:
        print(f"Error: {{e}}")
"#,
        source = source.trim_end(),
        declarations = declarations,
        callee = callee,
        call = call_args(args),
    )
}

// ---- JavaScript ----

fn javascript_program(source: &str, entry_point: &str, args: &[Argument]) -> String {
    let callee = if SOLUTION_CLASS.is_match(source) {
        format!("new Solution().{}", entry_point)
    } else {
        entry_point.to_string()
    };

    let mut declarations = String::new();
    for arg in args {
        let literal = match &arg.value {
            Literal::Json(value) => value.to_string(),
            Literal::Raw(text) => text.clone(),
        };
        declarations.push_str(&format!("  const {} = {};\n", arg.name, literal));
    }

    format!(
        r#"{source}

function render_(value) {{
  if (value === null) return "null";
  if (typeof value === "object") return JSON.stringify(value);
  if (typeof value === "boolean") return value ? "true" : "false";
  return String(value);
}}

try {{
{declarations}  const result_ = {callee}({call});
  console.log(render_(result_));
}} catch (e) {{
  console.log("Error: " + (e && e.message !== undefined ? e.message : e));
}}
"#,
        source = source.trim_end(),
        declarations = declarations,
        callee = callee,
        call = call_args(args),
    )
}

// ---- Java ----

fn java_type(ty: &ValueType) -> String {
    match ty {
        ValueType::Int => "int".to_string(),
        ValueType::Long => "long".to_string(),
        ValueType::Double => "double".to_string(),
        ValueType::Bool => "boolean".to_string(),
        ValueType::Str => "String".to_string(),
        ValueType::Array(inner) => format!("{}[]", java_type(inner)),
        ValueType::Unknown => "Object".to_string(),
    }
}

fn java_literal(value: &Value, ty: &ValueType, with_new: bool) -> String {
    match (value, ty) {
        (Value::Array(items), ValueType::Array(inner)) => {
            let nested_new = matches!(**inner, ValueType::Unknown);
            let body = items
                .iter()
                .map(|v| java_literal(v, inner, nested_new))
                .collect::<Vec<_>>()
                .join(",");
            if with_new {
                format!("new {}{{{}}}", java_type(ty), body)
            } else {
                format!("{{{}}}", body)
            }
        }
        (Value::Array(items), _) => {
            let body = items
                .iter()
                .map(|v| java_literal(v, &ValueType::Unknown, true))
                .collect::<Vec<_>>()
                .join(",");
            format!("new Object[]{{{}}}", body)
        }
        (other, ty) => scalar_literal(other, ty, "L"),
    }
}

/// Class whose declaration span mentions `entry_point(`, else the first class
fn class_declaring(source: &str, entry_point: &str) -> Option<String> {
    let classes: Vec<(usize, String)> = CLASS_DECL
        .captures_iter(source)
        .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str().to_string())))
        .collect();
    let method = Regex::new(&format!(r"\b{}\s*\(", regex::escape(entry_point))).ok();

    classes
        .iter()
        .enumerate()
        .find(|(idx, (start, _))| {
            let end = classes.get(idx + 1).map_or(source.len(), |(next, _)| *next);
            method.as_ref().is_some_and(|re| re.is_match(&source[*start..end]))
        })
        .or_else(|| classes.first().map(|class| (0, class)))
        .map(|(_, (_, name))| name.clone())
}

fn java_program(source: &str, entry_point: &str, args: &[Argument]) -> String {
    // Imports must precede every class in Main.java
    let mut imports = vec!["import java.util.*;".to_string()];
    let mut body_lines = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("import ") {
            imports.push(trimmed.to_string());
        } else if !trimmed.starts_with("package ") {
            body_lines.push(line);
        }
    }
    let body = JAVA_PUBLIC_CLASS
        .replace_all(&body_lines.join("\n"), "${1}class")
        .into_owned();

    let target = if SOLUTION_CLASS.is_match(&body) {
        Some("Solution".to_string())
    } else {
        class_declaring(&body, entry_point)
    };
    let (class_name, body) = match target {
        Some(name) => (name, body),
        None => (
            "Solution".to_string(),
            format!("class Solution {{\n{}\n}}", body.trim_end()),
        ),
    };

    let mut declarations = String::new();
    for arg in args {
        let line = match &arg.value {
            Literal::Json(value) => format!(
                "{} {} = {};",
                java_type(&arg.value_type),
                arg.name,
                java_literal(value, &arg.value_type, true)
            ),
            Literal::Raw(text) => {
                let ty = match arg.value_type {
                    ValueType::Unknown => "var".to_string(),
                    ref other => java_type(other),
                };
                format!("{} {} = {};", ty, arg.name, text)
            }
        };
        declarations.push_str(&format!("            {}\n", line));
    }

    imports.dedup();
    format!(
        r#"{imports}

{body}

public class Main {{
    private static String quote(String s) {{
        StringBuilder out = new StringBuilder("\"");
        for (char c : s.toCharArray()) {{
            switch (c) {{
                case '"': out.append("\\\""); break;
                case '\\': out.append("\\\\"); break;
                case '\n': out.append("\\n"); break;
                case '\r': out.append("\\r"); break;
                case '\t': out.append("\\t"); break;
                default:
                    if (c < 0x20) out.append(String.format("\\u%04x", (int) c));
                    else out.append(c);
            }}
        }}
        return out.append('"').toString();
    }}

    private static String renderNested(Object value) {{
        if (value == null) return "null";
        if (value instanceof String || value instanceof Character) return quote(String.valueOf(value));
        if (value.getClass().isArray()) {{
            StringBuilder out = new StringBuilder("[");
            int n = java.lang.reflect.Array.getLength(value);
            for (int i = 0; i < n; i++) {{
                if (i > 0) out.append(",");
                out.append(renderNested(java.lang.reflect.Array.get(value, i)));
            }}
            return out.append("]").toString();
        }}
        if (value instanceof Iterable) {{
            StringBuilder out = new StringBuilder("[");
            boolean first = true;
            for (Object item : (Iterable<?>) value) {{
                if (!first) out.append(",");
                out.append(renderNested(item));
                first = false;
            }}
            return out.append("]").toString();
        }}
        if (value instanceof Map) {{
            StringBuilder out = new StringBuilder("{{");
            boolean first = true;
            for (Map.Entry<?, ?> entry : ((Map<?, ?>) value).entrySet()) {{
                if (!first) out.append(",");
                out.append(quote(String.valueOf(entry.getKey()))).append(":").append(renderNested(entry.getValue()));
                first = false;
            }}
            return out.append("}}").toString();
        }}
        return String.valueOf(value);
    }}

    private static String render(Object value) {{
        if (value instanceof String || value instanceof Character) return String.valueOf(value);
        return renderNested(value);
    }}

    public static void main(String[] args) {{
        try {{
            {class_name} solution_ = new {class_name}();
{declarations}            Object result_ = solution_.{entry_point}({call});
            System.out.println(render(result_));
        }} catch (Exception e) {{
            System.out.println("Error: " + e.getMessage());
        }}
    }}
}}
"#,
        imports = imports.join("\n"),
        body = body.trim_end(),
        class_name = class_name,
        declarations = declarations,
        entry_point = entry_point,
        call = call_args(args),
    )
}

// ---- C++ ----

fn cpp_type(ty: &ValueType) -> String {
    match ty {
        ValueType::Int => "int".to_string(),
        ValueType::Long => "long long".to_string(),
        ValueType::Double => "double".to_string(),
        ValueType::Bool => "bool".to_string(),
        ValueType::Str => "string".to_string(),
        ValueType::Array(inner) => format!("vector<{}>", cpp_type(inner)),
        ValueType::Unknown => "auto".to_string(),
    }
}

fn cpp_literal(value: &Value, ty: &ValueType) -> String {
    match value {
        Value::Array(items) => {
            let unknown = ValueType::Unknown;
            let inner = match ty {
                ValueType::Array(inner) => inner.as_ref(),
                _ => &unknown,
            };
            format!(
                "{{{}}}",
                items
                    .iter()
                    .map(|v| cpp_literal(v, inner))
                    .collect::<Vec<_>>()
                    .join(",")
            )
        }
        Value::Null => "nullptr".to_string(),
        other => scalar_literal(other, ty, "LL"),
    }
}

fn cpp_program(source: &str, entry_point: &str, args: &[Argument]) -> String {
    let has_class = SOLUTION_CLASS.is_match(source);
    let callee = if has_class {
        format!("solution_.{}", entry_point)
    } else {
        entry_point.to_string()
    };

    let mut declarations = String::new();
    for arg in args {
        let literal = match &arg.value {
            Literal::Json(value) => cpp_literal(value, &arg.value_type),
            Literal::Raw(text) => text.clone(),
        };
        declarations.push_str(&format!(
            "        {} {} = {};\n",
            cpp_type(&arg.value_type),
            arg.name,
            literal
        ));
    }
    if has_class {
        declarations.push_str("        Solution solution_;\n");
    }

    format!(
        r#"#include <bits/stdc++.h>
using namespace std;

{source}

string quote_(const string& s) {{
    string out = "\"";
    for (char c : s) {{
        switch (c) {{
            case '"': out += "\\\""; break;
            case '\\': out += "\\\\"; break;
            case '\n': out += "\\n"; break;
            case '\r': out += "\\r"; break;
            case '\t': out += "\\t"; break;
            default:
                if (static_cast<unsigned char>(c) < 0x20) {{
                    char buf[8];
                    snprintf(buf, sizeof(buf), "\\u%04x", c);
                    out += buf;
                }} else {{
                    out += c;
                }}
        }}
    }}
    return out + "\"";
}}

string render_double(double v) {{
    ostringstream out;
    if (!isfinite(v)) {{
        out << v;
        return out.str();
    }}
    string text;
    for (int precision = 1; precision <= 17; ++precision) {{
        ostringstream attempt;
        attempt << setprecision(precision) << v;
        text = attempt.str();
        if (stod(text) == v) break;
    }}
    if (text.find_first_of(".e") == string::npos) text += ".0";
    return text;
}}

string render_nested(const string& v) {{ return quote_(v); }}
string render_nested(const char* v) {{ return quote_(string(v)); }}
string render_nested(char v) {{ return quote_(string(1, v)); }}
string render_nested(bool v) {{ return v ? "true" : "false"; }}
string render_nested(double v) {{ return render_double(v); }}
string render_nested(float v) {{ return render_double(v); }}
template <typename T> string render_nested(const T& v) {{
    ostringstream out;
    out << v;
    return out.str();
}}
template <typename T> string render_nested(const vector<T>& v) {{
    string out = "[";
    for (size_t i = 0; i < v.size(); ++i) {{
        if (i > 0) out += ",";
        out += render_nested(v[i]);
    }}
    return out + "]";
}}

string render_value(const string& v) {{ return v; }}
string render_value(const char* v) {{ return string(v); }}
string render_value(char v) {{ return string(1, v); }}
template <typename T> string render_value(const T& v) {{ return render_nested(v); }}

int main() {{
    try {{
{declarations}        auto result_ = {callee}({call});
        cout << render_value(result_) << endl;
    }} catch (const exception& e) {{
        cout << "Error: " << e.what() << endl;
    }}
    return 0;
}}
"#,
        source = source.trim_end(),
        declarations = declarations,
        callee = callee,
        call = call_args(args),
    )
}

// ---- shared ----

/// Scalar literal shared by the C-family templates; `long_suffix` marks 64-bit integers
fn scalar_literal(value: &Value, ty: &ValueType, long_suffix: &str) -> String {
    match (value, ty) {
        (Value::Null, _) => "null".to_string(),
        (Value::String(s), _) => json_quote(s),
        (other, ValueType::Str) => json_quote(&other.to_string()),
        (Value::Number(n), ValueType::Long) => format!("{}{}", n, long_suffix),
        (Value::Number(n), ValueType::Double) => {
            let text = n.to_string();
            if text.contains(['.', 'e', 'E']) {
                text
            } else {
                format!("{}.0", text)
            }
        }
        (other, _) => other.to_string(),
    }
}

fn json_quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_common::types::Parameter;
    use pretty_assertions::assert_eq;

    const TWO_SUM_PY: &str = r#"def twoSum(nums, target):
    seen = {}
    for i, n in enumerate(nums):
        if target - n in seen:
            return [seen[target - n], i]
        seen[n] = i
"#;

    fn two_sum_case() -> TestCase {
        TestCase::new("1", "nums = [2,7,11,15], target = 9", "[0,1]")
    }

    #[test]
    fn test_split_top_level_keeps_nested_commas() {
        assert_eq!(
            split_top_level("grid = [[1,2],[3,4]], word = \"a,b\", k = 2"),
            vec!["grid = [[1,2],[3,4]]", "word = \"a,b\"", "k = 2"]
        );
        assert!(split_top_level("   ").is_empty());
    }

    #[test]
    fn test_parse_assignments() {
        assert_eq!(
            parse_assignments("nums = [2,7,11,15], target = 9"),
            vec![
                ("nums".to_string(), "[2,7,11,15]".to_string()),
                ("target".to_string(), "9".to_string()),
            ]
        );
        assert_eq!(
            parse_assignments("5, s = 'x'"),
            vec![
                ("arg0".to_string(), "5".to_string()),
                ("s".to_string(), "'x'".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_literal_accepts_python_spellings() {
        assert_eq!(
            parse_literal("[True, None, 'x']"),
            Literal::Json(serde_json::json!([true, null, "x"]))
        );
        assert_eq!(
            parse_literal("['a', \"b\"]"),
            Literal::Json(serde_json::json!(["a", "b"]))
        );
        assert_eq!(parse_literal("False"), Literal::Json(Value::Bool(false)));
        assert_eq!(parse_literal("x + 1"), Literal::Raw("x + 1".to_string()));
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(
            infer_type(&parse_literal("[[1,2],[3]]")),
            ValueType::array_of(ValueType::array_of(ValueType::Int))
        );
        assert_eq!(
            infer_type(&parse_literal("[1, 2.5]")),
            ValueType::array_of(ValueType::Double)
        );
        assert_eq!(infer_type(&parse_literal("10000000000")), ValueType::Long);
        assert_eq!(infer_type(&parse_literal("\"abc\"")), ValueType::Str);
        assert_eq!(infer_type(&parse_literal("[]")), ValueType::array_of(ValueType::Int));
    }

    #[test]
    fn test_detect_entry_point() {
        assert_eq!(detect_entry_point(TWO_SUM_PY, Language::Python).as_deref(), Some("twoSum"));
        assert_eq!(
            detect_entry_point("const addUp = (a, b) => a + b;", Language::JavaScript).as_deref(),
            Some("addUp")
        );
        assert_eq!(
            detect_entry_point(
                "class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        if (nums.length == 0) { return null; }\n        return new int[]{0, 1};\n    }\n}",
                Language::Java
            )
            .as_deref(),
            Some("twoSum")
        );
        assert_eq!(
            detect_entry_point(
                "class Solution {\npublic:\n    Solution() {}\n    bool isPalindrome(string s) const {\n        return true;\n    }\n};",
                Language::Cpp
            )
            .as_deref(),
            Some("isPalindrome")
        );
        assert_eq!(detect_entry_point("x = 1", Language::Python), None);
    }

    #[test]
    fn test_python_program() {
        let program = synthesize(TWO_SUM_PY, Language::Python, &two_sum_case());
        assert_eq!(program.entry_point.as_deref(), Some("twoSum"));
        assert!(program.stdin.is_none());
        assert!(program.source.contains("        nums = [2,7,11,15]\n"));
        assert!(program.source.contains("        target = 9\n"));
        assert!(program.source.contains("result_ = twoSum(nums, target)"));
        assert!(program.source.contains("print(f\"Error: {e}\")"));
    }

    #[test]
    fn test_python_solution_class_and_booleans() {
        let source = "class Solution:\n    def check(self, flags):\n        return all(flags)\n";
        let tc = TestCase::new("1", "flags = [true, false]", "false");
        let program = synthesize(source, Language::Python, &tc);
        assert!(program.source.contains("flags = [True,False]"));
        assert!(program.source.contains("result_ = Solution().check(flags)"));
    }

    #[test]
    fn test_declared_entry_point_wins() {
        let tc = two_sum_case().with_entry_point("findPair");
        let program = synthesize(TWO_SUM_PY, Language::Python, &tc);
        assert!(program.source.contains("result_ = findPair(nums, target)"));
    }

    #[test]
    fn test_default_entry_point() {
        let program = synthesize("print('hi')", Language::JavaScript, &TestCase::new("1", "", "hi"));
        assert_eq!(program.entry_point.as_deref(), Some(DEFAULT_ENTRY_POINT));
        assert!(program.source.contains("const result_ = solution();"));
    }

    #[test]
    fn test_javascript_program() {
        let source = "function twoSum(nums, target) { return [0, 1]; }";
        let program = synthesize(source, Language::JavaScript, &two_sum_case());
        assert!(program.source.contains("  const nums = [2,7,11,15];\n"));
        assert!(program.source.contains("const result_ = twoSum(nums, target);"));
        assert!(program.source.contains("JSON.stringify(value)"));
    }

    #[test]
    fn test_java_program_wraps_and_types() {
        let source = "import java.util.HashMap;\npublic int[] twoSum(int[] nums, int target) {\n    return new int[]{0, 1};\n}";
        let program = synthesize(source, Language::Java, &two_sum_case());
        let src = &program.source;
        assert!(src.starts_with("import java.util.*;\nimport java.util.HashMap;"));
        assert!(src.contains("class Solution {\npublic int[] twoSum"));
        assert!(src.contains("int[] nums = new int[]{2,7,11,15};"));
        assert!(src.contains("int target = 9;"));
        assert!(src.contains("Solution solution_ = new Solution();"));
        assert!(src.contains("Object result_ = solution_.twoSum(nums, target);"));
        assert!(src.contains("public class Main {"));
    }

    #[test]
    fn test_java_public_class_is_demoted() {
        let source = "public class Solution {\n    public boolean ok(String s) { return true; }\n}";
        let tc = TestCase::new("1", "s = \"abc\"", "true");
        let program = synthesize(source, Language::Java, &tc);
        assert!(program.source.contains("\nclass Solution {"));
        assert!(!program.source.contains("public class Solution"));
        assert!(program.source.contains("String s = \"abc\";"));
    }

    #[test]
    fn test_java_helper_class_before_solution() {
        let source = "class ListNode {\n    int val;\n    ListNode(int v) { val = v; }\n    int getVal() { return val; }\n}\n\nclass Solution {\n    public int twice(int n) { return 2 * n; }\n}";
        let tc = TestCase::new("1", "n = 4", "8");
        let program = synthesize(source, Language::Java, &tc);
        assert_eq!(program.entry_point.as_deref(), Some("twice"));
        assert!(program.source.contains("Solution solution_ = new Solution();"));
        assert!(program.source.contains("solution_.twice(n)"));
        assert!(!program.source.contains("ListNode solution_"));
    }

    #[test]
    fn test_java_targets_class_declaring_entry_point() {
        let source = "class Node {\n    int val;\n    Node(int v) { val = v; }\n}\nclass Calculator {\n    public int twice(int n) { return 2 * n; }\n}";
        let tc = TestCase::new("1", "n = 4", "8");
        let program = synthesize(source, Language::Java, &tc);
        assert!(program.source.contains("Calculator solution_ = new Calculator();"));
        assert!(program.source.contains("solution_.twice(n)"));
        assert_eq!(class_declaring(source, "missing").as_deref(), Some("Node"));
        assert_eq!(class_declaring("int twice(int n) { return n; }", "twice"), None);
    }

    #[test]
    fn test_renderers_agree_on_canonical_forms() {
        let tc = TestCase::new("1", "n = 1", "1");

        let python = synthesize("def f(n):\n    return n\n", Language::Python, &tc).source;
        assert!(python.contains("if value is None:\n        return \"null\""));
        assert!(python.contains("isinstance(value, (list, tuple, dict))"));
        assert!(python.contains("ensure_ascii=False"));

        let javascript = synthesize("function f(n) { return n; }", Language::JavaScript, &tc).source;
        assert!(javascript.contains("if (value === null) return \"null\";"));
        assert!(javascript.contains("if (typeof value === \"object\") return JSON.stringify(value);"));

        let java = synthesize("int f(int n) { return n; }", Language::Java, &tc).source;
        assert!(java.contains("if (value instanceof String || value instanceof Character) return quote(String.valueOf(value));"));
        assert!(java.contains("java.lang.reflect.Array.get(value, i)"));
        assert!(java.contains("case '\"': out.append(\"\\\\\\\"\"); break;"));

        let cpp = synthesize("int f(int n) { return n; }", Language::Cpp, &tc).source;
        assert!(cpp.contains("string render_nested(const string& v) { return quote_(v); }"));
        assert!(cpp.contains("string render_nested(double v) { return render_double(v); }"));
        assert!(cpp.contains("attempt << setprecision(precision) << v;"));
        assert!(cpp.contains("if (stod(text) == v) break;"));
        assert!(cpp.contains("text += \".0\";"));
    }

    /// Compiles and runs each template, checking every language prints the same line
    #[test]
    #[ignore] // Requires python3, node, g++ and javac on PATH
    fn test_templates_print_identical_lines() {
        use std::process::Command;

        let dir = std::env::temp_dir().join(format!("arbiter-render-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let run = |program: &str, args: &[&str]| -> String {
            let out = Command::new(program).args(args).current_dir(&dir).output().unwrap();
            assert!(out.status.success(), "{} failed: {}", program, String::from_utf8_lossy(&out.stderr));
            String::from_utf8(out.stdout).unwrap().trim().to_string()
        };

        let cases = [
            (
                "def f():\n    return [\"a\", \"b\"]\n",
                "function f() { return [\"a\", \"b\"]; }",
                "String[] f() { return new String[]{\"a\", \"b\"}; }",
                "vector<string> f() { return {\"a\", \"b\"}; }",
                "[\"a\",\"b\"]",
            ),
            (
                "def f():\n    return 1.0 / 3\n",
                "function f() { return 1.0 / 3; }",
                "double f() { return 1.0 / 3; }",
                "double f() { return 1.0 / 3; }",
                "0.3333333333333333",
            ),
            (
                "def f():\n    return [[1.5, 2.5]]\n",
                "function f() { return [[1.5, 2.5]]; }",
                "double[][] f() { return new double[][]{{1.5, 2.5}}; }",
                "vector<vector<double>> f() { return {{1.5, 2.5}}; }",
                "[[1.5,2.5]]",
            ),
        ];

        for (python, javascript, java, cpp, expected) in cases {
            let tc = TestCase::new("1", "", expected);

            std::fs::write(dir.join("main.py"), synthesize(python, Language::Python, &tc).source).unwrap();
            std::fs::write(dir.join("main.js"), synthesize(javascript, Language::JavaScript, &tc).source).unwrap();
            std::fs::write(dir.join("Main.java"), synthesize(java, Language::Java, &tc).source).unwrap();
            std::fs::write(dir.join("main.cpp"), synthesize(cpp, Language::Cpp, &tc).source).unwrap();

            run("g++", &["-std=c++17", "-o", "main_cpp", "main.cpp"]);
            run("javac", &["Main.java"]);

            assert_eq!(run("node", &["main.js"]), expected);
            assert_eq!(run("java", &["Main"]), expected);
            assert_eq!(run(dir.join("main_cpp").to_str().unwrap(), &[]), expected);
            assert_eq!(run("python3", &["main.py"]), expected);
        }

        let tc = TestCase::new("1", "", "null");
        std::fs::write(dir.join("main.py"), synthesize("def f():\n    return None\n", Language::Python, &tc).source).unwrap();
        std::fs::write(dir.join("main.js"), synthesize("function f() { return null; }", Language::JavaScript, &tc).source).unwrap();
        assert_eq!(run("python3", &["main.py"]), "null");
        assert_eq!(run("node", &["main.js"]), "null");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cpp_program_with_structured_parameters() {
        let source = "class Solution {\npublic:\n    long long total(vector<vector<int>>& grid, double scale) { return 0; }\n};";
        let tc = TestCase::new("1", "ignored", "0").with_parameters(vec![
            Parameter {
                name: "grid".to_string(),
                literal_value: "[[1,2],[3,4]]".to_string(),
                value_type: None,
            },
            Parameter {
                name: "scale".to_string(),
                literal_value: "2".to_string(),
                value_type: Some(ValueType::Double),
            },
        ]);
        let program = synthesize(source, Language::Cpp, &tc);
        let src = &program.source;
        assert!(src.contains("vector<vector<int>> grid = {{1,2},{3,4}};"));
        assert!(src.contains("double scale = 2.0;"));
        assert!(src.contains("Solution solution_;"));
        assert!(src.contains("auto result_ = solution_.total(grid, scale);"));
    }

    #[test]
    fn test_untemplated_language_pipes_input() {
        let source = "fn main() { println!(\"1\"); }";
        let program = synthesize(source, Language::Rust, &two_sum_case());
        assert_eq!(program.source, source);
        assert_eq!(program.stdin.as_deref(), Some("nums = [2,7,11,15], target = 9"));
        assert!(program.entry_point.is_none());
    }
}
