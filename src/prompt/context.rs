//! User-context builders for each generation request

use serde_json::json;

use super::render::PromptRenderer;
use crate::error::Result;
use crate::language::LanguageProfile;

/// Compile errors passed to a fix request
pub const COMPILE_ERROR_TAIL_CHARS: usize = 2000;

/// Mutation output passed to a kill-survivors request
pub const SURVIVOR_OUTPUT_TAIL_CHARS: usize = 3000;

/// Mutation output passed to a suggestions request
pub const SUGGESTION_OUTPUT_TAIL_CHARS: usize = 4000;

const SPEC_AND_SOURCE: &str = "## Specification
{{spec}}

## Source Code ({{language}})
```{{language}}
{{source}}
```";

const ENDPOINT_AND_CONTROLLER: &str = "## Endpoint Specification
{{endpoint_spec}}

## Controller Code ({{language}})
```{{language}}
{{controller}}
```";

const UI_SPEC: &str = "## UI Test Specification
{{ui_spec}}

## Base URL
{{base_url}}";

const QUALITY: &str = "## Test Code
```
{{tests}}
```

## Production Code
```
{{production}}
```";

const COMPILE_FIX: &str = "This test code does not compile:
```
{{artifact}}
```

Compiler output:
```
{{errors}}
```

Fix the test code. Reply with the corrected test code only.";

const KILL_SURVIVORS: &str = "## Current test code
```
{{artifact}}
```

## Surviving mutants
```
{{mutation_output}}
```

Rewrite the tests so they kill the surviving mutants. Reply with the complete test code only.";

const SUGGESTIONS: &str = "## Mutation Testing Output
```
{{mutation_output}}
```";

/// Last `n` characters of `text`, on a char boundary
pub fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

impl PromptRenderer {
    /// Specification and source for initial test generation
    pub fn tdd_context(&self, spec: &str, source: &str, profile: LanguageProfile) -> Result<String> {
        self.render(
            SPEC_AND_SOURCE,
            &json!({ "spec": spec, "source": source, "language": profile.name() }),
        )
    }

    pub fn api_context(&self, endpoint_spec: &str, controller: &str, profile: LanguageProfile) -> Result<String> {
        self.render(
            ENDPOINT_AND_CONTROLLER,
            &json!({ "endpoint_spec": endpoint_spec, "controller": controller, "language": profile.name() }),
        )
    }

    pub fn ui_context(&self, ui_spec: &str, base_url: &str) -> Result<String> {
        self.render(UI_SPEC, &json!({ "ui_spec": ui_spec, "base_url": base_url }))
    }

    pub fn quality_context(&self, tests: &str, production: &str) -> Result<String> {
        self.render(QUALITY, &json!({ "tests": tests, "production": production }))
    }

    /// Fix request carrying the last `COMPILE_ERROR_TAIL_CHARS` of stderr
    pub fn compile_fix_context(&self, artifact: &str, stderr: &str) -> Result<String> {
        self.render(
            COMPILE_FIX,
            &json!({ "artifact": artifact, "errors": tail_chars(stderr, COMPILE_ERROR_TAIL_CHARS) }),
        )
    }

    /// Improvement request carrying the last `SURVIVOR_OUTPUT_TAIL_CHARS` of mutation output
    pub fn kill_survivors_context(&self, artifact: &str, mutation_output: &str) -> Result<String> {
        self.render(
            KILL_SURVIVORS,
            &json!({
                "artifact": artifact,
                "mutation_output": tail_chars(mutation_output, SURVIVOR_OUTPUT_TAIL_CHARS)
            }),
        )
    }

    pub fn suggestions_context(&self, mutation_output: &str) -> Result<String> {
        self.render(
            SUGGESTIONS,
            &json!({ "mutation_output": tail_chars(mutation_output, SUGGESTION_OUTPUT_TAIL_CHARS) }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_chars_shorter_than_limit() {
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("", 10), "");
    }

    #[test]
    fn test_tail_chars_exact_and_longer() {
        assert_eq!(tail_chars("abcdef", 6), "abcdef");
        assert_eq!(tail_chars("abcdef", 2), "ef");
        assert_eq!(tail_chars("abcdef", 0), "");
    }

    #[test]
    fn test_tail_chars_multibyte() {
        assert_eq!(tail_chars("héllo wörld", 5), "wörld");
        assert_eq!(tail_chars("日本語テキスト", 3), "キスト");
    }

    #[test]
    fn test_tdd_context() {
        let renderer = PromptRenderer::new();
        let context = renderer
            .tdd_context("Money adds amounts", "class Money {}", LanguageProfile::Java)
            .unwrap();
        assert!(context.contains("## Specification\nMoney adds amounts"));
        assert!(context.contains("## Source Code (java)"));
        assert!(context.contains("```java\nclass Money {}\n```"));
    }

    #[test]
    fn test_api_context() {
        let renderer = PromptRenderer::new();
        let context = renderer
            .api_context("POST /transfer", "def transfer(): ...", LanguageProfile::Python)
            .unwrap();
        assert!(context.contains("POST /transfer"));
        assert!(context.contains("```python\ndef transfer(): ...\n```"));
    }

    #[test]
    fn test_ui_context() {
        let renderer = PromptRenderer::new();
        let context = renderer.ui_context("login flow", "http://localhost:3000").unwrap();
        assert!(context.contains("login flow"));
        assert!(context.contains("## Base URL\nhttp://localhost:3000"));
    }

    #[test]
    fn test_quality_context() {
        let renderer = PromptRenderer::new();
        let context = renderer.quality_context("assert x", "fn x()").unwrap();
        assert!(context.contains("## Test Code\n```\nassert x\n```"));
        assert!(context.contains("## Production Code\n```\nfn x()\n```"));
    }

    #[test]
    fn test_compile_fix_context_truncates_stderr() {
        let renderer = PromptRenderer::new();
        let stderr = format!("{}syntax error", "x".repeat(5000));
        let context = renderer.compile_fix_context("class T {", &stderr).unwrap();

        assert!(context.contains("class T {"));
        assert!(context.contains("syntax error"));
        assert!(!context.contains(&"x".repeat(COMPILE_ERROR_TAIL_CHARS)));
    }

    #[test]
    fn test_kill_survivors_context() {
        let renderer = PromptRenderer::new();
        let output = format!("{}2 survived", "y".repeat(4000));
        let context = renderer.kill_survivors_context("old tests", &output).unwrap();

        assert!(context.contains("## Current test code\n```\nold tests\n```"));
        assert!(context.contains("2 survived"));
        assert!(!context.contains(&"y".repeat(SURVIVOR_OUTPUT_TAIL_CHARS)));
    }

    #[test]
    fn test_suggestions_context() {
        let renderer = PromptRenderer::new();
        let context = renderer.suggestions_context(">> SURVIVED").unwrap();
        assert!(context.contains("## Mutation Testing Output\n```\n>> SURVIVED\n```"));
    }
}
