use std::sync::OnceLock;

use regex::Regex;

use crate::problem::Problem;
use crate::run::AttemptRecord;

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

fn code_fence() -> &'static Regex {
    CODE_FENCE.get_or_init(|| {
        // First fenced block wins; language tag optional.
        Regex::new(r"(?s)```(?:cpp|c\+\+)?[ \t]*\n(.*?)```").unwrap()
    })
}

pub const SOLUTION_SYSTEM_PROMPT: &str = r#"You are an expert competitive programmer specializing in C++ solutions for ICPC problems.

Your task is to analyze problem statements and generate efficient, correct C++ solutions.

Guidelines:
1. Write clean, efficient C++ code
2. Use appropriate algorithms and data structures
3. Handle edge cases properly
4. Include necessary headers (#include<bits/stdc++.h>)
5. Use 'using namespace std;'
6. Implement main() function with proper I/O
7. Return ONLY the C++ code - NO explanations, NO markdown, NO comments after the code
8. End your response with the closing brace of main()

If this is a retry attempt, analyze the previous failure and fix the issues."#;

pub const HINT_SYSTEM_PROMPT: &str = r#"You are an expert competitive programming mentor specializing in debugging and providing hints.

Your role is to analyze failed solutions and provide specific, actionable hints to help fix the issues.

Guidelines:
1. Analyze the problem statement, failed code, and error details
2. Identify the root cause of the failure
3. Provide specific hints about what to fix
4. Suggest algorithmic improvements if needed
5. Point out edge cases that might be missed
6. Be concise but thorough in your analysis
7. Focus on the specific error, not rewriting the entire solution

Provide hints that guide the programmer to the correct solution without giving away the complete answer."#;

/// Statement plus numbered sample blocks. Both models see the same text.
pub fn format_statement(problem: &Problem) -> String {
    let mut samples = String::new();
    for (i, tc) in problem.samples().enumerate() {
        samples.push_str(&format!("Sample Input {}:\n{}\n\n", i + 1, tc.input_text));
        samples.push_str(&format!(
            "Sample Output {}:\n{}\n\n",
            i + 1,
            tc.expected_output_text
        ));
    }
    format!("{}\n\nSample Tests:\n{}", problem.statement_md, samples)
}

pub fn initial_request(statement: &str) -> String {
    format!(
        "Problem Statement:\n{}\n\nPlease provide a C++ solution for this problem.",
        statement
    )
}

/// Retry message carrying exactly one previous attempt. Earlier failures
/// are dropped to bound prompt growth; the session history still holds
/// everything the model said before.
pub fn retry_request(statement: &str, previous: &AttemptRecord) -> String {
    let mut message = format!("Problem Statement:\n{}\n\n", statement);
    message.push_str("Previous attempts and their failures:\n");
    message.push_str(&format!("\nAttempt {}:\n", previous.attempt));
    message.push_str(&format!(
        "Code: {}\n",
        previous.solution_code.as_deref().unwrap_or("N/A")
    ));
    message.push_str(&format!(
        "Verdict: {}\n",
        previous.verdict_raw.as_deref().unwrap_or("Unknown")
    ));
    if let Some(details) = detailed_errors(previous) {
        message.push_str(&format!("Error Details: {}\n", details));
    }
    if let Some(hint) = &previous.hint {
        message.push_str(&format!("Hint: {}\n", hint));
    }
    message.push_str("\nPlease fix the issues and provide an improved solution.");
    message
}

pub fn hint_request(
    statement: &str,
    failed_code: &str,
    verdict: &str,
    error_details: &str,
) -> String {
    format!(
        "Problem Statement:\n{}\n\nFailed Solution:\n{}\n\nVerdict: {}\n\nError Details:\n{}\n\nPlease analyze this failure and provide specific hints on what needs to be fixed.",
        statement, failed_code, verdict, error_details
    )
}

/// Per-test diagnostics plus any submission error, or a fixed fallback
/// line when the attempt produced neither.
pub fn error_details(attempt: &AttemptRecord) -> String {
    detailed_errors(attempt)
        .unwrap_or_else(|| "No detailed error information available".to_string())
}

fn detailed_errors(attempt: &AttemptRecord) -> Option<String> {
    let mut details = String::new();

    if let Some(response) = &attempt.judge_response {
        if !response.per_test_details.is_empty() {
            details.push_str("Test Results:\n");
            for test in &response.per_test_details {
                details.push_str(&format!("Test {}: {}\n", test.test_number, test.verdict));
                if let (Some(expected), Some(got)) = (&test.expected, &test.got) {
                    details.push_str(&format!("  Expected: {}\n", expected));
                    details.push_str(&format!("  Got: {}\n", got));
                }
            }
        }
    }

    if let Some(submission_error) = &attempt.submission_error {
        details.push_str(&format!("\nSubmission Error: {}", submission_error));
    }

    if details.is_empty() {
        None
    } else {
        Some(details)
    }
}

/// Reduce raw model output to source code. Takes the first fenced block
/// when one exists, then drops any prose after the last line containing a
/// closing brace.
pub fn extract_code(response: &str) -> String {
    let body = match code_fence().captures(response) {
        Some(caps) => caps[1].to_string(),
        None => response.to_string(),
    };

    let lines: Vec<&str> = body.lines().collect();
    let truncated = match lines.iter().rposition(|line| line.contains('}')) {
        Some(last) => lines[..=last].join("\n"),
        None => body,
    };
    truncated.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{JudgeResponse, TestOutcome};
    use crate::problem::{TestCase, TestKind};

    fn sample_problem() -> Problem {
        Problem {
            id: "1900_A".to_string(),
            contest_id: "1900".to_string(),
            letter: "A".to_string(),
            title: "Cobblestone Road".to_string(),
            statement_md: "Repair the road.".to_string(),
            rating: Some(800),
            tags: vec!["greedy".to_string()],
            tests: vec![
                TestCase {
                    kind: TestKind::Sample,
                    idx: 1,
                    input_text: "3\n.#.".to_string(),
                    expected_output_text: "1".to_string(),
                },
                TestCase {
                    kind: TestKind::Sample,
                    idx: 2,
                    input_text: "2\n##".to_string(),
                    expected_output_text: "2".to_string(),
                },
                TestCase {
                    kind: TestKind::Hidden,
                    idx: 1,
                    input_text: "secret".to_string(),
                    expected_output_text: "secret".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_extract_code_strips_fences_and_trailing_prose() {
        assert_eq!(
            extract_code("explanation\n```cpp\nint main(){}\n```\nmore text"),
            "int main(){}"
        );
    }

    #[test]
    fn test_extract_code_plain_output_passes_through() {
        let code = "#include<bits/stdc++.h>\nint main() {\n    return 0;\n}";
        assert_eq!(extract_code(code), code);
    }

    #[test]
    fn test_extract_code_drops_prose_after_last_brace() {
        let response = "int main() {\n    return 0;\n}\nThis solution reads the input and...";
        assert_eq!(extract_code(response), "int main() {\n    return 0;\n}");
    }

    #[test]
    fn test_extract_code_handles_cpp_plus_plus_tag() {
        let response = "```c++\nint main(){ return 0; }\n```";
        assert_eq!(extract_code(response), "int main(){ return 0; }");
    }

    #[test]
    fn test_extract_code_untagged_fence() {
        let response = "Here:\n```\nint main(){}\n```";
        assert_eq!(extract_code(response), "int main(){}");
    }

    #[test]
    fn test_format_statement_numbers_sample_blocks() {
        let statement = format_statement(&sample_problem());
        assert!(statement.starts_with("Repair the road.\n\nSample Tests:\n"));
        assert!(statement.contains("Sample Input 1:\n3\n.#.\n\n"));
        assert!(statement.contains("Sample Output 1:\n1\n\n"));
        assert!(statement.contains("Sample Input 2:\n2\n##\n\n"));
        // Hidden tests never reach the model.
        assert!(!statement.contains("secret"));
    }

    #[test]
    fn test_initial_request_shape() {
        let message = initial_request("statement text");
        assert_eq!(
            message,
            "Problem Statement:\nstatement text\n\nPlease provide a C++ solution for this problem."
        );
    }

    #[test]
    fn test_retry_request_carries_code_verdict_and_hint() {
        let mut previous = AttemptRecord::new(2);
        previous.solution_code = Some("int main(){ return 1; }".to_string());
        previous.verdict_raw = Some("Wrong answer on test 3".to_string());
        previous.hint = Some("Check the empty-input case.".to_string());

        let message = retry_request("statement text", &previous);
        assert!(message.starts_with("Problem Statement:\nstatement text\n\n"));
        assert!(message.contains("Previous attempts and their failures:\n"));
        assert!(message.contains("\nAttempt 2:\n"));
        assert!(message.contains("Code: int main(){ return 1; }\n"));
        assert!(message.contains("Verdict: Wrong answer on test 3\n"));
        assert!(message.contains("Hint: Check the empty-input case.\n"));
        assert!(message.ends_with("\nPlease fix the issues and provide an improved solution."));
    }

    #[test]
    fn test_retry_request_omits_missing_sections() {
        let previous = AttemptRecord::new(1);
        let message = retry_request("s", &previous);
        assert!(message.contains("Code: N/A\n"));
        assert!(message.contains("Verdict: Unknown\n"));
        assert!(!message.contains("Error Details:"));
        assert!(!message.contains("Hint:"));
    }

    #[test]
    fn test_error_details_formats_per_test_diagnostics() {
        let mut attempt = AttemptRecord::new(1);
        let mut response = JudgeResponse::from_verdict("Wrong answer on test 2");
        response.per_test_details = vec![
            TestOutcome {
                test_number: 1,
                verdict: "OK".to_string(),
                expected: None,
                got: None,
            },
            TestOutcome {
                test_number: 2,
                verdict: "Wrong answer".to_string(),
                expected: Some("4".to_string()),
                got: Some("5".to_string()),
            },
        ];
        attempt.judge_response = Some(response);

        let details = error_details(&attempt);
        assert!(details.starts_with("Test Results:\n"));
        assert!(details.contains("Test 1: OK\n"));
        assert!(details.contains("Test 2: Wrong answer\n  Expected: 4\n  Got: 5\n"));
    }

    #[test]
    fn test_error_details_includes_submission_error() {
        let mut attempt = AttemptRecord::new(1);
        attempt.submission_error = Some("submit endpoint returned 503".to_string());

        let details = error_details(&attempt);
        assert!(details.contains("Submission Error: submit endpoint returned 503"));
    }

    #[test]
    fn test_error_details_fallback_when_nothing_known() {
        let attempt = AttemptRecord::new(1);
        assert_eq!(error_details(&attempt), "No detailed error information available");
    }

    #[test]
    fn test_hint_request_shape() {
        let message = hint_request("statement", "int main(){}", "Wrong answer on test 1", "details");
        assert!(message.starts_with("Problem Statement:\nstatement\n\nFailed Solution:\nint main(){}\n\n"));
        assert!(message.contains("Verdict: Wrong answer on test 1\n\nError Details:\ndetails\n\n"));
        assert!(message.ends_with(
            "Please analyze this failure and provide specific hints on what needs to be fixed."
        ));
    }
}
