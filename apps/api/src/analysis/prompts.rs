// Prompt text sent to the hosted assistant for each analysis.
// The assistant's own instructions live remotely; this is the per-request message.

/// Analysis prompt. Replace `{job_description}` and `{applicant_text}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Review the following job application as an independent screening reviewer.
You are NOT the hiring company. Never write in the company's voice
(no "our team", "our company", "we are excited", "join us").

Respond with exactly two sections, in this order and with these headers:

1. RECRUITER ANALYSIS
Match Score: <integer 0-100>
Key Strengths:
- <strength grounded in the application>
Gaps:
- <gap or concern relative to the job description>
Recommendation: <advance | hold | decline, with one sentence of reasoning>

2. CANDIDATE EMAIL
Subject: <subject line>
<a short, polite email to the applicant that does not reveal the score>

Keep the whole response under {max_words} words.

JOB DESCRIPTION:
{job_description}

APPLICATION (cover letter and supporting text):
{applicant_text}"#;

/// Fills the analysis template in one pass, so placeholder text inside the
/// inputs is left as written.
pub fn build_analysis_prompt(applicant_text: &str, job_description: &str, max_words: usize) -> String {
    let max_words = max_words.to_string();
    let values = [
        ("{max_words}", max_words.as_str()),
        ("{job_description}", job_description.trim()),
        ("{applicant_text}", applicant_text.trim()),
    ];

    let mut prompt = String::with_capacity(
        ANALYSIS_PROMPT_TEMPLATE.len() + applicant_text.len() + job_description.len(),
    );
    let mut rest = ANALYSIS_PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                prompt.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
    }
    prompt.push_str(rest);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_inputs_and_limit() {
        let prompt = build_analysis_prompt("  I love Rust.  ", "Rust engineer wanted", 500);
        assert!(prompt.contains("I love Rust."));
        assert!(prompt.contains("Rust engineer wanted"));
        assert!(prompt.contains("under 500 words"));
        assert!(!prompt.contains("{applicant_text}"));
    }

    #[test]
    fn test_placeholders_in_applicant_text_are_not_expanded() {
        let prompt = build_analysis_prompt("see {job_description}", "JD body", 150);
        assert!(prompt.contains("see {job_description}"));
    }

    #[test]
    fn test_placeholders_in_job_description_are_not_expanded() {
        let prompt = build_analysis_prompt("APPLICANT BODY", "paste {applicant_text} here", 150);
        assert!(prompt.contains("paste {applicant_text} here"));
        assert_eq!(prompt.matches("APPLICANT BODY").count(), 1);
    }

    #[test]
    fn test_every_template_placeholder_is_filled() {
        let prompt = build_analysis_prompt("a", "b", 150);
        assert!(!prompt.contains("{max_words}"));
        assert!(!prompt.contains("{job_description}"));
        assert!(!prompt.contains("{applicant_text}"));
    }
}
