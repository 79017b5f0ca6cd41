pub const INTERVIEW_ROLE: &str = "full stack (React/Node)";

pub fn build_question_prompt(context: &str) -> String {
    format!(
        r#"You are an expert technical interviewer for {INTERVIEW_ROLE} roles.
Generate exactly 6 interview questions in JSON format:
- 2 easy (20s each, 1 point each)
- 2 medium (60s each, 2 points each)
- 2 hard (120s each, 3 points each)

Return strictly valid JSON array only.
Each item must have:
{{
  "question": "the question text",
  "difficulty": "easy|medium|hard",
  "expected_points": 1|2|3
}}

Keep the questions unique and relevant.
Context: {context}
"#
    )
}

pub fn build_grading_prompt(answers_json: &str, context: &str) -> String {
    format!(
        r#"You are an expert interviewer and grader.
Evaluate each answer strictly in JSON array format:
[
  {{ "questionId": "...", "score": 0-3, "feedback": "short feedback" }}
]
Also, provide a final summary about the candidate in a field "finalSummary": "<text>"

Add a final field: {{ "totalScore": <sum> }}

Answers:
{answers_json}

Candidate context: {context}
"#
    )
}
