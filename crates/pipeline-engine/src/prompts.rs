//! Prompt templates for the three reasoning stages.
//!
//! Wording is treated as configuration the core substitutes into: these
//! strings exist only so the executor has something concrete to send.
//! Deployments are expected to override them; nothing here is
//! schema-load-bearing.

use pipeline_types::{DevOutput, Issue, PmOutput};

const PM_SYSTEM: &str = "You are the Product Manager stage of an automated issue pipeline. \
Read the issue and respond with a single JSON object: \
{\"summary\": string, \"acceptance_criteria\": [string, ...], \"plan\": [string, ...], \"assumptions\": [string, ...]}. \
acceptance_criteria and plan must each have at least one entry.";

const DEV_SYSTEM: &str = "You are the Developer stage of an automated issue pipeline. \
Given the issue and the PM's plan, respond with a single JSON object: \
{\"files\": [{\"path\": string, \"content\": string, \"language\": string}, ...], \"notes\": [string, ...]}.";

const QA_SYSTEM: &str = "You are the QA stage of an automated issue pipeline. \
Given the issue, the PM's plan, and the Developer's files, respond with a single JSON object: \
{\"verdict\": \"pass\" | \"fail\" | \"needs-human\", \"findings\": [string, ...], \"suggested_changes\": [string, ...]}.";

#[must_use]
pub fn pm_system() -> &'static str {
    PM_SYSTEM
}

#[must_use]
pub fn dev_system() -> &'static str {
    DEV_SYSTEM
}

#[must_use]
pub fn qa_system() -> &'static str {
    QA_SYSTEM
}

#[must_use]
pub fn pm_user(issue: &Issue) -> String {
    format!(
        "Issue {issue_id} ({repo}#{number}): {title}\n\nBody:\n{body}\n\nLabels: {labels}\nURL: {url}",
        issue_id = issue.issue_id,
        repo = issue.repo,
        number = issue.issue_number,
        title = issue.title,
        body = issue.body,
        labels = issue.labels.join(", "),
        url = issue.url,
    )
}

#[must_use]
pub fn dev_user(issue: &Issue, pm: &PmOutput) -> String {
    format!(
        "Issue: {title}\n\nPM summary: {summary}\n\nAcceptance criteria:\n{criteria}\n\nPlan:\n{plan}",
        title = issue.title,
        summary = pm.summary,
        criteria = bullet_list(&pm.acceptance_criteria),
        plan = bullet_list(&pm.plan),
    )
}

#[must_use]
pub fn qa_user(issue: &Issue, pm: &PmOutput, dev: &DevOutput) -> String {
    let files = dev
        .files
        .iter()
        .map(|f| format!("--- {} ({}) ---\n{}", f.path, f.language, f.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Issue: {title}\n\nAcceptance criteria:\n{criteria}\n\nFiles:\n{files}\n\nDev notes:\n{notes}",
        title = issue.title,
        criteria = bullet_list(&pm.acceptance_criteria),
        notes = bullet_list(&dev.notes),
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_types::IssueSource;

    fn issue() -> Issue {
        Issue::new("x/y#1", "x/y", 1, "Add dark mode", "body", vec!["ui".to_string()], "https://x", IssueSource::Mock).unwrap()
    }

    #[test]
    fn pm_user_includes_issue_title_and_labels() {
        let prompt = pm_user(&issue());
        assert!(prompt.contains("Add dark mode"));
        assert!(prompt.contains("ui"));
    }

    #[test]
    fn dev_user_includes_pm_plan() {
        let pm = PmOutput::fallback("x");
        let prompt = dev_user(&issue(), &pm);
        assert!(prompt.contains("Re-run or refine prompts"));
    }

    #[test]
    fn qa_user_embeds_file_contents() {
        let pm = PmOutput::fallback("x");
        let dev = DevOutput { files: vec![pipeline_types::FileArtifact { path: "a.rs".to_string(), content: "fn main() {}".to_string(), language: "rust".to_string() }], notes: vec![] };
        let prompt = qa_user(&issue(), &pm, &dev);
        assert!(prompt.contains("a.rs"));
        assert!(prompt.contains("fn main"));
    }
}
