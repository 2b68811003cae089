//! Turns model replies into editor-ready drafts.
//!
//! Model output is never trusted as markup: bullets go through the same
//! allow-list as stored rich text before they are returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::export::dom::{Element, Node};
use crate::generation::llm::{complete_json, LlmClient, LlmError};
use crate::generation::prompts::{summary_prompt, work_summary_prompt};
use crate::templates::rich_text::{contains_html, sanitize_html};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkSummaryReply {
    #[serde(default)]
    experience: Vec<String>,
}

/// Bullets for one experience entry, ready to drop into its `workSummary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSummaryDraft {
    pub position_title: String,
    /// Plain text of each bullet.
    pub bullets: Vec<String>,
    /// Sanitized `<ul>` fragment.
    pub work_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySuggestion {
    #[serde(alias = "experience_level", alias = "level")]
    pub experience_level: String,
    #[serde(alias = "summery")]
    pub summary: String,
}

/// One `<li>` per reply item. Items that already carry markup are sanitized,
/// bare text is wrapped.
fn bullet_item(raw: &str) -> Element {
    let nodes = if contains_html(raw) {
        sanitize_html(raw)
    } else {
        vec![Node::Text(raw.to_string())]
    };
    match nodes.as_slice() {
        [Node::Element(li)] if li.tag == "li" => li.clone(),
        _ => Element::new("li").nodes(nodes),
    }
}

pub async fn draft_work_summary(
    llm: &dyn LlmClient,
    position_title: &str,
    company_name: &str,
    work_summary: &str,
) -> Result<WorkSummaryDraft, LlmError> {
    let prompt = work_summary_prompt(position_title, company_name, work_summary);
    let reply: WorkSummaryReply = complete_json(llm, &prompt).await?;

    let items: Vec<Element> = reply
        .experience
        .iter()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(bullet_item)
        .filter(|li| !li.text_content().trim().is_empty())
        .collect();
    if items.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    let bullets = items.iter().map(|li| li.text_content().trim().to_string()).collect();
    let work_summary = Element::new("ul").children(items).outer_html();
    info!(position_title, "work summary drafted");
    Ok(WorkSummaryDraft {
        position_title: position_title.to_string(),
        bullets,
        work_summary,
    })
}

/// Summary suggestions per experience level for `job_title`. The reply may be
/// a bare array or an object holding one.
pub async fn suggest_summaries(
    llm: &dyn LlmClient,
    job_title: &str,
) -> Result<Vec<SummarySuggestion>, LlmError> {
    let reply: Value = complete_json(llm, &summary_prompt(job_title)).await?;
    let list = match reply {
        Value::Array(items) => items,
        Value::Object(fields) => fields
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or(LlmError::EmptyContent)?,
        _ => return Err(LlmError::EmptyContent),
    };

    let suggestions: Vec<SummarySuggestion> = list
        .into_iter()
        .map(serde_json::from_value::<SummarySuggestion>)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|s| !s.summary.trim().is_empty())
        .collect();
    if suggestions.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::llm::testing::CannedLlm;

    #[tokio::test]
    async fn test_work_summary_bullets_are_sanitized_into_a_list() {
        let llm = CannedLlm::new(
            r#"{"positionTitle": "Engineer", "experience": [
                "<li>Built the <strong>billing</strong> service</li>",
                "Cut p99 latency by 40%",
                "<li onclick=\"x()\">Mentored <script>alert(1)</script>two juniors</li>",
                "   "
            ]}"#,
        );
        let draft = draft_work_summary(&llm, "Engineer", "Acme", "billing").await.unwrap();
        assert_eq!(
            draft.work_summary,
            "<ul><li>Built the <strong>billing</strong> service</li><li>Cut p99 latency by 40%</li><li>Mentored two juniors</li></ul>"
        );
        assert_eq!(draft.bullets.len(), 3);
        assert_eq!(draft.bullets[1], "Cut p99 latency by 40%");
        assert!(llm.last_prompt().unwrap().contains("Company Name: \"Acme\""));
    }

    #[tokio::test]
    async fn test_work_summary_without_bullets_is_empty_content() {
        let llm = CannedLlm::new(r#"{"positionTitle": "Engineer", "experience": []}"#);
        let err = draft_work_summary(&llm, "Engineer", "Acme", "").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_summaries_accept_array_or_wrapped_array() {
        let bare = CannedLlm::new(
            r#"[{"experience_level": "Senior", "summery": "Leads teams."},
                {"experience_level": "Fresher", "summary": "Eager to learn."}]"#,
        );
        let list = suggest_summaries(&bare, "Data Analyst").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].summary, "Leads teams.");
        assert_eq!(list[1].experience_level, "Fresher");

        let wrapped = CannedLlm::new(
            r#"{"summaries": [{"experienceLevel": "Mid Level", "summary": "Ships features."}]}"#,
        );
        let list = suggest_summaries(&wrapped, "Data Analyst").await.unwrap();
        assert_eq!(list[0].experience_level, "Mid Level");
    }

    #[tokio::test]
    async fn test_summaries_reject_non_list_reply() {
        let llm = CannedLlm::new(r#""just a string""#);
        assert!(matches!(
            suggest_summaries(&llm, "Analyst").await,
            Err(LlmError::EmptyContent)
        ));
    }
}
