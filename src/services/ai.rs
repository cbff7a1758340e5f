use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::model::{
    attendance::AttendanceRecord, gamification::GamificationProgress, leave_request::LeaveBalance,
    role::Role, salary_slip::SalarySlip,
};
use crate::store::{AttendanceStore, GamificationStore, LeaveStore, SalaryStore, Store, StoreError};

const RECENT_ATTENDANCE: usize = 5;
const RECENT_SALARIES: usize = 2;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI Assistant is not configured on the server. API_KEY is missing.")]
    NotConfigured,

    #[error("Prompt and user are required.")]
    MissingInput,

    #[error("An error occurred while communicating with the AI.")]
    Generator(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// External text-completion backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}

/// The caller as the chat client describes it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatUser {
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub role: Role,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` over HTTP.
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(format!("generator returned {status}: {body}"));
        }

        let body: GenerateResponse = res.json().await.map_err(|e| e.to_string())?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(chars = text.len(), "Generator responded");
        Ok(text)
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Fixed assistant prompt with the caller's records embedded as JSON.
pub fn render_prompt(
    user: &ChatUser,
    attendance: &[AttendanceRecord],
    salaries: &[SalarySlip],
    leave_balance: &LeaveBalance,
    gamification: &GamificationProgress,
    query: &str,
) -> String {
    format!(
        r#"
You are an AI HR Assistant integrated into a SaaS-grade HR dashboard. Your role is to help employees check attendance, salary slips, and request leave, while enabling admins to manage analytics, exports, and employee records. Always respond in a professional, concise tone, and provide step-by-step guidance.

Here is the current user's data for context:
- User Name: {name}
- User Role: {role}
- Recent Attendance: {attendance}
- Recent Salary Slips: {salaries}
- Leave Balance: {leave_balance}
- Gamification Status: {gamification}

Based on this context, answer the following user query. Be helpful and concise.
User Query: "{query}"
"#,
        name = user.name,
        role = user.role,
        attendance = pretty(&attendance),
        salaries = pretty(&salaries),
        leave_balance = pretty(leave_balance),
        gamification = pretty(gamification),
    )
}

#[derive(Clone)]
pub struct AiGateway {
    store: Arc<dyn Store>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiGateway {
    pub fn new(store: Arc<dyn Store>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { store, generator }
    }

    pub async fn answer(
        &self,
        user: Option<&ChatUser>,
        prompt: Option<&str>,
    ) -> Result<String, AiError> {
        let generator = self.generator.as_ref().ok_or(AiError::NotConfigured)?;
        let (Some(user), Some(prompt)) = (user, prompt.filter(|p| !p.trim().is_empty())) else {
            return Err(AiError::MissingInput);
        };

        let mut attendance = self
            .store
            .attendance_for_employee(user.id, Some(RECENT_ATTENDANCE))
            .await?;
        for record in &mut attendance {
            record.check_in_photo = None;
        }

        let mut salaries = self.store.salary_slips_for_employee(user.id).await?;
        salaries.sort_by_key(|s| std::cmp::Reverse(s.period()));
        salaries.truncate(RECENT_SALARIES);

        let leave_balance = self
            .store
            .leave_balance(user.id)
            .await?
            .unwrap_or_default();
        let gamification = self.store.progress_for(user.id).await?.unwrap_or_default();

        let full_prompt = render_prompt(
            user,
            &attendance,
            &salaries,
            &leave_balance,
            &gamification,
            prompt,
        );

        info!(user_id = user.id, "Forwarding chat prompt to generator");
        generator
            .generate(&full_prompt)
            .await
            .map_err(AiError::Generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{UserStore, memory::MemoryStore, seed::seed_if_empty};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Records the last prompt and replies with a canned answer.
    #[derive(Default)]
    struct EchoGenerator {
        last_prompt: Mutex<Option<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if self.fail {
                Err("quota exceeded".into())
            } else {
                Ok("You have 12 annual days left.".into())
            }
        }
    }

    async fn jane(store: &MemoryStore) -> ChatUser {
        let user = store
            .user_by_email("employee@example.com")
            .await
            .unwrap()
            .unwrap();
        ChatUser {
            id: user.id,
            name: user.name,
            role: user.role,
        }
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        seed_if_empty(store.as_ref(), NaiveDate::from_ymd_opt(2024, 8, 1).unwrap())
            .await
            .unwrap();
        store
    }

    #[actix_web::test]
    async fn unconfigured_gateway_is_checked_before_input() {
        let store = seeded().await;
        let gateway = AiGateway::new(store, None);

        let err = gateway.answer(None, None).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
    }

    #[actix_web::test]
    async fn missing_prompt_or_user_is_rejected() {
        let store = seeded().await;
        let user = jane(&store).await;
        let gateway = AiGateway::new(store, Some(Arc::new(EchoGenerator::default())));

        assert!(matches!(
            gateway.answer(Some(&user), Some("  ")).await,
            Err(AiError::MissingInput)
        ));
        assert!(matches!(
            gateway.answer(None, Some("hi")).await,
            Err(AiError::MissingInput)
        ));
    }

    #[actix_web::test]
    async fn prompt_embeds_the_callers_recent_records() {
        let store = seeded().await;
        let user = jane(&store).await;
        let generator = Arc::new(EchoGenerator::default());
        let gateway = AiGateway::new(store, Some(generator.clone()));

        let answer = gateway
            .answer(Some(&user), Some("How many leave days do I have?"))
            .await
            .unwrap();
        assert_eq!(answer, "You have 12 annual days left.");

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("- User Name: Jane Doe"));
        assert!(prompt.contains("- User Role: employee"));
        assert!(prompt.contains("User Query: \"How many leave days do I have?\""));
        assert!(prompt.contains("\"annual\": 12"));
        assert!(prompt.contains("Punctuality Pro"));
        // newest slip first
        let may = prompt.find("\"May\"").unwrap();
        let april = prompt.find("\"April\"").unwrap();
        assert!(may < april);
    }

    #[actix_web::test]
    async fn generator_failure_maps_to_generic_error() {
        let store = seeded().await;
        let user = jane(&store).await;
        let generator = Arc::new(EchoGenerator {
            fail: true,
            ..Default::default()
        });
        let gateway = AiGateway::new(store, Some(generator));

        let err = gateway.answer(Some(&user), Some("hi")).await.unwrap_err();
        assert_eq!(err.to_string(), "An error occurred while communicating with the AI.");
    }

    #[test]
    fn attendance_photos_never_reach_the_prompt() {
        let user = ChatUser {
            id: 2,
            name: "Jane Doe".into(),
            role: Role::Employee,
        };
        let prompt = render_prompt(
            &user,
            &[AttendanceRecord::absent(2, None, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap())],
            &[],
            &LeaveBalance::default(),
            &GamificationProgress::default(),
            "hi",
        );
        assert!(!prompt.contains("checkInPhoto"));
        assert!(prompt.contains("\"sick\": 10"));
        assert!(prompt.contains("\"leaderboardRank\": null"));
    }
}
