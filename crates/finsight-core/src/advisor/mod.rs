//! Advice service
//!
//! [`Advisor`] ties the store, the context engine, the insight and
//! recommendation batteries and the chat path together. Every call loads
//! the user's ledger fresh from the injected [`Store`].
//!
//! ## Chat path
//!
//! 1. Validate the message (non-empty, at most 500 characters)
//! 2. Refuse a second question while one is in flight for the same user
//! 3. Build the current-month snapshot
//! 4. Ask the LLM once, if a client is configured
//! 5. On any LLM failure or blank reply, answer from the rule table
//! 6. Append the exchange to the conversation log
//!
//! A failure in step 6 is logged and the reply is still returned.

pub mod prompt;
pub mod rules;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{AIClient, ChatBackend};
use crate::analysis::{analyze, spending_breakdown, Analysis, AnalysisKind, SpendingBreakdown};
use crate::config::AdvisorConfig;
use crate::context::{budget_progress, BudgetProgress, FinancialContext, Ledger};
use crate::error::{Error, Result};
use crate::export::{latest_transactions, ChatExport, FinancialReport, ReportUser};
use crate::insights::{Insight, InsightContext, InsightEngine};
use crate::models::{validate_chat_message, Conversation, Transaction};
use crate::period::{DateWindow, Period};
use crate::recommendations::{generate_recommendations, Recommendation};
use crate::store::{new_id, Store};
use crate::trend::{compute_trend, TrendOutcome};

pub use prompt::build_prompt;
pub use rules::{route, ChatTopic, RuleAnswer, ERROR_FALLBACK};

/// Recent transactions shown on the dashboard
pub const DASHBOARD_RECENT_LIMIT: usize = 5;

/// Where a chat reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Llm,
    Rules,
    /// Generic apology when the user's data could not be loaded
    Fallback,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Llm => "llm",
            ReplySource::Rules => "rules",
            ReplySource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer to a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorReply {
    pub response: String,
    pub source: ReplySource,
    /// Topic the rule table routed to, when the rules answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<ChatTopic>,
    pub conversation: Conversation,
    /// False when appending to the conversation log failed
    pub saved: bool,
}

/// Home screen summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month: FinancialContext,
    pub budgets: Vec<BudgetProgress>,
    pub insights: Vec<Insight>,
    pub recent_transactions: Vec<Transaction>,
}

/// Removes the user from the in-flight set when dropped
struct InFlightGuard<'a> {
    users: &'a Mutex<HashSet<String>>,
    user_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut users) = self.users.lock() {
            users.remove(&self.user_id);
        }
    }
}

/// Advice service over an injected store and optional LLM client
pub struct Advisor {
    store: Arc<dyn Store>,
    ai: Option<AIClient>,
    config: AdvisorConfig,
    in_flight: Mutex<HashSet<String>>,
}

impl Advisor {
    pub fn new(store: Arc<dyn Store>, ai: Option<AIClient>, config: AdvisorConfig) -> Self {
        match &ai {
            Some(client) => info!(model = client.model(), host = client.host(), "LLM advice enabled"),
            None => info!("No LLM configured, using rule-based advice"),
        }
        Self {
            store,
            ai,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn has_llm(&self) -> bool {
        self.ai.is_some()
    }

    fn ledger(&self, user_id: &str) -> Result<Ledger> {
        Ledger::load(self.store.as_ref(), user_id)
    }

    fn begin_request(&self, user_id: &str) -> Result<InFlightGuard<'_>> {
        let mut users = self
            .in_flight
            .lock()
            .map_err(|_| Error::InvalidData("In-flight lock poisoned".into()))?;
        if !users.insert(user_id.to_string()) {
            return Err(Error::RequestInFlight(user_id.to_string()));
        }
        Ok(InFlightGuard {
            users: &self.in_flight,
            user_id: user_id.to_string(),
        })
    }

    // ========== Chat ==========

    /// Answer a chat message and record the exchange
    pub async fn ask(&self, user_id: &str, message: &str, today: NaiveDate) -> Result<AdvisorReply> {
        let question = validate_chat_message(message)?;
        let _guard = self.begin_request(user_id)?;

        let (response, source, topic) = match self.ledger(user_id) {
            Ok(ledger) => self.answer(&ledger, question, today).await,
            Err(e) => {
                warn!(user = user_id, error = %e, "Failed to load ledger for chat");
                (ERROR_FALLBACK.to_string(), ReplySource::Fallback, None)
            }
        };

        let (conversation, saved) =
            match self.store.append_conversation(user_id, question, &response) {
                Ok(conversation) => (conversation, true),
                Err(e) => {
                    warn!(user = user_id, error = %e, "Failed to save conversation");
                    (
                        Conversation {
                            id: new_id(),
                            user_id: user_id.to_string(),
                            user_message: question.to_string(),
                            ai_response: response.clone(),
                            timestamp: chrono::Utc::now(),
                        },
                        false,
                    )
                }
            };

        Ok(AdvisorReply {
            response,
            source,
            topic,
            conversation,
            saved,
        })
    }

    async fn answer(
        &self,
        ledger: &Ledger,
        question: &str,
        today: NaiveDate,
    ) -> (String, ReplySource, Option<ChatTopic>) {
        let month = ledger.context(DateWindow::month_of(today));

        if let Some(ref client) = self.ai {
            let prompt = build_prompt(&month, ledger.transactions.len(), question);
            match client.complete(&self.config.llm.system_prompt, &prompt).await {
                Ok(text) => {
                    debug!(model = client.model(), "Answered from LLM");
                    return (text, ReplySource::Llm, None);
                }
                Err(e) => {
                    warn!(error = %e, "LLM request failed, falling back to rules");
                }
            }
        }

        let RuleAnswer { topic, text } = rules::answer(question, &month, &self.config.thresholds);
        debug!(topic = topic.as_str(), "Answered from rules");
        (text, ReplySource::Rules, Some(topic))
    }

    /// Rule-table answer for `question` without touching the LLM or the log
    pub fn rule_answer(&self, user_id: &str, question: &str, today: NaiveDate) -> Result<RuleAnswer> {
        let ledger = self.ledger(user_id)?;
        let month = ledger.context(DateWindow::month_of(today));
        Ok(rules::answer(question, &month, &self.config.thresholds))
    }

    pub fn history(&self, user_id: &str) -> Result<Vec<Conversation>> {
        self.store.list_conversations(user_id)
    }

    pub fn clear_history(&self, user_id: &str) -> Result<usize> {
        let removed = self.store.clear_conversations(user_id)?;
        info!(user = user_id, removed, "Cleared chat history");
        Ok(removed)
    }

    pub fn export_history(&self, user_id: &str) -> Result<ChatExport> {
        Ok(ChatExport {
            user: ReportUser::lookup(self.store.as_ref(), user_id)?.name,
            export_date: chrono::Utc::now(),
            conversations: self.history(user_id)?,
        })
    }

    // ========== Insights & analysis ==========

    /// Advisor insight battery for the month containing `today`
    pub fn insights(&self, user_id: &str, today: NaiveDate) -> Result<Vec<Insight>> {
        let ledger = self.ledger(user_id)?;
        let ctx = InsightContext::new(&ledger, &self.config.thresholds, today);
        Ok(InsightEngine::advisor().run(&ctx))
    }

    /// Dashboard insight battery for the month containing `today`
    pub fn dashboard_insights(&self, user_id: &str, today: NaiveDate) -> Result<Vec<Insight>> {
        let ledger = self.ledger(user_id)?;
        let ctx = InsightContext::new(&ledger, &self.config.thresholds, today);
        Ok(InsightEngine::dashboard().run(&ctx))
    }

    pub fn dashboard(&self, user_id: &str, today: NaiveDate) -> Result<Dashboard> {
        let ledger = self.ledger(user_id)?;
        let ctx = InsightContext::new(&ledger, &self.config.thresholds, today);
        let insights = InsightEngine::dashboard().run(&ctx);
        Ok(Dashboard {
            month: ctx.month,
            budgets: budget_progress(&ledger.transactions, &ledger.budgets, &ledger.categories, today),
            insights,
            recent_transactions: latest_transactions(&ledger.transactions, DASHBOARD_RECENT_LIMIT),
        })
    }

    pub fn recommendations(&self, user_id: &str, today: NaiveDate) -> Result<Vec<Recommendation>> {
        let ledger = self.ledger(user_id)?;
        let month = ledger.context(DateWindow::month_of(today));
        Ok(generate_recommendations(&month, &self.config.thresholds))
    }

    pub fn analysis(&self, user_id: &str, kind: AnalysisKind, today: NaiveDate) -> Result<Analysis> {
        let ledger = self.ledger(user_id)?;
        Ok(analyze(kind, &ledger, &self.config.thresholds, today))
    }

    pub fn breakdown(&self, user_id: &str, period: Period, today: NaiveDate) -> Result<SpendingBreakdown> {
        let ledger = self.ledger(user_id)?;
        Ok(spending_breakdown(&ledger, period, today))
    }

    /// Snapshot over an arbitrary window
    pub fn context(&self, user_id: &str, window: DateWindow) -> Result<FinancialContext> {
        Ok(self.ledger(user_id)?.context(window))
    }

    pub fn trend(&self, user_id: &str, months_back: u32, today: NaiveDate) -> Result<TrendOutcome> {
        let ledger = self.ledger(user_id)?;
        Ok(compute_trend(&ledger.transactions, months_back, today))
    }

    /// Full report for the month containing `today`
    pub fn report(&self, user_id: &str, today: NaiveDate) -> Result<FinancialReport> {
        let ledger = self.ledger(user_id)?;
        let ctx = InsightContext::new(&ledger, &self.config.thresholds, today);
        let insights = InsightEngine::advisor().run(&ctx);
        let recommendations = generate_recommendations(&ctx.month, &self.config.thresholds);
        Ok(FinancialReport::new(
            ReportUser::lookup(self.store.as_ref(), user_id)?,
            ctx.month,
            insights,
            recommendations,
            &ledger.transactions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::models::MAX_CHAT_MESSAGE_LEN;
    use crate::store::MemoryStore;
    use crate::ai::MockBackend;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .import_transactions(
                "u1",
                vec![
                    income(5000.0, date(2024, 3, 1)),
                    expense(4800.0, "food", date(2024, 3, 5)),
                ],
            )
            .unwrap();
        store
    }

    fn advisor(store: Arc<MemoryStore>, ai: Option<AIClient>) -> Advisor {
        Advisor::new(store, ai, AdvisorConfig::default())
    }

    #[tokio::test]
    async fn test_rules_without_llm() {
        let store = seeded_store();
        let advisor = advisor(store.clone(), None);

        let reply = advisor.ask("u1", "  How can I save?  ", date(2024, 3, 20)).await.unwrap();
        assert_eq!(reply.source, ReplySource::Rules);
        assert_eq!(reply.topic, Some(ChatTopic::Savings));
        assert!(reply.response.starts_with("Your current savings rate is 4.0%"));
        assert!(reply.saved);

        let history = store.list_conversations("u1").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_message, "How can I save?");
        assert_eq!(history[0].ai_response, reply.response);
    }

    #[tokio::test]
    async fn test_llm_reply_used() {
        let store = seeded_store();
        let advisor = advisor(store, Some(AIClient::mock("Put 10% aside.")));
        let reply = advisor.ask("u1", "How can I save?", date(2024, 3, 20)).await.unwrap();
        assert_eq!(reply.source, ReplySource::Llm);
        assert_eq!(reply.response, "Put 10% aside.");
        assert_eq!(reply.topic, None);
    }

    #[tokio::test]
    async fn test_llm_failure_equals_rules() {
        let store = seeded_store();
        let mock = MockBackend::failing();
        let advisor = advisor(store, Some(AIClient::Mock(mock.clone())));
        let today = date(2024, 3, 20);

        let reply = advisor.ask("u1", "Is my budget ok?", today).await.unwrap();
        let expected = advisor.rule_answer("u1", "Is my budget ok?", today).unwrap();
        assert_eq!(mock.calls(), 1);
        assert_eq!(reply.source, ReplySource::Rules);
        assert_eq!(reply.response, expected.text);
    }

    #[tokio::test]
    async fn test_http_500_falls_back_to_rules() {
        use crate::ai::OpenAICompatibleBackend;
        use crate::config::LlmConfig;
        use crate::test_utils::MockChatServer;

        let server = MockChatServer::failing(500).await;
        let llm = LlmConfig {
            base_url: server.url(),
            ..LlmConfig::default()
        };
        let backend = OpenAICompatibleBackend::new(&llm, Some("test-key")).unwrap();
        let advisor = advisor(seeded_store(), Some(AIClient::OpenAICompatible(backend)));
        let today = date(2024, 3, 20);

        for question in ["How can I reduce my budget and save more?", "Tell me a joke"] {
            let reply = advisor.ask("u1", question, today).await.unwrap();
            let expected = advisor.rule_answer("u1", question, today).unwrap();
            assert!(!reply.response.is_empty());
            assert_eq!(reply.source, ReplySource::Rules);
            assert_eq!(reply.response, expected.text);
        }
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_messages_rejected() {
        let store = seeded_store();
        let advisor = advisor(store.clone(), None);
        let today = date(2024, 3, 20);

        assert!(matches!(
            advisor.ask("u1", "   ", today).await,
            Err(Error::InvalidInput(_))
        ));
        let long = "a".repeat(MAX_CHAT_MESSAGE_LEN + 1);
        assert!(matches!(
            advisor.ask("u1", &long, today).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(store.list_conversations("u1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_guard() {
        let advisor = advisor(seeded_store(), None);
        let guard = advisor.begin_request("u1").unwrap();
        assert!(matches!(
            advisor.ask("u1", "hello", date(2024, 3, 20)).await,
            Err(Error::RequestInFlight(_))
        ));
        // other users are unaffected
        assert!(advisor.ask("u2", "hello", date(2024, 3, 20)).await.is_ok());
        drop(guard);
        assert!(advisor.ask("u1", "hello", date(2024, 3, 20)).await.is_ok());
    }

    #[test]
    fn test_insights_and_recommendations() {
        let advisor = advisor(seeded_store(), None);
        let today = date(2024, 3, 20);

        let insights = advisor.insights("u1", today).unwrap();
        let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
        assert!(titles.contains(&"No Budget Set"));
        assert!(titles.contains(&"Low Savings Rate"));

        let recs = advisor.recommendations("u1", today).unwrap();
        assert_eq!(recs[0].title, "Set Up Your First Budget");
    }

    #[test]
    fn test_dashboard_and_report() {
        let advisor = advisor(seeded_store(), None);
        let today = date(2024, 3, 20);

        let dashboard = advisor.dashboard("u1", today).unwrap();
        assert_eq!(dashboard.month.total_income, 5000.0);
        assert_eq!(dashboard.recent_transactions.len(), 2);
        assert_eq!(dashboard.recent_transactions[0].date, date(2024, 3, 5));

        let report = advisor.report("u1", today).unwrap();
        assert_eq!(report.user.name, "u1");
        assert!((report.summary.savings_rate - 4.0).abs() < 1e-9);
        assert_eq!(report.summary.budget_status, 0.0);
        assert_eq!(report.transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_history_export_and_clear() {
        let advisor = advisor(seeded_store(), None);
        advisor.ask("u1", "hi", date(2024, 3, 20)).await.unwrap();
        advisor.ask("u1", "budget?", date(2024, 3, 20)).await.unwrap();

        let export = advisor.export_history("u1").unwrap();
        assert_eq!(export.conversations.len(), 2);
        assert_eq!(export.user, "u1");

        assert_eq!(advisor.clear_history("u1").unwrap(), 2);
        assert!(advisor.history("u1").unwrap().is_empty());
    }
}
