use crate::assistant::Assistant;
use crate::models::{AssistantRequest, ChatMessage, ChatMode, HistoryEntry, Sender, SessionView};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const GREETING: &str = "Hi there! I'm EcoBot, your sustainability assistant. Ask me anything about carbon emissions, sustainable practices, or how to reduce your environmental footprint!";

pub const SUGGESTIONS: [&str; 5] = [
    "How can I reduce my carbon footprint?",
    "What are the most sustainable food choices?",
    "Tell me about renewable energy options for my home",
    "How does air travel impact the environment?",
    "What is the carbon footprint of HDPE material?",
];

pub const UNPROCESSED_REPLY: &str = "Sorry, I couldn't process your request at this time.";
pub const CONNECTION_LOST_REPLY: &str = "Sorry, I'm having trouble connecting to my knowledge base. I'll continue in a limited mode with general information only.";
pub const GENERIC_FALLBACK_REPLY: &str = "That's an interesting question about sustainability! While I'm currently in offline mode with limited knowledge, I typically provide information on various sustainability topics, calculate emissions for specific activities, and offer personalized recommendations based on your lifestyle. My full capabilities require connection to my knowledge base.";

/// Messages forwarded to the assistant as context.
const HISTORY_WINDOW: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")] EmptyMessage,
    #[error("a reply is still pending")] Busy,
    #[error("session not found")] NotFound,
}

/// Offline topics, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Plastics,
    CarbonFootprint,
    Food,
    Energy,
    Travel,
    Commute,
}

const TOPIC_KEYWORDS: [(Topic, &[&str]); 6] = [
    (Topic::Plastics, &["hdpe", "plastic"]),
    (Topic::CarbonFootprint, &["carbon", "footprint"]),
    (Topic::Food, &["food", "diet"]),
    (Topic::Energy, &["energy", "electricity"]),
    (Topic::Travel, &["travel", "flight", "airplane"]),
    (Topic::Commute, &["commute", "car"]),
];

impl Topic {
    pub fn reply(self) -> &'static str {
        match self {
            Topic::Plastics => "**HDPE (High-Density Polyethylene) Emissions Data:**\n\nThe carbon footprint of HDPE production is approximately 1.8-2.1 kg CO2e per kg of material. This is lower than many other plastics like PET (2.7 kg CO2e/kg) or PVC (2.9 kg CO2e/kg).\n\n**Real-world equivalents:**\n- 2 kg of CO2e is equivalent to driving a car for ~8 miles (13 km)\n- Or running a laptop for about 10 days\n\n**Bio-HDPE** made from sugarcane or other plant materials can have 70-80% lower emissions compared to fossil-based HDPE.",
            Topic::CarbonFootprint => "Carbon footprint is the total amount of greenhouse gases that are generated by our actions. The average person's carbon footprint is about 4 tons per year. You can reduce your carbon footprint by using public transportation, reducing meat consumption, and choosing energy-efficient appliances.",
            Topic::Food => "Food choices have a significant impact on your carbon footprint. Plant-based diets generally have a lower carbon footprint than meat-heavy diets. Beef and lamb are particularly carbon-intensive. Consider reducing your meat consumption and opting for locally-grown, seasonal produce when possible.",
            Topic::Energy => "Switching to renewable energy sources like solar or wind power can significantly reduce your carbon footprint. You can also reduce your energy consumption by using energy-efficient appliances, turning off lights and electronics when not in use, and improving your home's insulation.",
            Topic::Travel => "Air travel has a significant carbon footprint. A single round-trip flight from New York to London emits about 1.5 tons of CO2 per passenger. Consider alternatives like video conferencing or train travel when possible, and if you must fly, consider offsetting your emissions through verified carbon offset programs.",
            Topic::Commute => "The carbon footprint of your daily commute depends on your mode of transportation and distance. Driving a gasoline car produces about 0.4 kg of CO2 per mile. Consider carpooling, using public transportation, biking, or walking to reduce your commute's environmental impact.",
        }
    }
}

/// Case-insensitive substring match; the first topic with a hit wins.
pub fn classify(text: &str) -> Option<Topic> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
}

pub fn fallback_reply(text: &str) -> &'static str {
    classify(text).map_or(GENERIC_FALLBACK_REPLY, Topic::reply)
}

/// The last few messages as assistant context, oldest first.
pub fn history_window(history: &[ChatMessage]) -> Vec<HistoryEntry> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|m| HistoryEntry { role: m.sender.into(), content: m.text.clone() })
        .collect()
}

/// Produces the bot reply for one user message and the mode to continue in.
/// A failed live call answers with an apology and switches to fallback.
pub async fn respond<A: Assistant + ?Sized>(
    assistant: &A,
    user_text: &str,
    mode: ChatMode,
    history: &[ChatMessage],
) -> (String, ChatMode) {
    match mode {
        ChatMode::Fallback => (fallback_reply(user_text).to_string(), ChatMode::Fallback),
        ChatMode::Live => {
            let request = AssistantRequest { message: user_text.to_string(), history: history_window(history) };
            match assistant.ask(&request).await {
                Ok(reply) => {
                    info!("✅ Assistant replied");
                    (reply.unwrap_or_else(|| UNPROCESSED_REPLY.to_string()), ChatMode::Live)
                }
                Err(e) => {
                    warn!("⚠️ Assistant unavailable, switching to fallback mode: {}", e);
                    (CONNECTION_LOST_REPLY.to_string(), ChatMode::Fallback)
                }
            }
        }
    }
}

/// Snapshot taken when a user message is accepted; the reply is computed
/// from it without holding the session.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub text: String,
    pub mode: ChatMode,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    mode: ChatMode,
    pending: bool,
    probed: bool,
    messages: Vec<ChatMessage>,
    last_id: i64,
    last_active: DateTime<Utc>,
}

impl ChatSession {
    /// Starts in fallback mode with the greeting until the probe reports back.
    pub fn new(id: Uuid) -> Self {
        let mut session = Self {
            id,
            created_at: Utc::now(),
            mode: ChatMode::Fallback,
            pending: false,
            probed: false,
            messages: Vec::new(),
            last_id: 0,
            last_active: Utc::now(),
        };
        session.push(GREETING.to_string(), Sender::Bot);
        session
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// No message for at least `ttl` and no reply in flight.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.pending && now.signed_duration_since(self.last_active) >= ttl
    }

    /// Only the first probe result counts.
    pub fn apply_probe(&mut self, reachable: bool) {
        if self.probed {
            return;
        }
        self.probed = true;
        self.mode = if reachable { ChatMode::Live } else { ChatMode::Fallback };
        info!(session = %self.id, mode = ?self.mode, "📡 Probe applied");
    }

    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.pending {
            return Err(ChatError::Busy);
        }
        let start = self.messages.len().saturating_sub(HISTORY_WINDOW);
        let history = self.messages[start..].to_vec();
        self.push(text.to_string(), Sender::User);
        self.pending = true;
        Ok(PendingTurn { text: text.to_string(), mode: self.mode, history })
    }

    /// Appends the bot reply. The mode can only move from live to fallback here.
    pub fn complete_turn(&mut self, text: String, mode: ChatMode) -> ChatMessage {
        if mode == ChatMode::Fallback && self.mode == ChatMode::Live {
            warn!(session = %self.id, "⚠️ Session switched to fallback mode");
            self.mode = ChatMode::Fallback;
        }
        self.pending = false;
        self.push(text, Sender::Bot)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            mode: self.mode,
            mode_label: self.mode.label().to_string(),
            pending: self.is_pending(),
            messages: self.messages().to_vec(),
            created_at: self.created_at,
        }
    }

    fn push(&mut self, text: String, sender: Sender) -> ChatMessage {
        let message = ChatMessage { id: self.next_id(), text, sender, timestamp: Utc::now() };
        self.last_active = message.timestamp;
        self.messages.push(message.clone());
        message
    }

    // Epoch millis, bumped when two messages land in the same millisecond.
    fn next_id(&mut self) -> String {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }
}
