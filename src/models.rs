use serde::{Serialize, Deserialize};
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst, Same};
use chrono::{DateTime, Utc};
use uuid::Uuid;

// --- Emission estimator ---

/// Form input for the footprint calculator. Missing sections fall back to the
/// form's initial selections with every number at zero.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EmissionInput {
    pub transport: Transport,
    pub home: Home,
    pub travel: Travel,
    pub lifestyle: Lifestyle,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Transport {
    pub vehicle_type: String, // car, motorcycle, bus, train
    pub fuel_type: String,    // gasoline, diesel, electric, hybrid
    #[serde_as(as = "DefaultOnError<PickFirst<(Same, DisplayFromStr)>>")]
    #[serde(alias = "distance")]
    pub distance_km: f64,
    #[serde_as(as = "DefaultOnError<PickFirst<(Same, DisplayFromStr)>>")]
    #[serde(alias = "fuelEfficiency")]
    pub fuel_efficiency_km_per_l: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self { vehicle_type: "car".into(), fuel_type: "gasoline".into(), distance_km: 0.0, fuel_efficiency_km_per_l: 0.0 }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Home {
    pub energy_type: String, // electricity, naturalGas, propane, solar
    #[serde_as(as = "DefaultOnError<PickFirst<(Same, DisplayFromStr)>>")]
    #[serde(rename = "consumptionKWh", alias = "consumption")]
    pub consumption_kwh: f64,
    #[serde_as(as = "DefaultOnError<PickFirst<(Same, DisplayFromStr)>>")]
    pub residents: f64,
}

impl Default for Home {
    fn default() -> Self {
        Self { energy_type: "electricity".into(), consumption_kwh: 0.0, residents: 0.0 }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Travel {
    pub flight_type: String, // domestic, international
    #[serde_as(as = "DefaultOnError<PickFirst<(Same, DisplayFromStr)>>")]
    #[serde(alias = "distance")]
    pub distance_km: f64,
    #[serde_as(as = "DefaultOnError<PickFirst<(Same, DisplayFromStr)>>")]
    pub passengers: f64,
}

impl Default for Travel {
    fn default() -> Self {
        Self { flight_type: "domestic".into(), distance_km: 0.0, passengers: 0.0 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Lifestyle {
    pub diet_type: String,          // omnivore, vegetarian, vegan
    pub shopping_frequency: String, // minimal, average, frequent
}

impl Default for Lifestyle {
    fn default() -> Self {
        Self { diet_type: "omnivore".into(), shopping_frequency: "average".into() }
    }
}

/// Emission categories in tie-break order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transport,
    Home,
    Travel,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Transport, Category::Home, Category::Travel, Category::Lifestyle];

    pub fn label(self) -> &'static str {
        match self {
            Category::Transport => "Transport",
            Category::Home => "Home",
            Category::Travel => "Travel",
            Category::Lifestyle => "Lifestyle",
        }
    }
}

/// Per-category kg CO2e.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Breakdowns {
    pub transport: f64,
    pub home: f64,
    pub travel: f64,
    pub lifestyle: f64,
}

impl Breakdowns {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Transport => self.transport,
            Category::Home => self.home,
            Category::Travel => self.travel,
            Category::Lifestyle => self.lifestyle,
        }
    }

    pub fn total(&self) -> f64 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmissionResult {
    pub total_emissions: f64,
    pub breakdowns: Breakdowns,
    pub recommendations: Vec<String>,
    /// Category the recommendations were picked for, decided on unrounded values.
    #[serde(default)]
    pub highest_category: Option<Category>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Higher,
    Lower,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: Category,
    pub label: String,
    pub kg: f64,
    pub percent: f64,
}

/// Figures shown next to a result: comparison with the average footprint and
/// the distribution chart data.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub comparison: Comparison,
    pub average_monthly_kg: f64,
    pub highest_category: Option<Category>,
    pub shares: Vec<CategoryShare>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimateResponse {
    #[serde(flatten)]
    pub result: EmissionResult,
    pub summary: ResultSummary,
}

// --- Chat ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Live,
    Fallback,
}

impl ChatMode {
    pub fn label(self) -> &'static str {
        match self {
            ChatMode::Live => "Online",
            ChatMode::Fallback => "Limited Mode",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Bot => Role::Assistant,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body posted to the remote assistant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AssistantRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AssistantReply {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub reply: ChatMessage,
    pub mode: ChatMode,
    pub mode_label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub mode: ChatMode,
    pub mode_label: String,
    pub pending: bool,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}
