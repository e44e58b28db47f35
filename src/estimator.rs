use crate::models::{Breakdowns, Category, CategoryShare, Comparison, EmissionInput, EmissionResult, ResultSummary};

/// Average person's monthly footprint in kg CO2e, used for the higher/lower comparison.
pub const AVERAGE_MONTHLY_KG: f64 = 500.0;

const DEFAULT_FUEL_EFFICIENCY_KM_PER_L: f64 = 10.0;
const ELECTRICITY_KG_PER_KWH: f64 = 0.5;
const DOMESTIC_FLIGHT_KG_PER_KM: f64 = 0.2;
const INTERNATIONAL_FLIGHT_KG_PER_KM: f64 = 0.15;
const DAYS_PER_MONTH: f64 = 30.0;

/// Fixed-factor monthly estimate. Never fails: zero denominators are replaced
/// with their defaults and unknown categorical values use the fallback factor.
pub fn estimate(input: &EmissionInput) -> EmissionResult {
    let raw = Breakdowns {
        transport: transport_emissions(input),
        home: home_emissions(input),
        travel: travel_emissions(input),
        lifestyle: lifestyle_emissions(input),
    };

    let highest = highest_category(&raw);
    tracing::debug!(?highest, total = raw.total(), "estimated emissions");

    EmissionResult {
        total_emissions: round1(raw.total()),
        breakdowns: Breakdowns {
            transport: round1(raw.transport),
            home: round1(raw.home),
            travel: round1(raw.travel),
            lifestyle: round1(raw.lifestyle),
        },
        recommendations: recommendations_for(highest).iter().map(|s| s.to_string()).collect(),
        highest_category: highest,
    }
}

// Only cars are modelled; other vehicle types contribute nothing.
fn transport_emissions(input: &EmissionInput) -> f64 {
    let t = &input.transport;
    if t.vehicle_type != "car" {
        return 0.0;
    }
    let fuel_factor = match t.fuel_type.as_str() {
        "gasoline" => 2.3,
        "diesel" => 2.7,
        _ => 1.1,
    };
    let liters = t.distance_km / or_default(t.fuel_efficiency_km_per_l, DEFAULT_FUEL_EFFICIENCY_KM_PER_L);
    liters * fuel_factor
}

fn home_emissions(input: &EmissionInput) -> f64 {
    let h = &input.home;
    if h.energy_type != "electricity" {
        return 0.0;
    }
    h.consumption_kwh * ELECTRICITY_KG_PER_KWH / or_default(h.residents, 1.0)
}

fn travel_emissions(input: &EmissionInput) -> f64 {
    let t = &input.travel;
    let flight_factor = if t.flight_type == "domestic" { DOMESTIC_FLIGHT_KG_PER_KM } else { INTERNATIONAL_FLIGHT_KG_PER_KM };
    t.distance_km * flight_factor / or_default(t.passengers, 1.0)
}

fn lifestyle_emissions(input: &EmissionInput) -> f64 {
    let l = &input.lifestyle;
    // kg CO2e per day
    let diet_factor = match l.diet_type.as_str() {
        "vegetarian" => 3.8,
        "vegan" => 2.9,
        _ => 7.2,
    };
    let shopping_factor = match l.shopping_frequency.as_str() {
        "minimal" => 0.5,
        "frequent" => 1.5,
        _ => 1.0,
    };
    diet_factor * DAYS_PER_MONTH * shopping_factor
}

/// Zero (and NaN) counts as "not provided".
fn or_default(value: f64, default: f64) -> f64 {
    if value == 0.0 || value.is_nan() { default } else { value }
}

/// One decimal place, halves rounded towards positive infinity.
pub fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Category with the strictly largest value above zero; the first one wins a tie.
pub fn highest_category(breakdowns: &Breakdowns) -> Option<Category> {
    let mut best: Option<Category> = None;
    let mut max = 0.0;
    for category in Category::ALL {
        let value = breakdowns.get(category);
        if value > max {
            max = value;
            best = Some(category);
        }
    }
    best
}

pub fn recommendations_for(category: Option<Category>) -> &'static [&'static str; 4] {
    match category.unwrap_or(Category::Lifestyle) {
        Category::Transport => &[
            "Consider carpooling or using public transportation",
            "Switch to a more fuel-efficient vehicle or electric car",
            "Combine errands to reduce total driving distance",
            "Use a bike for short trips when possible",
        ],
        Category::Home => &[
            "Switch to LED light bulbs throughout your home",
            "Improve home insulation to reduce energy needs",
            "Consider renewable energy sources like solar panels",
            "Unplug electronics when not in use to reduce phantom power",
        ],
        Category::Travel => &[
            "Consider taking direct flights when possible",
            "Offset your flight emissions through verified carbon offset programs",
            "Choose economy class over business or first class",
            "Consider alternatives to flying for shorter distances",
        ],
        Category::Lifestyle => &[
            "Reduce meat consumption, especially red meat",
            "Buy local and seasonal produce when possible",
            "Reduce single-use plastic consumption",
            "Practice mindful consumption and reduce unnecessary purchases",
        ],
    }
}

pub fn summarize(result: &EmissionResult) -> ResultSummary {
    let total = result.total_emissions;
    // Shares are relative to the displayed (rounded) slices.
    let slices = result.breakdowns.total();
    let shares = Category::ALL
        .iter()
        .map(|&category| {
            let kg = result.breakdowns.get(category);
            let percent = if slices > 0.0 { (kg / slices * 100.0).round() } else { 0.0 };
            CategoryShare { category, label: category.label().to_string(), kg, percent }
        })
        .collect();

    ResultSummary {
        comparison: if total > AVERAGE_MONTHLY_KG { Comparison::Higher } else { Comparison::Lower },
        average_monthly_kg: AVERAGE_MONTHLY_KG,
        highest_category: result.highest_category,
        shares,
    }
}
