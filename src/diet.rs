//! Client for the diet plan endpoint, which answers with a single
//! JSON object rather than a stream.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coach::CoachError;
use crate::core::AppConfig;

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DietPlanRequest {
    pub age: u32,
    /// Kilograms
    pub weight: u32,
    /// Centimeters
    pub height: u32,
    pub goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    pub meals: u32,
}

impl DietPlanRequest {
    pub fn validate(&self) -> Result<(), CoachError> {
        if self.age == 0 || self.weight == 0 || self.height == 0 {
            return Err(CoachError::InvalidRequest(
                "Age, weight and height are required".to_string(),
            ));
        }
        if self.goal.trim().is_empty() {
            return Err(CoachError::InvalidRequest("A goal is required".to_string()));
        }
        if self.meals == 0 {
            return Err(CoachError::InvalidRequest(
                "At least one meal is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Meal {
    pub name: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub recipe: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DietPlan {
    pub daily_calories: f64,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub shopping_list: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum DietPlanOutcome {
    Plan(DietPlan),
    /// The model's answer could not be read as a plan. Holds its text.
    Raw(String),
}

fn parse_outcome(body: &Value) -> Result<DietPlanOutcome, CoachError> {
    if body["ok"].as_bool() == Some(true) && !body["plan"].is_null() {
        let plan = &body["plan"];
        return Ok(match serde_json::from_value::<DietPlan>(plan.clone()) {
            Ok(plan) => DietPlanOutcome::Plan(plan),
            Err(e) => {
                tracing::warn!("Diet plan did not match the expected shape: {}", e);
                DietPlanOutcome::Raw(plan.to_string())
            }
        });
    }
    if let Some(raw) = body["raw"].as_str() {
        return Ok(DietPlanOutcome::Raw(raw.to_string()));
    }
    Err(CoachError::InvalidResponse(
        "Invalid response from server".to_string(),
    ))
}

#[derive(Clone, Debug)]
pub struct DietPlanClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    request_timeout: Duration,
}

impl DietPlanClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.diet_plan_url(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
        }
    }

    pub async fn generate(&self, request: &DietPlanRequest) -> Result<DietPlanOutcome, CoachError> {
        request.validate()?;
        tracing::debug!("Requesting diet plan from {}", self.url);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("Diet plan request failed with {}: {}", status, body);
            return Err(CoachError::from_status(status.as_u16(), &body));
        }

        let body: Value = serde_json::from_str(&body)
            .map_err(|e| CoachError::InvalidResponse(e.to_string()))?;
        parse_outcome(&body)
    }
}
