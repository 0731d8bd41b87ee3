//! Cost-of-living lookup
//!
//! A provider maps a city to a grocery index (100 = average). Lookups never
//! block the pipeline: `grocery_index_or_average` falls back to 100.

use crate::error::BudgetError;
use crate::models::CostOfLiving;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Index used whenever a lookup fails or has no data
pub const AVERAGE_GROCERY_INDEX: f64 = 100.0;

/// Index the static provider reports for cities it has no entry for
pub const DEFAULT_STATIC_INDEX: f64 = 75.0;

#[async_trait]
pub trait CostOfLivingProvider: Send + Sync {
    async fn lookup(&self, city: &str) -> Result<Option<CostOfLiving>>;
}

/// Resolve a grocery index, substituting the average on any failure
pub async fn grocery_index_or_average(provider: &dyn CostOfLivingProvider, city: &str) -> f64 {
    match provider.lookup(city).await {
        Ok(Some(cost)) => cost.grocery_index,
        Ok(None) => {
            debug!(city, "No cost of living data, using average index");
            AVERAGE_GROCERY_INDEX
        }
        Err(e) => {
            warn!(city, error = %e, "Cost of living lookup failed, using average index");
            AVERAGE_GROCERY_INDEX
        }
    }
}

/// Fixed table of indexes, no network
pub struct StaticCostOfLiving {
    default_index: Option<f64>,
    overrides: HashMap<String, f64>,
}

impl StaticCostOfLiving {
    pub fn new() -> Self {
        Self {
            default_index: Some(DEFAULT_STATIC_INDEX),
            overrides: HashMap::new(),
        }
    }

    /// Only the listed cities resolve; everything else has no data
    pub fn only(cities: &[(&str, f64)]) -> Self {
        let mut provider = Self {
            default_index: None,
            overrides: HashMap::new(),
        };
        for (city, index) in cities {
            provider = provider.with_city(city, *index);
        }
        provider
    }

    pub fn with_city(mut self, city: &str, grocery_index: f64) -> Self {
        self.overrides.insert(city.to_lowercase(), grocery_index);
        self
    }
}

impl Default for StaticCostOfLiving {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CostOfLivingProvider for StaticCostOfLiving {
    async fn lookup(&self, city: &str) -> Result<Option<CostOfLiving>> {
        let index = self
            .overrides
            .get(&city.to_lowercase())
            .copied()
            .or(self.default_index);

        Ok(index.map(|grocery_index| CostOfLiving {
            city: city.to_string(),
            grocery_index,
        }))
    }
}

/// Cost-of-living service reached over HTTP:
/// `GET {base}/cost_of_living?city=...` answering `{"city", "grocery_index"}`
#[derive(Clone)]
pub struct HttpCostOfLiving {
    client: Client,
    base_url: String,
}

impl HttpCostOfLiving {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CostOfLivingProvider for HttpCostOfLiving {
    async fn lookup(&self, city: &str) -> Result<Option<CostOfLiving>> {
        let url = format!("{}/cost_of_living", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("city", city)])
            .send()
            .await
            .map_err(|e| {
                BudgetError::CostOfLivingError(format!("Request for {} failed: {}", city, e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BudgetError::CostOfLivingError(format!(
                "Cost of living service returned {} for {}: {}",
                status, city, body
            )));
        }

        let cost: Option<CostOfLiving> = response.json().await.map_err(|e| {
            BudgetError::CostOfLivingError(format!("Invalid cost of living response: {}", e))
        })?;

        Ok(cost)
    }
}
