//! Cost Query Handlers

use crate::application::error::ApplicationError;
use crate::application::queries::cost_queries::EstimateDialogueCostQuery;
use crate::domain::audio_tags::{estimate_cost, CostEstimate};

/// EstimateDialogueCost Handler
#[derive(Debug, Default)]
pub struct EstimateDialogueCostHandler;

impl EstimateDialogueCostHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        query: EstimateDialogueCostQuery,
    ) -> Result<CostEstimate, ApplicationError> {
        Ok(estimate_cost(&query.lines, query.mode))
    }
}
