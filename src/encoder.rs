//! Estimate encoding
//!
//! Encodes a bedtime estimate into a self-describing JSON report. Reports carry
//! producer and model provenance so that output from the CLI and the FFI can be
//! traced back to the artifact that produced it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ModelInfo;
use crate::types::{BedtimeEstimate, EstimateRequest, ModelFeatures};
use crate::{PRODUCER_NAME, REST_VERSION};

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Request echoed back in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Wake time (HH:MM)
    pub wake: String,
    pub sleep_amount_hours: f64,
    pub coffee_cups: u8,
}

/// A single bedtime estimate with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub producer: ReportProducer,
    pub model: ModelInfo,
    pub computed_at_utc: String,
    pub request: ReportRequest,
    /// Features exactly as passed to the model
    pub features: ModelFeatures,
    pub actual_sleep_hours: f64,
    /// Bedtime (HH:MM)
    pub bedtime: String,
}

/// Report encoder with a stable instance id
pub struct EstimateEncoder {
    instance_id: String,
}

impl Default for EstimateEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimateEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(
        &self,
        request: &EstimateRequest,
        estimate: &BedtimeEstimate,
        model: ModelInfo,
    ) -> EstimateReport {
        EstimateReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: REST_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            model,
            computed_at_utc: Utc::now().to_rfc3339(),
            request: ReportRequest {
                wake: request.wake.to_string(),
                sleep_amount_hours: request.sleep_amount.hours(),
                coffee_cups: request.coffee.cups(),
            },
            features: request.features(),
            actual_sleep_hours: estimate.actual_sleep_hours,
            bedtime: estimate.display(),
        }
    }

    /// Encode to compact JSON
    pub fn encode_to_json(
        &self,
        request: &EstimateRequest,
        estimate: &BedtimeEstimate,
        model: ModelInfo,
    ) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.encode(request, estimate, model))
    }
}
