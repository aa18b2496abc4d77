//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use tracing::info;

use crate::api::RackApi;
use crate::error::{RackError, Result};
use crate::system::SystemState;

/// Horizontal and/or vertical capacity change. Unset fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleRequest {
    /// Target instance count.
    pub count: Option<u32>,
    /// Target instance type.
    pub instance_type: Option<String>,
}

impl ScaleRequest {
    /// Blank instance types are treated as unset.
    pub fn new(count: Option<u32>, instance_type: Option<String>) -> Self {
        Self {
            count,
            instance_type: instance_type.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Nothing to change.
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.instance_type.is_none()
    }

    /// Form fields sent to the rack API.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(count) = self.count {
            fields.push(("count", count.to_string()));
        }
        if let Some(instance_type) = &self.instance_type {
            fields.push(("type", instance_type.clone()));
        }
        fields
    }

    fn validate(&self) -> Result<()> {
        if self.count == Some(0) {
            return Err(RackError::InvalidArgument(
                "count must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Apply a scale request, or just report the rack when it asks for nothing.
pub async fn scale(api: &dyn RackApi, request: &ScaleRequest) -> Result<SystemState> {
    if request.is_empty() {
        return api.get_system().await;
    }
    request.validate()?;
    info!(
        count = ?request.count,
        instance_type = ?request.instance_type,
        "scaling rack"
    );
    api.scale_system(request).await
}
