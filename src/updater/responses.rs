//! JSON replies returned across the UI boundary

use serde::Serialize;

use crate::errors::UpdateError;
use crate::release::UpdateInfo;

/// Reply to `checkForUpdates`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<UpdateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResponse {
    pub fn success(info: UpdateInfo) -> Self {
        Self {
            ok: true,
            info: Some(info),
            error: None,
        }
    }

    pub fn failure(err: &UpdateError) -> Self {
        Self {
            ok: false,
            info: None,
            error: Some(err.to_string()),
        }
    }
}

/// Successful install, before it is flattened into an [`InstallResponse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub installed_version: String,
    /// Escalation strategy that ran the package manager
    pub method: String,
    pub restart_required: bool,
}

/// Reply to `installUpdate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub manual_command: Option<String>,
}

impl InstallResponse {
    pub fn success(outcome: &InstallOutcome) -> Self {
        Self {
            ok: true,
            installed_version: Some(outcome.installed_version.clone()),
            restart_required: Some(outcome.restart_required),
            error: None,
            manual_command: None,
        }
    }

    pub fn failure(err: &UpdateError) -> Self {
        Self {
            ok: false,
            installed_version: None,
            restart_required: None,
            error: Some(err.to_string()),
            manual_command: err.manual_command().map(str::to_string),
        }
    }
}

/// Reply to `restartApp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestartResponse {
    pub ok: bool,
}
