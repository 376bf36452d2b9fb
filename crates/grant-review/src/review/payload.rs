//! JSON bodies exchanged between the dashboard and the review API.

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, GrantApplication, GrantApplicationStatus, SubmissionId};

/// One row of a status update batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusUpdate {
    pub id: ApplicationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<u64>,
}

/// `POST grants/update-application-status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationStatusRequest {
    pub data: Vec<ApplicationStatusUpdate>,
    pub application_status: GrantApplicationStatus,
}

impl UpdateApplicationStatusRequest {
    pub fn approve(id: ApplicationId, approved_amount: u64) -> Self {
        Self {
            data: vec![ApplicationStatusUpdate {
                id,
                approved_amount: Some(approved_amount),
            }],
            application_status: GrantApplicationStatus::Approved,
        }
    }

    pub fn reject<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = ApplicationId>,
    {
        Self {
            data: ids
                .into_iter()
                .map(|id| ApplicationStatusUpdate {
                    id,
                    approved_amount: None,
                })
                .collect(),
            application_status: GrantApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRef {
    pub id: SubmissionId,
}

/// `POST submission/reject`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectSubmissionsRequest {
    pub data: Vec<SubmissionRef>,
}

impl RejectSubmissionsRequest {
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = SubmissionId>,
    {
        Self {
            data: ids.into_iter().map(|id| SubmissionRef { id }).collect(),
        }
    }
}

/// `POST grants/record-payment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub id: ApplicationId,
    pub paid_amount: u64,
}

/// Query string of the applications list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationQuery {
    #[serde(default)]
    pub search_text: String,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default)]
    pub skip: usize,
}

fn default_length() -> usize {
    20
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            length: default_length(),
            skip: 0,
        }
    }
}

/// One page of a grant's applications plus the grant-wide total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPage {
    pub applications: Vec<GrantApplication>,
    pub total: u64,
}

/// Rows touched by a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResponse {
    pub updated: Vec<GrantApplication>,
}
