use mongodb::bson::{doc, Document};
use serde::Deserialize;

pub const REPORT_PENDING: &str = "Pending";
pub const REPORT_DELIVERED: &str = "Delivered";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Projection of a stored booking used to address the delivery email
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotice {
    #[serde(default)]
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub report_link: Option<String>,
}

/// Body of `PATCH /booking/status/{id}`; the value is stored in `report`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateReportRequest {
    pub status: String,
}

impl UpdateReportRequest {
    pub fn is_delivered(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(REPORT_DELIVERED)
    }

    /// Canonical casing for the two known states, anything else verbatim
    pub fn report_value(&self) -> String {
        let trimmed = self.status.trim();
        if trimmed.eq_ignore_ascii_case(REPORT_DELIVERED) {
            REPORT_DELIVERED.to_string()
        } else if trimmed.eq_ignore_ascii_case(REPORT_PENDING) {
            REPORT_PENDING.to_string()
        } else {
            self.status.clone()
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingSearchQuery {
    /// Case-insensitive substring of the patient email
    pub search: Option<String>,
}

impl BookingSearchQuery {
    pub fn filter(&self) -> Document {
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => doc! {
                "patientInfo.email": {
                    "$regex": regex::escape(term),
                    "$options": "i",
                }
            },
            _ => doc! {},
        }
    }
}
