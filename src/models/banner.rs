use serde::Deserialize;

/// Body of `PATCH /banner/{id}`; `status` is stored as `isActive`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateBannerRequest {
    pub status: bool,
}
