//! Banner API endpoints.
//!
//! All routes here sit behind the principal layer, so an [`Extension<Principal>`]
//! is always present. Admin checks happen before the service is touched.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Extension,
};

use super::{param_or, parse_id, success, ApiResult, RawQuery};
use crate::auth::Principal;
use crate::models::{Banner, BannerFilter, Content, CreatedBanner, DEFAULT_LIST_LIMIT};
use crate::AppState;

pub const BANNER_UPDATED: &str = "banner updated";
pub const BANNER_DELETED: &str = "banner deleted";

/// POST /api/v1/banner/add - Create a banner owned by the caller.
pub async fn add_banner(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> ApiResult<CreatedBanner> {
    principal.require_admin()?;

    let banner_id = state.banners.add_banner(&body, principal.user_id).await?;

    success(CreatedBanner { banner_id })
}

/// GET /api/v1/banner/get?id= - Fetch the content of one banner.
pub async fn get_banner(
    State(state): State<AppState>,
    Query(query): Query<RawQuery>,
) -> ApiResult<Content> {
    let banner_id = parse_id(query.get("id").map(String::as_str), "id")?;

    success(state.banners.get_banner(banner_id).await?)
}

/// PATCH /api/v1/banner/update/{id} - Replace a banner the caller owns.
pub async fn update_banner(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<&'static str> {
    principal.require_admin()?;
    let banner_id = parse_id(Some(id.as_str()), "banner id")?;

    state
        .banners
        .update_banner(&body, banner_id, principal.user_id)
        .await?;

    success(BANNER_UPDATED)
}

/// DELETE /api/v1/banner/delete/{id} - Remove a banner the caller owns.
pub async fn delete_banner(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<&'static str> {
    principal.require_admin()?;
    let banner_id = parse_id(Some(id.as_str()), "banner id")?;

    state
        .banners
        .delete_banner(banner_id, principal.user_id)
        .await?;

    success(BANNER_DELETED)
}

/// GET /api/v1/banner/get_list - List banners filtered by feature and/or tag.
pub async fn get_banners_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<RawQuery>,
) -> ApiResult<Vec<Banner>> {
    principal.require_admin()?;

    let filter = BannerFilter {
        feature_id: param_or(&query, "feature_id", 0),
        tag_id: param_or(&query, "tag_id", 0),
        limit: param_or(&query, "limit", DEFAULT_LIST_LIMIT),
        offset: param_or(&query, "offset", 0),
    };

    success(state.banners.get_banners_list(filter).await?)
}
