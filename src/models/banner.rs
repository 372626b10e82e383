//! Banner model and its write-side payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for banner listings.
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Displayable part of a banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// A stored banner together with its tag ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub banner_id: i64,
    pub tag_ids: Vec<i64>,
    pub feature_id: i64,
    pub content: Content,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated payload used to create or replace a banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreBanner {
    pub tag_ids: Vec<i64>,
    pub feature_id: i64,
    pub content: Content,
    pub is_active: bool,
}

/// Listing filter. A zero id means the dimension is not filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerFilter {
    pub feature_id: i64,
    pub tag_id: i64,
    pub limit: u32,
    pub offset: u32,
}

impl Default for BannerFilter {
    fn default() -> Self {
        Self {
            feature_id: 0,
            tag_id: 0,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// Response body for a freshly created banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedBanner {
    pub banner_id: i64,
}
