//! Banner use cases.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::BannerStore;
use crate::errors::AppError;
use crate::models::{Banner, BannerFilter, Content};
use crate::sanitize::HtmlSanitizer;
use crate::validation::validate_pre_banner;

/// Entry point the HTTP layer uses for banners.
#[async_trait]
pub trait BannerService: Send + Sync {
    /// Validate a raw payload and store it; returns the new banner id.
    async fn add_banner(&self, body: &[u8], author_id: i64) -> Result<i64, AppError>;

    async fn get_banner(&self, banner_id: i64) -> Result<Content, AppError>;

    async fn update_banner(&self, body: &[u8], banner_id: i64, user_id: i64)
        -> Result<(), AppError>;

    async fn delete_banner(&self, banner_id: i64, user_id: i64) -> Result<(), AppError>;

    async fn get_banners_list(&self, filter: BannerFilter) -> Result<Vec<Banner>, AppError>;
}

pub struct BannerManager {
    store: Arc<dyn BannerStore>,
    sanitizer: HtmlSanitizer,
}

impl BannerManager {
    pub fn new(store: Arc<dyn BannerStore>, sanitizer: HtmlSanitizer) -> Self {
        Self { store, sanitizer }
    }

    fn sanitize(&self, content: Content) -> Content {
        Content {
            title: self.sanitizer.clean(&content.title),
            text: self.sanitizer.clean(&content.text),
            url: self.sanitizer.clean(&content.url),
        }
    }
}

#[async_trait]
impl BannerService for BannerManager {
    async fn add_banner(&self, body: &[u8], author_id: i64) -> Result<i64, AppError> {
        let pre_banner = validate_pre_banner(body).map_err(|e| e.context("add banner"))?;

        self.store
            .add_banner(&pre_banner, author_id)
            .await
            .map_err(|e| e.context("add banner"))
    }

    async fn get_banner(&self, banner_id: i64) -> Result<Content, AppError> {
        let content = self
            .store
            .get_banner(banner_id)
            .await
            .map_err(|e| e.context("get banner"))?;

        Ok(self.sanitize(content))
    }

    async fn update_banner(
        &self,
        body: &[u8],
        banner_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        let pre_banner = validate_pre_banner(body).map_err(|e| e.context("update banner"))?;

        self.store
            .update_banner(&pre_banner, banner_id, user_id)
            .await
            .map_err(|e| e.context("update banner"))
    }

    async fn delete_banner(&self, banner_id: i64, user_id: i64) -> Result<(), AppError> {
        self.store
            .delete_banner(banner_id, user_id)
            .await
            .map_err(|e| e.context("delete banner"))
    }

    async fn get_banners_list(&self, filter: BannerFilter) -> Result<Vec<Banner>, AppError> {
        let banners = self
            .store
            .get_banners_list(filter)
            .await
            .map_err(|e| e.context("list banners"))?;

        Ok(banners
            .into_iter()
            .map(|banner| Banner {
                content: self.sanitize(banner.content),
                ..banner
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::models::PreBanner;

    /// In-memory store that records how often it was asked to write.
    #[derive(Default)]
    struct FakeBannerStore {
        rows: Mutex<BTreeMap<i64, (i64, PreBanner)>>,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl BannerStore for FakeBannerStore {
        async fn add_banner(&self, pre_banner: &PreBanner, author_id: i64) -> Result<i64, AppError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            let id = rows.keys().last().copied().unwrap_or(0) + 1;
            rows.insert(id, (author_id, pre_banner.clone()));
            Ok(id)
        }

        async fn get_banner(&self, banner_id: i64) -> Result<Content, AppError> {
            self.rows
                .lock()
                .unwrap()
                .get(&banner_id)
                .map(|(_, b)| b.content.clone())
                .ok_or_else(|| AppError::NotFound(format!("banner {banner_id} not found")))
        }

        async fn update_banner(
            &self,
            pre_banner: &PreBanner,
            banner_id: i64,
            user_id: i64,
        ) -> Result<(), AppError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            match self.rows.lock().unwrap().get_mut(&banner_id) {
                Some((author, stored)) if *author == user_id => {
                    *stored = pre_banner.clone();
                    Ok(())
                }
                _ => Err(AppError::NoRowsAffected(format!("banner {banner_id} not found"))),
            }
        }

        async fn delete_banner(&self, banner_id: i64, user_id: i64) -> Result<(), AppError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            match rows.get(&banner_id) {
                Some((author, _)) if *author == user_id => {
                    rows.remove(&banner_id);
                    Ok(())
                }
                _ => Err(AppError::NoRowsAffected(format!("banner {banner_id} not found"))),
            }
        }

        async fn get_banners_list(&self, filter: BannerFilter) -> Result<Vec<Banner>, AppError> {
            let now = Utc::now();
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, (_, b))| filter.feature_id == 0 || b.feature_id == filter.feature_id)
                .map(|(id, (_, b))| Banner {
                    banner_id: *id,
                    tag_ids: b.tag_ids.clone(),
                    feature_id: b.feature_id,
                    content: b.content.clone(),
                    is_active: b.is_active,
                    created_at: now,
                    updated_at: now,
                })
                .collect())
        }
    }

    fn service() -> (BannerManager, Arc<FakeBannerStore>) {
        let store = Arc::new(FakeBannerStore::default());
        let service = BannerManager::new(store.clone(), HtmlSanitizer::new());
        (service, store)
    }

    fn payload(title: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "tag_ids": [1],
            "feature_id": 3,
            "content": {"title": title, "text": "Body", "url": "https://example.com"},
            "is_active": true
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get_round_trip() {
        let (service, _store) = service();
        let id = service.add_banner(&payload("  Title  "), 1).await.unwrap();

        let content = service.get_banner(id).await.unwrap();
        assert_eq!(content.title, "Title");
        assert_eq!(content.text, "Body");
        assert_eq!(content.url, "https://example.com");
    }

    #[tokio::test]
    async fn test_invalid_payload_never_reaches_store() {
        let (service, store) = service();

        let err = service.add_banner(b"{}", 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("add banner")));

        let err = service.update_banner(b"[", 1, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(ref m) if m.starts_with("update banner")));

        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_sanitizes_content() {
        let (service, _store) = service();
        let id = service
            .add_banner(&payload("Hi<script>alert(1)</script>"), 1)
            .await
            .unwrap();

        assert_eq!(service.get_banner(id).await.unwrap().title, "Hi");
    }

    #[tokio::test]
    async fn test_list_sanitizes_every_banner() {
        let (service, _store) = service();
        service.add_banner(&payload("<script>x</script>One"), 1).await.unwrap();
        service.add_banner(&payload("Two<script>y</script>"), 1).await.unwrap();

        let titles: Vec<String> = service
            .get_banners_list(BannerFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.content.title)
            .collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_store_errors_carry_stage() {
        let (service, _store) = service();

        let err = service.get_banner(5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "get banner: banner 5 not found"));

        let err = service.delete_banner(5, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NoRowsAffected(ref m) if m.starts_with("delete banner")));
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_rejected() {
        let (service, _store) = service();
        let id = service.add_banner(&payload("Mine"), 1).await.unwrap();

        let err = service.update_banner(&payload("Theirs"), id, 2).await.unwrap_err();
        assert!(matches!(err, AppError::NoRowsAffected(_)));
        assert_eq!(service.get_banner(id).await.unwrap().title, "Mine");
    }
}
