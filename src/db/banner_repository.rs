//! SQLite implementation of [`BannerStore`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::{with_deadline, BannerStore};
use crate::errors::AppError;
use crate::models::{Banner, BannerFilter, Content, PreBanner};

/// Upper bound on bind parameters per tag lookup.
const TAG_LOOKUP_CHUNK: usize = 500;

/// Banner repository backed by a SQLite pool.
#[derive(Clone)]
pub struct BannerRepository {
    pool: SqlitePool,
    deadline: Duration,
}

impl BannerRepository {
    pub fn new(pool: SqlitePool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }

    async fn insert_banner(&self, pre_banner: &PreBanner, author_id: i64) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO banner (author_id, feature_id, title, text, url, is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(author_id)
        .bind(pre_banner.feature_id)
        .bind(&pre_banner.content.title)
        .bind(&pre_banner.content.text)
        .bind(&pre_banner.content.url)
        .bind(pre_banner.is_active)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let banner_id = result.last_insert_rowid();

        for tag_id in &pre_banner.tag_ids {
            sqlx::query("INSERT INTO banner_tag (banner_id, tag_id) VALUES (?, ?)")
                .bind(banner_id)
                .bind(*tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(banner_id, author_id, "banner created");
        Ok(banner_id)
    }

    async fn select_content(&self, banner_id: i64) -> Result<Content, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT title, text, url FROM banner WHERE id = ?")
            .bind(banner_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("banner {} not found", banner_id)))?;

        Ok(Content {
            title: row.try_get("title")?,
            text: row.try_get("text")?,
            url: row.try_get("url")?,
        })
    }

    async fn replace_banner(
        &self,
        pre_banner: &PreBanner,
        banner_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE banner SET
                feature_id = ?, title = ?, text = ?, url = ?, is_active = ?, updated_at = ?
            WHERE id = ? AND author_id = ?"#,
        )
        .bind(pre_banner.feature_id)
        .bind(&pre_banner.content.title)
        .bind(&pre_banner.content.text)
        .bind(&pre_banner.content.url)
        .bind(pre_banner.is_active)
        .bind(Utc::now())
        .bind(banner_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        // Missing and foreign-owned banners are reported the same way.
        if result.rows_affected() == 0 {
            return Err(AppError::NoRowsAffected(format!(
                "banner {} not found",
                banner_id
            )));
        }

        tx.commit().await?;

        tracing::info!(banner_id, user_id, "banner updated");
        Ok(())
    }

    async fn remove_banner(&self, banner_id: i64, user_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM banner WHERE id = ? AND author_id = ?")
            .bind(banner_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NoRowsAffected(format!(
                "banner {} not found",
                banner_id
            )));
        }

        tx.commit().await?;

        tracing::info!(banner_id, user_id, "banner deleted");
        Ok(())
    }

    async fn select_banners(&self, filter: BannerFilter) -> Result<Vec<Banner>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT b.id, b.feature_id, b.title, b.text, b.url, b.is_active, b.created_at, b.updated_at FROM banner b",
        );
        push_filter(&mut query, &filter);
        query
            .push(" ORDER BY b.id LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset));

        let rows = query.build().fetch_all(&mut *tx).await?;
        let mut banners = rows
            .iter()
            .map(banner_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<i64> = banners.iter().map(|b| b.banner_id).collect();
        let mut tags = select_tag_ids(&mut *tx, &ids).await?;
        for banner in &mut banners {
            banner.tag_ids = tags.remove(&banner.banner_id).unwrap_or_default();
        }

        tx.commit().await?;

        Ok(banners)
    }
}

#[async_trait]
impl BannerStore for BannerRepository {
    async fn add_banner(&self, pre_banner: &PreBanner, author_id: i64) -> Result<i64, AppError> {
        with_deadline(self.deadline, "add banner", self.insert_banner(pre_banner, author_id)).await
    }

    async fn get_banner(&self, banner_id: i64) -> Result<Content, AppError> {
        with_deadline(self.deadline, "get banner", self.select_content(banner_id)).await
    }

    async fn update_banner(
        &self,
        pre_banner: &PreBanner,
        banner_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        with_deadline(
            self.deadline,
            "update banner",
            self.replace_banner(pre_banner, banner_id, user_id),
        )
        .await
    }

    async fn delete_banner(&self, banner_id: i64, user_id: i64) -> Result<(), AppError> {
        with_deadline(self.deadline, "delete banner", self.remove_banner(banner_id, user_id)).await
    }

    async fn get_banners_list(&self, filter: BannerFilter) -> Result<Vec<Banner>, AppError> {
        with_deadline(self.deadline, "list banners", self.select_banners(filter)).await
    }
}

/// Append the optional feature/tag restrictions. Zero means "no filter".
fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &BannerFilter) {
    if filter.tag_id != 0 {
        query.push(" JOIN banner_tag bt ON bt.banner_id = b.id");
    }

    let mut clause = " WHERE ";
    if filter.feature_id != 0 {
        query
            .push(clause)
            .push("b.feature_id = ")
            .push_bind(filter.feature_id);
        clause = " AND ";
    }
    if filter.tag_id != 0 {
        query.push(clause).push("bt.tag_id = ").push_bind(filter.tag_id);
    }
}

/// Fetch the tag ids of every listed banner, grouped by banner id.
async fn select_tag_ids(
    conn: &mut SqliteConnection,
    banner_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, AppError> {
    let mut tags: HashMap<i64, Vec<i64>> = HashMap::new();

    for chunk in banner_ids.chunks(TAG_LOOKUP_CHUNK) {
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT banner_id, tag_id FROM banner_tag WHERE banner_id IN (");
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY banner_id, tag_id");

        let rows = query.build().fetch_all(&mut *conn).await?;
        for row in rows {
            let banner_id: i64 = row.try_get("banner_id")?;
            let tag_id: i64 = row.try_get("tag_id")?;
            tags.entry(banner_id).or_default().push(tag_id);
        }
    }

    Ok(tags)
}

fn banner_from_row(row: &SqliteRow) -> Result<Banner, sqlx::Error> {
    Ok(Banner {
        banner_id: row.try_get("id")?,
        tag_ids: Vec::new(),
        feature_id: row.try_get("feature_id")?,
        content: Content {
            title: row.try_get("title")?,
            text: row.try_get("text")?,
            url: row.try_get("url")?,
        },
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
