use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use farmo_core::repository::{CategoryCatalog, ProviderDirectory, RepoResult};
use farmo_core::{Category, ProviderCandidate};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    is_active: bool,
    instant_enabled: bool,
    instant_price: Option<i64>,
    instant_price_unit: String,
    instant_timeout_minutes: i32,
    instant_search_radius_km: f64,
}

pub struct PgCategoryCatalog {
    pool: PgPool,
}

impl PgCategoryCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryCatalog for PgCategoryCatalog {
    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, name, slug, is_active, instant_enabled, instant_price, instant_price_unit,
                   instant_timeout_minutes, instant_search_radius_km
            FROM categories
            WHERE slug = $1 AND is_active = TRUE
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            is_active: row.is_active,
            instant_enabled: row.instant_enabled,
            instant_price: row.instant_price,
            instant_price_unit: row.instant_price_unit.parse()?,
            instant_timeout_minutes: row.instant_timeout_minutes.max(0) as u32,
            instant_search_radius_km: row.instant_search_radius_km,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    id: Uuid,
    business_name: String,
    is_verified: bool,
    is_available: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

pub struct PgProviderDirectory {
    pool: PgPool,
}

impl PgProviderDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderDirectory for PgProviderDirectory {
    async fn instant_candidates(&self, category_id: Uuid) -> RepoResult<Vec<ProviderCandidate>> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT p.id, p.business_name, p.is_verified, p.is_available, p.latitude, p.longitude
            FROM partner_profiles p
            JOIN services s ON s.partner_id = p.id
            WHERE s.category_id = $1
              AND s.status = 'ACTIVE'
              AND p.is_verified = TRUE
              AND p.is_available = TRUE
              AND p.latitude IS NOT NULL
              AND p.longitude IS NOT NULL
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProviderCandidate {
                provider_id: row.id,
                business_name: row.business_name,
                is_verified: row.is_verified,
                is_available: row.is_available,
                latitude: row.latitude,
                longitude: row.longitude,
            })
            .collect())
    }
}
