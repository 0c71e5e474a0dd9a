use crate::{
    error::{AppError, AppResult},
    models::{category, Category, CategoryModel},
    services::cache::CacheService,
    utils::slugify,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

const CACHE_KEY_CATEGORIES: &str = "categories:list";
const CACHE_TTL_CATEGORIES: u64 = 300; // 5 minutes

pub struct CategoryService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Active categories in display order.
    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<Vec<CategoryModel>>(CACHE_KEY_CATEGORIES).await {
                return Ok(cached);
            }
        }

        let categories = Category::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;

        if let Some(cache) = &self.cache {
            cache
                .set(CACHE_KEY_CATEGORIES, &categories, CACHE_TTL_CATEGORIES)
                .await;
        }

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CategoryModel> {
        Category::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Lookup by slug; soft-deleted categories read as missing.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<CategoryModel> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        name: &str,
        description: &str,
        icon: Option<String>,
        color: Option<String>,
        sort_order: i32,
    ) -> AppResult<CategoryModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_category = category::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            slug: sea_orm::ActiveValue::Set(slugify(name)),
            description: sea_orm::ActiveValue::Set(description.to_string()),
            icon: sea_orm::ActiveValue::Set(icon.unwrap_or_else(|| "💬".to_string())),
            color: sea_orm::ActiveValue::Set(color.unwrap_or_else(|| "#4ADE80".to_string())),
            post_count: sea_orm::ActiveValue::Set(0),
            is_active: sea_orm::ActiveValue::Set(true),
            sort_order: sea_orm::ActiveValue::Set(sort_order),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let created = new_category.insert(&self.db).await?;
        self.invalidate_list_cache().await;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<String>,
        description: Option<String>,
        icon: Option<String>,
        color: Option<String>,
        is_active: Option<bool>,
        sort_order: Option<i32>,
    ) -> AppResult<CategoryModel> {
        let existing = self.get_by_id(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = name {
            active.slug = sea_orm::ActiveValue::Set(slugify(&name));
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(description) = description {
            active.description = sea_orm::ActiveValue::Set(description);
        }
        if let Some(icon) = icon {
            active.icon = sea_orm::ActiveValue::Set(icon);
        }
        if let Some(color) = color {
            active.color = sea_orm::ActiveValue::Set(color);
        }
        if let Some(is_active) = is_active {
            active.is_active = sea_orm::ActiveValue::Set(is_active);
        }
        if let Some(sort_order) = sort_order {
            active.sort_order = sea_orm::ActiveValue::Set(sort_order);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        self.invalidate_list_cache().await;
        Ok(updated)
    }

    /// Categories are never hard-deleted while posts may reference them;
    /// deactivation hides them from listings and slug lookups.
    pub async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: category::ActiveModel = existing.into();
        active.is_active = sea_orm::ActiveValue::Set(false);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        self.invalidate_list_cache().await;
        Ok(())
    }

    async fn invalidate_list_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(CACHE_KEY_CATEGORIES).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_derived_from_name() {
        assert_eq!(slugify("Web Development"), "web-development");
    }

    #[test]
    fn cache_key_is_stable() {
        assert_eq!(CACHE_KEY_CATEGORIES, "categories:list");
    }
}
