use sqlx::Row;

use advisor_core::domain::product::{Product, ProductId, UpsertOutcome};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, brand, category, cpu, gpu, ram, storage, os, price, url, \
                               cpu_score, gpu_score, ram_gb, storage_gb";

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());
    Ok(Product {
        id: ProductId(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        brand: row.try_get("brand").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        cpu: row.try_get("cpu").map_err(decode)?,
        gpu: row.try_get("gpu").map_err(decode)?,
        ram: row.try_get("ram").map_err(decode)?,
        storage: row.try_get("storage").map_err(decode)?,
        os: row.try_get("os").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        url: row.try_get("url").map_err(decode)?,
        cpu_score: row.try_get("cpu_score").map_err(decode)?,
        gpu_score: row.try_get("gpu_score").map_err(decode)?,
        ram_gb: row.try_get("ram_gb").map_err(decode)?,
        storage_gb: row.try_get("storage_gb").map_err(decode)?,
    })
}

async fn write_product(pool: &DbPool, product: &Product) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO products
            (id, name, brand, category, cpu, gpu, ram, storage, os, price, url,
             cpu_score, gpu_score, ram_gb, storage_gb)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            brand = excluded.brand,
            category = excluded.category,
            cpu = excluded.cpu,
            gpu = excluded.gpu,
            ram = excluded.ram,
            storage = excluded.storage,
            os = excluded.os,
            price = excluded.price,
            url = excluded.url,
            cpu_score = excluded.cpu_score,
            gpu_score = excluded.gpu_score,
            ram_gb = excluded.ram_gb,
            storage_gb = excluded.storage_gb",
    )
    .bind(product.id.as_str())
    .bind(&product.name)
    .bind(&product.brand)
    .bind(&product.category)
    .bind(&product.cpu)
    .bind(&product.gpu)
    .bind(&product.ram)
    .bind(&product.storage)
    .bind(&product.os)
    .bind(product.price)
    .bind(&product.url)
    .bind(product.cpu_score)
    .bind(product.gpu_score)
    .bind(product.ram_gb)
    .bind(product.storage_gb)
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn load_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows =
            sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY rowid"))
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_by_name_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE LOWER(name) = LOWER(?) AND LOWER(brand) = LOWER(?)
             LIMIT 1"
        ))
        .bind(name)
        .bind(brand)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn upsert(&self, product: Product) -> Result<UpsertOutcome, RepositoryError> {
        // Match by id first, then by case-insensitive name + brand, so live
        // results with generated ids still merge into known rows.
        let existing = match self.find_by_id(product.id.as_str()).await? {
            Some(found) => Some(found),
            None => self.find_by_name_brand(&product.name, &product.brand).await?,
        };

        match existing {
            None => {
                write_product(&self.pool, &product).await?;
                Ok(UpsertOutcome::Created)
            }
            Some(mut found) => {
                if found.merge_missing(&product) {
                    write_product(&self.pool, &found).await?;
                    Ok(UpsertOutcome::Merged)
                } else {
                    Ok(UpsertOutcome::Found)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlCatalogRepository::new(pool)
    }

    fn laptop(id: &str, name: &str, brand: &str) -> Product {
        let mut product = Product::placeholder(id);
        product.name = name.to_string();
        product.brand = brand.to_string();
        product.price = 999.0;
        product
    }

    #[tokio::test]
    async fn upsert_reports_created_then_found() {
        let repo = repository().await;
        let product = laptop("lp-1", "Aspire 5", "Acer");

        assert_eq!(repo.upsert(product.clone()).await.expect("first"), UpsertOutcome::Created);
        assert_eq!(repo.upsert(product).await.expect("second"), UpsertOutcome::Found);
        assert_eq!(repo.load_all().await.expect("load").len(), 1);
    }

    #[tokio::test]
    async fn upsert_merges_blank_fields_into_the_existing_row() {
        let repo = repository().await;
        let sparse = laptop("lp-2", "ThinkPad E14", "Lenovo");
        repo.upsert(sparse).await.expect("seed");

        let mut detailed = laptop("lp-2", "ThinkPad E14", "Lenovo");
        detailed.cpu = "i5-1335U".to_string();
        detailed.ram_gb = Some(16.0);
        assert_eq!(repo.upsert(detailed).await.expect("merge"), UpsertOutcome::Merged);

        let stored = repo.find_by_id("lp-2").await.expect("find").expect("exists");
        assert_eq!(stored.cpu, "i5-1335U");
        assert_eq!(stored.ram_gb, Some(16.0));
    }

    #[tokio::test]
    async fn upsert_matches_existing_rows_by_name_and_brand() {
        let repo = repository().await;
        repo.upsert(laptop("lp-3", "Swift 3", "Acer")).await.expect("seed");

        // Same laptop rediscovered by live search under a generated id.
        let rediscovered = laptop("live-abc123", "swift 3", "ACER");
        let outcome = repo.upsert(rediscovered).await.expect("upsert");

        assert_ne!(outcome, UpsertOutcome::Created);
        assert!(repo.find_by_id("live-abc123").await.expect("find").is_none());
        assert!(repo.find_by_name_brand("SWIFT 3", "acer").await.expect("find").is_some());
    }
}
