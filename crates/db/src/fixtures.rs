//! Deterministic demo catalog for local development and smoke checks.

use advisor_core::domain::product::{Product, ProductId};

use crate::repositories::{CatalogRepository, RepositoryError, SqlCatalogRepository};
use crate::DbPool;

pub struct SeedResult {
    pub products_written: usize,
}

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    brand: &'static str,
    cpu: &'static str,
    gpu: &'static str,
    ram: &'static str,
    storage: &'static str,
    os: &'static str,
    price: f64,
    cpu_score: f64,
    gpu_score: f64,
    ram_gb: f64,
    storage_gb: f64,
}

const SEED_CATALOG: &[SeedProduct] = &[
    SeedProduct {
        id: "seed-legion-5",
        name: "Legion 5",
        brand: "Lenovo",
        cpu: "Ryzen 7 7735HS",
        gpu: "RTX 4060",
        ram: "16GB DDR5",
        storage: "512GB NVMe",
        os: "Windows 11",
        price: 1099.0,
        cpu_score: 78.0,
        gpu_score: 72.0,
        ram_gb: 16.0,
        storage_gb: 512.0,
    },
    SeedProduct {
        id: "seed-nitro-5",
        name: "Nitro 5",
        brand: "Acer",
        cpu: "i5-12500H",
        gpu: "RTX 3050",
        ram: "16GB DDR4",
        storage: "512GB NVMe",
        os: "Windows 11",
        price: 849.0,
        cpu_score: 68.0,
        gpu_score: 61.0,
        ram_gb: 16.0,
        storage_gb: 512.0,
    },
    SeedProduct {
        id: "seed-aspire-3",
        name: "Aspire 3",
        brand: "Acer",
        cpu: "Ryzen 5 7520U",
        gpu: "Radeon 610M",
        ram: "8GB LPDDR5",
        storage: "256GB NVMe",
        os: "Windows 11",
        price: 449.0,
        cpu_score: 52.0,
        gpu_score: 22.0,
        ram_gb: 8.0,
        storage_gb: 256.0,
    },
    SeedProduct {
        id: "seed-macbook-air",
        name: "MacBook Air M2",
        brand: "Apple",
        cpu: "Apple M2",
        gpu: "M2 10-core",
        ram: "16GB unified",
        storage: "512GB SSD",
        os: "macOS",
        price: 1299.0,
        cpu_score: 82.0,
        gpu_score: 58.0,
        ram_gb: 16.0,
        storage_gb: 512.0,
    },
    SeedProduct {
        id: "seed-thinkpad-e14",
        name: "ThinkPad E14",
        brand: "Lenovo",
        cpu: "i5-1335U",
        gpu: "Iris Xe",
        ram: "16GB DDR4",
        storage: "512GB NVMe",
        os: "Windows 11",
        price: 769.0,
        cpu_score: 63.0,
        gpu_score: 28.0,
        ram_gb: 16.0,
        storage_gb: 512.0,
    },
    SeedProduct {
        id: "seed-ideapad-3",
        name: "IdeaPad 3",
        brand: "Lenovo",
        cpu: "i3-1215U",
        gpu: "UHD Graphics",
        ram: "8GB DDR4",
        storage: "256GB NVMe",
        os: "Windows 11",
        price: 379.0,
        cpu_score: 46.0,
        gpu_score: 15.0,
        ram_gb: 8.0,
        storage_gb: 256.0,
    },
];

impl SeedProduct {
    fn to_product(&self) -> Product {
        Product {
            id: ProductId(self.id.to_string()),
            name: self.name.to_string(),
            brand: self.brand.to_string(),
            category: "Laptop".to_string(),
            cpu: self.cpu.to_string(),
            gpu: self.gpu.to_string(),
            ram: self.ram.to_string(),
            storage: self.storage.to_string(),
            os: self.os.to_string(),
            price: self.price,
            url: String::new(),
            cpu_score: Some(self.cpu_score),
            gpu_score: Some(self.gpu_score),
            ram_gb: Some(self.ram_gb),
            storage_gb: Some(self.storage_gb),
        }
    }
}

/// Idempotent: re-running against an already seeded database merges instead
/// of duplicating.
pub async fn seed_catalog(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let repository = SqlCatalogRepository::new(pool.clone());
    let mut written = 0;
    for seed in SEED_CATALOG {
        use advisor_core::domain::product::UpsertOutcome;
        if repository.upsert(seed.to_product()).await? == UpsertOutcome::Created {
            written += 1;
        }
    }
    Ok(SeedResult { products_written: written })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let first = seed_catalog(&pool).await.expect("first seed");
        assert_eq!(first.products_written, SEED_CATALOG.len());

        let second = seed_catalog(&pool).await.expect("second seed");
        assert_eq!(second.products_written, 0);

        let all = SqlCatalogRepository::new(pool).load_all().await.expect("load");
        assert_eq!(all.len(), SEED_CATALOG.len());
    }
}
