use serde::{Deserialize, Serialize};

/// Placeholder brand assigned when feedback arrives for a product the catalog
/// has never seen. Merge logic treats it as overwritable.
pub const PLACEHOLDER_BRAND: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog laptop. Descriptor fields (`cpu`, `gpu`, `ram`, `storage`) are
/// free-form marketing strings; the `*_score` / `*_gb` numerics are the values
/// the rules table evaluates, and are absent for products ingested from
/// sources that do not report benchmarks (absent reads as 0 in scoring).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub gpu: String,
    #[serde(default)]
    pub ram: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<f64>,
}

fn default_category() -> String {
    "Laptop".to_string()
}

impl Product {
    /// Minimal product with placeholder descriptors, used when feedback
    /// references an id the catalog does not contain yet.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("product-{id}"),
            brand: PLACEHOLDER_BRAND.to_string(),
            id: ProductId(id),
            category: default_category(),
            cpu: String::new(),
            gpu: String::new(),
            ram: String::new(),
            storage: String::new(),
            os: String::new(),
            price: 0.0,
            url: String::new(),
            cpu_score: None,
            gpu_score: None,
            ram_gb: None,
            storage_gb: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.brand == PLACEHOLDER_BRAND || self.name.starts_with("product-")
    }

    /// Numeric attribute lookup for the requirement table. Unknown attribute
    /// names and absent values both read as 0.
    pub fn attribute(&self, name: &str) -> f64 {
        let value = match name {
            "cpu_score" => self.cpu_score,
            "gpu_score" => self.gpu_score,
            "ram_gb" => self.ram_gb,
            "storage_gb" => self.storage_gb,
            _ => None,
        };
        value.unwrap_or(0.0)
    }

    /// Fill blanks and placeholders from `other` without disturbing fields
    /// that already carry real data. Returns true when anything changed.
    pub fn merge_missing(&mut self, other: &Product) -> bool {
        let mut changed = false;

        if (self.name.is_empty() || self.name.starts_with("product-")) && !other.name.is_empty() {
            self.name = other.name.clone();
            changed = true;
        }
        if (self.brand.is_empty() || self.brand == PLACEHOLDER_BRAND)
            && !other.brand.is_empty()
            && other.brand != PLACEHOLDER_BRAND
        {
            self.brand = other.brand.clone();
            changed = true;
        }

        changed |= fill_text(&mut self.cpu, &other.cpu);
        changed |= fill_text(&mut self.gpu, &other.gpu);
        changed |= fill_text(&mut self.ram, &other.ram);
        changed |= fill_text(&mut self.storage, &other.storage);
        changed |= fill_text(&mut self.os, &other.os);
        changed |= fill_text(&mut self.url, &other.url);

        if self.price == 0.0 && other.price > 0.0 {
            self.price = other.price;
            changed = true;
        }
        changed |= fill_number(&mut self.cpu_score, other.cpu_score);
        changed |= fill_number(&mut self.gpu_score, other.gpu_score);
        changed |= fill_number(&mut self.ram_gb, other.ram_gb);
        changed |= fill_number(&mut self.storage_gb, other.storage_gb);

        changed
    }
}

fn fill_text(target: &mut String, source: &str) -> bool {
    if target.is_empty() && !source.is_empty() {
        *target = source.to_string();
        true
    } else {
        false
    }
}

fn fill_number(target: &mut Option<f64>, source: Option<f64>) -> bool {
    if target.is_none() && source.is_some() {
        *target = source;
        true
    } else {
        false
    }
}

/// Result of a catalog upsert. Callers branch on the variant instead of
/// re-querying to learn whether the row pre-existed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Row already existed and required no changes.
    Found,
    /// A new row was inserted.
    Created,
    /// Row existed and blank/placeholder fields were filled in.
    Merged,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: ProductId("lp-001".to_string()),
            name: "Legion 5".to_string(),
            brand: "Lenovo".to_string(),
            category: "Laptop".to_string(),
            cpu: "Ryzen 7 7735HS".to_string(),
            gpu: "RTX 4060".to_string(),
            ram: "16GB DDR5".to_string(),
            storage: "512GB NVMe".to_string(),
            os: "Windows 11".to_string(),
            price: 1099.0,
            url: "https://example.com/legion-5".to_string(),
            cpu_score: Some(78.0),
            gpu_score: Some(72.0),
            ram_gb: Some(16.0),
            storage_gb: Some(512.0),
        }
    }

    #[test]
    fn attribute_reads_zero_for_missing_or_unknown() {
        let mut product = sample();
        product.gpu_score = None;
        assert_eq!(product.attribute("gpu_score"), 0.0);
        assert_eq!(product.attribute("cpu_score"), 78.0);
        assert_eq!(product.attribute("battery_hours"), 0.0);
    }

    #[test]
    fn merge_fills_placeholder_identity_and_blank_fields() {
        let mut placeholder = Product::placeholder("lp-001");
        let changed = placeholder.merge_missing(&sample());

        assert!(changed);
        assert_eq!(placeholder.name, "Legion 5");
        assert_eq!(placeholder.brand, "Lenovo");
        assert_eq!(placeholder.price, 1099.0);
        assert_eq!(placeholder.ram_gb, Some(16.0));
    }

    #[test]
    fn merge_never_overwrites_known_good_data() {
        let mut product = sample();
        let mut other = sample();
        other.name = "Different Name".to_string();
        other.price = 1.0;

        let changed = product.merge_missing(&other);

        assert!(!changed);
        assert_eq!(product.name, "Legion 5");
        assert_eq!(product.price, 1099.0);
    }
}
