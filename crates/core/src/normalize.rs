//! Canonicalization of externally sourced product records.
//!
//! Live-search responses and feedback payloads arrive with a mix of English
//! and Spanish key names. Each canonical field has an ordered alias list; the
//! first non-empty value wins. Normalization runs once at every ingestion
//! boundary and everything downstream sees only the canonical shape.

use serde_json::Value;
use uuid::Uuid;

use crate::domain::product::{Product, ProductId};

/// Ordered accepted aliases per canonical field.
const TEXT_ALIASES: &[(&str, &[&str])] = &[
    ("name", &["name", "modelo"]),
    ("brand", &["brand", "marca"]),
    ("category", &["category", "categoria"]),
    ("cpu", &["cpu", "procesador"]),
    ("gpu", &["gpu", "tarjeta_grafica"]),
    ("ram", &["ram", "memoria_ram"]),
    ("storage", &["storage", "almacenamiento"]),
    ("os", &["os", "sistema_operativo"]),
    ("url", &["url", "link"]),
];

const PRICE_ALIASES: &[&str] = &["price", "precio"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "descripcion"];

/// Build a canonical [`Product`] from an arbitrary JSON object. Records with
/// no usable id get a generated `live-` id so feedback can still reference
/// them.
pub fn normalize_product(raw: &Value) -> Product {
    let id = pick_text(raw, &["id"])
        .unwrap_or_else(|| format!("live-{}", &Uuid::new_v4().simple().to_string()[..6]));

    let field = |name: &str| -> String {
        TEXT_ALIASES
            .iter()
            .find(|(canonical, _)| *canonical == name)
            .and_then(|(_, aliases)| pick_text(raw, aliases))
            .unwrap_or_default()
    };

    let category = {
        let value = field("category");
        if value.is_empty() {
            "Laptop".to_string()
        } else {
            value
        }
    };

    Product {
        id: ProductId(id),
        name: field("name"),
        brand: field("brand"),
        category,
        cpu: field("cpu"),
        gpu: field("gpu"),
        ram: field("ram"),
        storage: field("storage"),
        os: field("os"),
        price: pick_price(raw),
        url: field("url"),
        cpu_score: pick_number(raw, "cpu_score"),
        gpu_score: pick_number(raw, "gpu_score"),
        ram_gb: pick_number(raw, "ram_gb"),
        storage_gb: pick_number(raw, "storage_gb"),
    }
}

/// Natural-language description attached by the live-search collaborator.
pub fn extract_description(raw: &Value) -> Option<String> {
    pick_text(raw, DESCRIPTION_ALIASES)
}

/// Price as a non-negative float, cleaned of currency formatting.
/// Unparseable or absent values read as 0.0, never an error.
pub fn parse_price(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned = s.replace(['$', ','], "");
            cleaned.trim().parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn pick_price(raw: &Value) -> f64 {
    for alias in PRICE_ALIASES {
        if let Some(value) = raw.get(alias) {
            if !value.is_null() {
                return parse_price(value);
            }
        }
    }
    0.0
}

fn pick_text(raw: &Value, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        match raw.get(alias) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn pick_number(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64)
}
