use serde::{Deserialize, Serialize};

/// Full menu item snapshot as served by `GET /api/menu`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Menu item reference embedded in an order line.
///
/// Incremental order events often carry only `{"id": n}`; every field
/// except the id is optional and gets backfilled from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl MenuItemRef {
    /// Bare reference carrying only the id.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            name: None,
            price: None,
            category: None,
            description: None,
            image_url: None,
            available: None,
        }
    }

    /// A reference missing display data that the cache should backfill.
    pub fn is_partial(&self) -> bool {
        self.name.is_none() || self.price.is_none()
    }

    /// Promote to a full snapshot when the payload carried one.
    pub fn as_full(&self) -> Option<MenuItem> {
        Some(MenuItem {
            id: self.id,
            name: self.name.clone()?,
            price: self.price?,
            category: self.category.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            available: self.available.unwrap_or(true),
        })
    }
}

impl From<MenuItem> for MenuItemRef {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            name: Some(item.name),
            price: Some(item.price),
            category: item.category,
            description: item.description,
            image_url: item.image_url,
            available: Some(item.available),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_reference_deserializes_from_bare_id() {
        let r: MenuItemRef = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert!(r.is_partial());
        assert!(r.as_full().is_none());
    }

    #[test]
    fn full_reference_round_trips() {
        let item = MenuItem {
            id: 3,
            name: "Ramen".into(),
            price: 12.5,
            category: Some("Mains".into()),
            description: None,
            image_url: None,
            available: true,
        };
        let r = MenuItemRef::from(item.clone());
        assert!(!r.is_partial());
        assert_eq!(r.as_full(), Some(item));
    }
}
