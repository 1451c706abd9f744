//! Menu item model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::max_amount;

/// A dish or drink on the menu
///
/// Category is a free-text label; grouping is by exact string match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl MenuItem {
    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        validate_fields(&self.name, self.price)
    }
}

/// Payload for adding a menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl NewMenuItem {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_fields(&self.name, self.price)
    }

    pub fn into_menu_item(self, id: String, created_at: DateTime<Utc>) -> MenuItem {
        MenuItem {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            description: self.description,
            available: self.available,
            created_at,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.available.is_none()
    }

    /// Apply to a copy of `item`, validating the result
    pub fn apply_to(&self, item: &MenuItem) -> Result<MenuItem, CoreError> {
        let mut updated = item.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }
        if let Some(price) = self.price {
            updated.price = price;
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(available) = self.available {
            updated.available = available;
        }
        updated.validate()?;
        Ok(updated)
    }
}

fn validate_fields(name: &str, price: Decimal) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidMenuItem {
            reason: "name must not be empty".to_string(),
        });
    }
    if price < Decimal::ZERO {
        return Err(CoreError::InvalidMenuItem {
            reason: format!("price {} is negative", price),
        });
    }
    if price > max_amount() {
        return Err(CoreError::InvalidMenuItem {
            reason: format!("price {} exceeds the amount limit", price),
        });
    }
    Ok(())
}

/// Distinct categories of available items, in first-seen order
pub fn available_categories(items: &[MenuItem]) -> Vec<&str> {
    let mut categories: Vec<&str> = Vec::new();
    for item in items.iter().filter(|item| item.available) {
        if !categories.contains(&item.category.as_str()) {
            categories.push(&item.category);
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(name: &str, category: &str, available: bool) -> MenuItem {
        MenuItem {
            id: format!("id-{}", name),
            name: name.to_string(),
            category: category.to_string(),
            price: Decimal::from(5),
            description: String::new(),
            available,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_available_categories_first_seen_order() {
        let items = vec![
            item("Lassi", "Drinks", true),
            item("Samosa", "Starters", true),
            item("Chai", "Drinks", true),
            item("Kulfi", "Desserts", false),
        ];

        assert_eq!(available_categories(&items), vec!["Drinks", "Starters"]);
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let original = item("Lassi", "Drinks", true);
        let update = MenuItemUpdate {
            price: Some(Decimal::new(450, 2)),
            available: Some(false),
            ..Default::default()
        };

        let updated = update.apply_to(&original).unwrap();
        assert_eq!(updated.name, "Lassi");
        assert_eq!(updated.price, Decimal::new(450, 2));
        assert!(!updated.available);
        assert!(!update.is_empty());
        assert!(MenuItemUpdate::default().is_empty());
    }

    #[test]
    fn test_update_rejects_negative_price() {
        let original = item("Lassi", "Drinks", true);
        let update = MenuItemUpdate {
            price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(matches!(
            update.apply_to(&original),
            Err(CoreError::InvalidMenuItem { .. })
        ));

        let too_large = MenuItemUpdate {
            price: Some(max_amount() + Decimal::ONE),
            ..Default::default()
        };
        assert!(matches!(
            too_large.apply_to(&original),
            Err(CoreError::InvalidMenuItem { .. })
        ));
    }

    #[test]
    fn test_new_menu_item_defaults_available() {
        let json = r#"{"name": "Vada", "category": "Starters", "price": 2.5}"#;
        let new_item: NewMenuItem = serde_json::from_str(json).unwrap();
        assert!(new_item.available);
        assert!(new_item.validate().is_ok());
    }
}
