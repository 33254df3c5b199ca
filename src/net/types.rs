//! Collections, relation routes and typed records of the admin API.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::form::schema::SelectOption;
use crate::form::value::RecordId;

// =============================================================================
// ROUTES
// =============================================================================

/// Named remote record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Items,
    Categories,
    Receipts,
    Tickets,
}

impl Collection {
    pub const ALL: [Self; 4] = [Self::Items, Self::Categories, Self::Receipts, Self::Tickets];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Categories => "categories",
            Self::Receipts => "receipts",
            Self::Tickets => "tickets",
        }
    }

    /// Inverse of `path`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.path() == path)
    }
}

/// Owner/related pair routed as `{owner}/{id}/category/{categoryId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    ItemCategory,
    ReceiptCategory,
}

impl Relation {
    #[must_use]
    pub fn owner(self) -> Collection {
        match self {
            Self::ItemCategory => Collection::Items,
            Self::ReceiptCategory => Collection::Receipts,
        }
    }

    #[must_use]
    pub fn related(self) -> Collection {
        Collection::Categories
    }

    #[must_use]
    pub fn segment(self) -> &'static str {
        "category"
    }
}

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    /// Which record kind the category groups: `item` or `receipt`.
    #[serde(default)]
    pub entity: Option<String>,
}

impl Category {
    #[must_use]
    pub fn option(&self) -> SelectOption {
        SelectOption::new(self.id, self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Item {
    #[must_use]
    pub fn option(&self) -> SelectOption {
        SelectOption::new(self.id, self.name.clone())
    }

    /// Connected category id, from the nested record or the foreign key.
    #[must_use]
    pub fn category_id(&self) -> Option<RecordId> {
        self.category.as_ref().map(|c| c.id).or(self.category_id)
    }
}

/// One line of a receipt. Money fields may arrive as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "number_or_string")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub unit_price: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub price: f64,
    #[serde(default)]
    pub item_id: Option<RecordId>,
    #[serde(default)]
    pub item: Option<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: RecordId,
    pub name: String,
    pub store: String,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_date: OffsetDateTime,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Receipt {
    /// Sum of purchase prices.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.purchases.iter().map(|p| p.price).sum()
    }
}

/// One line of a ticket: a priced item bought on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPurchase {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "number_or_string")]
    pub price: f64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub purchase_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub item_id: Option<RecordId>,
    #[serde(default)]
    pub item: Option<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub store: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub creation_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub purchases: Vec<TicketPurchase>,
}

impl Ticket {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.purchases.iter().map(|p| p.price).sum()
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Select options for a record list, in server order.
#[must_use]
pub fn category_options(categories: &[Category]) -> Vec<SelectOption> {
    categories.iter().map(Category::option).collect()
}

#[must_use]
pub fn item_options(items: &[Item]) -> Vec<SelectOption> {
    items.iter().map(Item::option).collect()
}

/// `$1,234.50` style amount.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round();
    let whole = format!("{:.0}", (cents / 100.0).trunc());
    let fraction = format!("{:02.0}", cents % 100.0);
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}
