//! Rust structs that represent database table mappings.
//!
//! Row types are read with `from_row`; the small status enums are stored as
//! text and converted with `ToSql`/`FromSql`. Everything here is `Serialize`
//! so it can be handed to the templates directly.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::Serialize;

/// Declares a text-backed enum with `as_str`/`parse` and SQLite conversions.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                $name::parse(text).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {} {:?}", stringify!($name), text).into())
                })
            }
        }
    };
}

text_enum!(
    /// Account role; sellers are promoted by an admin.
    Role {
        Customer => "customer",
        Seller => "seller",
        Admin => "admin",
    }
);

text_enum!(
    ProductStatus {
        Available => "available",
        SoldOut => "sold_out",
        Archived => "archived",
    }
);

text_enum!(
    OrderStatus {
        Placed => "placed",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
);

text_enum!(
    PaymentMethod {
        Card => "card",
        Invoice => "invoice",
        CashOnDelivery => "cash_on_delivery",
    }
);

text_enum!(
    SellerStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

impl OrderStatus {
    /// Allowed admin transitions.
    pub fn can_become(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Placed, Shipped) | (Shipped, Delivered) | (Placed, Cancelled) | (Shipped, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            name: row.get("name")?,
            password_hash: row.get("password_hash")?,
            role: row.get("role")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    pub status: ProductStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            seller_id: row.get("seller_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            category: row.get("category")?,
            price_cents: row.get("price_cents")?,
            stock: row.get("stock")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Available && self.stock > 0
    }
}

/// Fields a seller edits; shared by create and update.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: Option<i64>,
    pub guest_token: Option<String>,
}

/// One cart row joined with its product.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub stock: i64,
    pub status: ProductStatus,
    pub line_total_cents: i64,
}

impl CartLine {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let unit_price_cents: i64 = row.get("price_cents")?;
        let quantity: i64 = row.get("quantity")?;
        Ok(Self {
            product_id: row.get("product_id")?,
            name: row.get("name")?,
            unit_price_cents,
            quantity,
            stock: row.get("stock")?,
            status: row.get("status")?,
            line_total_cents: unit_price_cents.saturating_mul(quantity),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: i64,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: Option<i64>,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub method: PaymentMethod,
    pub card_holder: Option<String>,
    pub card_last4: Option<String>,
    pub amount_cents: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub method: PaymentMethod,
    pub card_holder: Option<String>,
    pub card_last4: Option<String>,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub address_id: i64,
    pub payment_id: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: String,
}

impl Order {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            email: row.get("email")?,
            address_id: row.get("address_id")?,
            payment_id: row.get("payment_id")?,
            total_cents: row.get("total_cents")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Order row plus the number of units, for history lists.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellerProfile {
    pub user_id: i64,
    pub shop_name: String,
    pub description: String,
    pub status: SellerStatus,
    pub created_at: String,
}

impl SellerProfile {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            shop_name: row.get("shop_name")?,
            description: row.get("description")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Seller application joined with the applicant, for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SellerApplication {
    #[serde(flatten)]
    pub profile: SellerProfile,
    pub email: String,
    pub name: String,
}

/// A watched product with the price remembered at observation time.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub product_id: i64,
    pub product_name: String,
    pub observed_price_cents: i64,
    pub current_price_cents: i64,
    pub price_changed: bool,
    pub status: ProductStatus,
}

/// An observer to notify after a price change.
#[derive(Debug, Clone, Serialize)]
pub struct Observer {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub observed_price_cents: i64,
}
