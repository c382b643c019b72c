//! `SeaORM` entity prelude

pub use super::price_history::Entity as PriceHistory;
pub use super::products::Entity as Products;
pub use super::sale_items::Entity as SaleItems;
pub use super::sales::Entity as Sales;
