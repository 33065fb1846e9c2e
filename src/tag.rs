//! Invalidation tags.
//!
//! A [`TagRef`] labels a cache entry with the entity data it contains, so
//! that a mutation on one entity can find and stale every view holding
//! related data. A tag is either a concrete record (`SalesOrder:42`) or
//! the wildcard for collection views of a type (`SalesOrder:LIST`).
//! Matching is exact: `LIST` never matches a concrete id and vice versa.

use std::fmt;

/// Entity types served by the inventory/order API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Product,
    Category,
    Customer,
    Supplier,
    SalesOrder,
    PurchaseOrder,
    Invoice,
    Stock,
}

impl EntityType {
    pub const ALL: [EntityType; 8] = [
        EntityType::Product,
        EntityType::Category,
        EntityType::Customer,
        EntityType::Supplier,
        EntityType::SalesOrder,
        EntityType::PurchaseOrder,
        EntityType::Invoice,
        EntityType::Stock,
    ];

    /// Tag label, e.g. `"SalesOrder"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Product => "Product",
            EntityType::Category => "Category",
            EntityType::Customer => "Customer",
            EntityType::Supplier => "Supplier",
            EntityType::SalesOrder => "SalesOrder",
            EntityType::PurchaseOrder => "PurchaseOrder",
            EntityType::Invoice => "Invoice",
            EntityType::Stock => "Stock",
        }
    }

    /// REST collection path segment, e.g. `"sales-orders"`.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Product => "products",
            EntityType::Category => "categories",
            EntityType::Customer => "customers",
            EntityType::Supplier => "suppliers",
            EntityType::SalesOrder => "sales-orders",
            EntityType::PurchaseOrder => "purchase-orders",
            EntityType::Invoice => "invoices",
            EntityType::Stock => "stock",
        }
    }

    /// Endpoint name prefix, e.g. `"salesOrder"`.
    pub(crate) fn slug(&self) -> &'static str {
        match self {
            EntityType::Product => "product",
            EntityType::Category => "category",
            EntityType::Customer => "customer",
            EntityType::Supplier => "supplier",
            EntityType::SalesOrder => "salesOrder",
            EntityType::PurchaseOrder => "purchaseOrder",
            EntityType::Invoice => "invoice",
            EntityType::Stock => "stock",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The id half of a tag: a concrete record id or the collection wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// Any collection view of the entity type.
    List,
    /// One specific record.
    Id(String),
}

/// `(entityType, id | LIST)` label attached to cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagRef {
    pub entity: EntityType,
    pub id: TagId,
}

impl TagRef {
    /// The wildcard tag for collection views of `entity`.
    pub fn list(entity: EntityType) -> Self {
        Self {
            entity,
            id: TagId::List,
        }
    }

    /// The tag for one specific record of `entity`.
    pub fn id(entity: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity,
            id: TagId::Id(id.into()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.id, TagId::List)
    }
}

impl fmt::Display for TagRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::List => write!(f, "{}:LIST", self.entity),
            TagId::Id(id) => write!(f, "{}:{}", self.entity, id),
        }
    }
}
