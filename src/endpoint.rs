//! Endpoint descriptor table.
//!
//! Every entity type exposes `list`, `getById`, `create`, `update` and
//! `delete` operations. Each operation declares its HTTP request shape,
//! the tags a successful query response provides, and the tags a
//! successful mutation invalidates. The invalidation rules are pure
//! functions of (args, response), so cross-entity ripple effects (a sales
//! order touching its customer's cached views, an invoice touching its
//! sales order) live here as data-driven rules instead of being scattered
//! across call sites.

use std::fmt;

use reqwest::Method;
use serde_json::Value;

use crate::tag::{EntityType, TagRef};
use crate::transport::ApiRequest;
use crate::{Result, StockpileError};

// =========================================================================
// Queries
// =========================================================================

/// A read endpoint: a collection view or a single-record view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryEndpoint {
    List(EntityType),
    GetById(EntityType),
}

impl QueryEndpoint {
    pub fn entity(&self) -> EntityType {
        match self {
            QueryEndpoint::List(e) | QueryEndpoint::GetById(e) => *e,
        }
    }

    /// Stable endpoint name used in cache keys, e.g. `"salesOrder.list"`.
    pub fn name(&self) -> String {
        match self {
            QueryEndpoint::List(e) => format!("{}.list", e.slug()),
            QueryEndpoint::GetById(e) => format!("{}.getById", e.slug()),
        }
    }

    /// Build the HTTP request for this endpoint with the given arguments.
    ///
    /// List arguments become query parameters (sorted by name); `getById`
    /// requires an `id` argument that lands in the path.
    pub(crate) fn request(&self, args: &Value) -> Result<ApiRequest> {
        match self {
            QueryEndpoint::List(e) => Ok(ApiRequest {
                method: Method::GET,
                path: format!("/api/{}", e.collection()),
                query: query_params(args),
                body: None,
            }),
            QueryEndpoint::GetById(e) => {
                let id = required_id(args, "id", self.name())?;
                Ok(ApiRequest {
                    method: Method::GET,
                    path: format!("/api/{}/{}", e.collection(), id),
                    query: Vec::new(),
                    body: None,
                })
            }
        }
    }

    /// Tags a successful response provides.
    ///
    /// A list response tags itself with the collection wildcard plus one
    /// record tag per returned row; a single-record response tags itself
    /// with that record's id.
    pub fn provides(&self, args: &Value, response: &Value) -> Vec<TagRef> {
        match self {
            QueryEndpoint::List(e) => {
                let mut tags = vec![TagRef::list(*e)];
                for row in response_rows(response) {
                    if let Some(id) = value_id(row.get("id")) {
                        tags.push(TagRef::id(*e, id));
                    }
                }
                tags
            }
            QueryEndpoint::GetById(e) => {
                match arg_id(args, "id").or_else(|| value_id(response.get("id"))) {
                    Some(id) => vec![TagRef::id(*e, id)],
                    None => Vec::new(),
                }
            }
        }
    }
}

impl fmt::Display for QueryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// =========================================================================
// Mutations
// =========================================================================

/// A write endpoint plus its invalidation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationEndpoint {
    Create(EntityType),
    Update(EntityType),
    Delete(EntityType),
    /// Composite operation: derive an invoice from an existing sales order.
    InvoiceFromSalesOrder,
}

impl MutationEndpoint {
    pub fn name(&self) -> String {
        match self {
            MutationEndpoint::Create(e) => format!("{}.create", e.slug()),
            MutationEndpoint::Update(e) => format!("{}.update", e.slug()),
            MutationEndpoint::Delete(e) => format!("{}.delete", e.slug()),
            MutationEndpoint::InvoiceFromSalesOrder => "invoice.fromSalesOrder".to_string(),
        }
    }

    pub(crate) fn request(&self, args: &Value) -> Result<ApiRequest> {
        match self {
            MutationEndpoint::Create(e) => Ok(ApiRequest {
                method: Method::POST,
                path: format!("/api/{}", e.collection()),
                query: Vec::new(),
                body: Some(args.clone()),
            }),
            MutationEndpoint::Update(e) => {
                let id = required_id(args, "id", self.name())?;
                Ok(ApiRequest {
                    method: Method::PUT,
                    path: format!("/api/{}/{}", e.collection(), id),
                    query: Vec::new(),
                    body: Some(args.clone()),
                })
            }
            MutationEndpoint::Delete(e) => {
                let id = required_id(args, "id", self.name())?;
                Ok(ApiRequest {
                    method: Method::DELETE,
                    path: format!("/api/{}/{}", e.collection(), id),
                    query: Vec::new(),
                    body: None,
                })
            }
            MutationEndpoint::InvoiceFromSalesOrder => {
                let id = required_id(args, "salesOrderId", self.name())?;
                Ok(ApiRequest {
                    method: Method::POST,
                    path: format!("/api/sales-orders/{id}/invoice"),
                    query: Vec::new(),
                    body: Some(args.clone()),
                })
            }
        }
    }

    /// Tags invalidated by a successful execution of this mutation.
    ///
    /// Always invalidates the entity's collection wildcard; update/delete
    /// also invalidate the touched record. Cross-entity tags are added
    /// only when the linking argument is present — updating a sales order
    /// without a `customerId` does not touch any customer's cache.
    pub fn invalidates(&self, args: &Value, response: &Value) -> Vec<TagRef> {
        match self {
            MutationEndpoint::Create(e) => {
                let mut tags = vec![TagRef::list(*e)];
                tags.extend(related_tags(*e, args));
                tags
            }
            MutationEndpoint::Update(e) | MutationEndpoint::Delete(e) => {
                let mut tags = vec![TagRef::list(*e)];
                if let Some(id) = arg_id(args, "id").or_else(|| value_id(response.get("id"))) {
                    tags.push(TagRef::id(*e, id));
                }
                tags.extend(related_tags(*e, args));
                tags
            }
            MutationEndpoint::InvoiceFromSalesOrder => {
                let mut tags = vec![TagRef::list(EntityType::Invoice)];
                if let Some(id) = arg_id(args, "salesOrderId") {
                    tags.push(TagRef::id(EntityType::SalesOrder, id));
                }
                tags
            }
        }
    }
}

impl fmt::Display for MutationEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Cross-entity invalidation rules.
///
/// Known gap, kept as the server behaves: reassigning a record to a
/// different parent without the linking argument present leaves the
/// previous parent's cached views untouched.
fn related_tags(entity: EntityType, args: &Value) -> Vec<TagRef> {
    let mut tags = Vec::new();
    match entity {
        EntityType::SalesOrder => {
            if let Some(customer) = arg_id(args, "customerId") {
                tags.push(TagRef::id(EntityType::Customer, customer));
                tags.push(TagRef::list(EntityType::Customer));
            }
        }
        EntityType::PurchaseOrder => {
            if let Some(supplier) = arg_id(args, "supplierId") {
                tags.push(TagRef::id(EntityType::Supplier, supplier));
                tags.push(TagRef::list(EntityType::Supplier));
            }
        }
        EntityType::Invoice => {
            if let Some(customer) = arg_id(args, "customerId") {
                tags.push(TagRef::id(EntityType::Customer, customer));
                tags.push(TagRef::list(EntityType::Customer));
            }
            if let Some(order) = arg_id(args, "salesOrderId") {
                tags.push(TagRef::id(EntityType::SalesOrder, order));
            }
        }
        _ => {}
    }
    tags
}

// =========================================================================
// Argument helpers
// =========================================================================

fn arg_id(args: &Value, field: &str) -> Option<String> {
    value_id(args.get(field))
}

fn value_id(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn required_id(args: &Value, field: &str, endpoint: String) -> Result<String> {
    arg_id(args, field)
        .ok_or_else(|| StockpileError::InvalidArgs(format!("{endpoint} requires '{field}'")))
}

fn response_rows(response: &Value) -> &[Value] {
    match response {
        Value::Array(rows) => rows,
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(rows)) => rows,
            _ => &[],
        },
        _ => &[],
    }
}

fn query_params(args: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = args else {
        return Vec::new();
    };
    let mut params: Vec<(String, String)> = map
        .iter()
        .filter_map(|(k, v)| {
            let rendered = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => crate::key::canonical(other),
            };
            Some((k.clone(), rendered))
        })
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}
