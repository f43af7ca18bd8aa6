//! Views derived from orders and products.
//!
//! Customers are not stored anywhere. They exist only as the set of distinct
//! email addresses found on orders.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::order::Order;
use crate::product::Product;
use crate::types::{Email, FieldErrors, Price};

/// Nominal warehouse capacity per product used for inventory percentages.
pub const INVENTORY_CAPACITY: u32 = 100;

/// How many products the inventory view shows.
pub const INVENTORY_TOP_N: usize = 4;

/// A customer aggregated from their orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// The email address doubles as the id.
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub total_orders: u32,
    pub total_spent: Price,
}

impl Customer {
    /// Group orders by customer email.
    ///
    /// Customers come out in the order their email first appears. Name and
    /// phone are taken from that first order.
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Vec<Self> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut customers: Vec<Self> = Vec::new();

        for order in orders {
            let email = order.customer.email.as_str();
            if let Some(customer) = index.get(email).and_then(|&i| customers.get_mut(i)) {
                customer.total_orders += 1;
                customer.total_spent = customer.total_spent + order.total;
            } else {
                index.insert(email, customers.len());
                customers.push(Self {
                    id: email.to_owned(),
                    first_name: order.customer.first_name.clone(),
                    last_name: order.customer.last_name.clone(),
                    email: order.customer.email.clone(),
                    phone: order.customer.phone.clone(),
                    total_orders: 1,
                    total_spent: order.total,
                });
            }
        }

        customers
    }
}

/// Edit of a customer's contact details, applied to all of their orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerPatch {
    /// # Errors
    ///
    /// Returns blank supplied fields, or a `patch` entry when nothing was
    /// supplied.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let fields = [
            ("firstName", "First name", &self.first_name),
            ("lastName", "Last name", &self.last_name),
            ("phone", "Phone", &self.phone),
        ];
        for (field, label, value) in fields {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.add(field, format!("{label} cannot be blank"));
            }
        }
        if self.to_set().is_empty() {
            errors.add("patch", "No fields to update");
        }
        errors.into_result()
    }

    /// Dotted `customer.*` paths for a content-store `set` on an order.
    #[must_use]
    pub fn to_set(&self) -> Map<String, Value> {
        let mut set = Map::new();
        let fields = [
            ("customer.firstName", &self.first_name),
            ("customer.lastName", &self.last_name),
            ("customer.phone", &self.phone),
        ];
        for (path, value) in fields {
            if let Some(value) = value {
                set.insert(path.to_owned(), Value::String(value.trim().to_owned()));
            }
        }
        set
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub total_revenue: Price,
    pub total_orders: usize,
    pub total_customers: usize,
}

impl DashboardTotals {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let customers: HashSet<&str> = orders
            .iter()
            .map(|order| order.customer.email.as_str())
            .collect();
        Self {
            total_revenue: orders.iter().map(|order| order.total).sum(),
            total_orders: orders.len(),
            total_customers: customers.len(),
        }
    }
}

/// Sales for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPoint {
    /// `YYYY-MM`
    pub month: String,
    pub total: Price,
    pub orders: u32,
}

impl SalesPoint {
    /// Bucket orders by the month they were created, oldest month first.
    #[must_use]
    pub fn monthly(orders: &[Order]) -> Vec<Self> {
        let mut buckets: BTreeMap<String, (Price, u32)> = BTreeMap::new();
        for order in orders {
            let month = order.created_at.format("%Y-%m").to_string();
            let bucket = buckets.entry(month).or_insert((Price::ZERO, 0));
            bucket.0 = bucket.0 + order.total;
            bucket.1 += 1;
        }
        buckets
            .into_iter()
            .map(|(month, (total, orders))| Self {
                month,
                total,
                orders,
            })
            .collect()
    }
}

/// Stock level of one product relative to nominal capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevel {
    pub name: String,
    pub stock: u32,
    pub capacity: u32,
    /// Whole percent of capacity, capped at 100.
    pub percent: u32,
}

impl InventoryLevel {
    /// The best-stocked products, highest stock first. Ties keep catalog
    /// order.
    #[must_use]
    pub fn top(products: &[Product]) -> Vec<Self> {
        let mut sorted: Vec<&Product> = products.iter().collect();
        sorted.sort_by(|a, b| b.stock_level.cmp(&a.stock_level));
        sorted
            .into_iter()
            .take(INVENTORY_TOP_N)
            .map(|product| {
                let percent =
                    (u64::from(product.stock_level) * 100 / u64::from(INVENTORY_CAPACITY)).min(100);
                Self {
                    name: product.title.clone(),
                    stock: product.stock_level,
                    capacity: INVENTORY_CAPACITY,
                    percent: u32::try_from(percent).unwrap_or(100),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::order::{OrderCustomer, ShippingAddress};
    use crate::types::{OrderId, OrderStatus, PaymentMethod};

    fn order(id: &str, email: &str, cents: i64, month: u32) -> Order {
        Order {
            id: OrderId::new(id),
            order_number: format!("ORD-{id}"),
            customer: OrderCustomer {
                first_name: format!("First-{id}"),
                last_name: "Buyer".to_owned(),
                email: Email::parse(email).unwrap(),
                phone: "555".to_owned(),
            },
            shipping_address: ShippingAddress {
                street_address: "1 Main St".to_owned(),
                town_city: "Austin".to_owned(),
                province: "TX".to_owned(),
                zip_code: "78701".to_owned(),
                country: "US".to_owned(),
            },
            company_name: None,
            additional_info: None,
            items: Vec::new(),
            total: Price::from_cents(cents),
            payment_method: PaymentMethod::Cod,
            status: OrderStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2025, month, 10, 12, 0, 0).unwrap(),
        }
    }

    fn product(title: &str, stock: u32) -> Product {
        serde_json::from_value(json!({
            "_id": title,
            "title": title,
            "price": 10,
            "stockLevel": stock
        }))
        .unwrap()
    }

    #[test]
    fn test_customers_grouped_by_email() {
        let orders = [
            order("1", "a@example.com", 10_000, 1),
            order("2", "b@example.com", 5_000, 1),
            order("3", "a@example.com", 2_550, 2),
        ];

        let customers = Customer::from_orders(&orders);
        assert_eq!(customers.len(), 2);

        let first = &customers[0];
        assert_eq!(first.id, "a@example.com");
        assert_eq!(first.first_name, "First-1");
        assert_eq!(first.total_orders, 2);
        assert_eq!(first.total_spent, Price::from_cents(12_550));

        assert_eq!(customers[1].total_orders, 1);
    }

    #[test]
    fn test_dashboard_totals() {
        let orders = [
            order("1", "a@example.com", 10_000, 1),
            order("2", "a@example.com", 5_000, 3),
        ];
        let totals = DashboardTotals::from_orders(&orders);
        assert_eq!(totals.total_revenue, Price::from_cents(15_000));
        assert_eq!(totals.total_orders, 2);
        assert_eq!(totals.total_customers, 1);
    }

    #[test]
    fn test_monthly_sales_sorted_by_month() {
        let orders = [
            order("1", "a@example.com", 10_000, 3),
            order("2", "b@example.com", 5_000, 1),
            order("3", "c@example.com", 1_000, 3),
        ];
        let sales = SalesPoint::monthly(&orders);
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].month, "2025-01");
        assert_eq!(sales[1].total, Price::from_cents(11_000));
        assert_eq!(sales[1].orders, 2);
    }

    #[test]
    fn test_inventory_top_four() {
        let products = [
            product("Bed", 5),
            product("Sofa", 40),
            product("Chair", 250),
            product("Table", 12),
            product("Wardrobe", 0),
        ];
        let levels = InventoryLevel::top(&products);
        let names: Vec<&str> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Chair", "Sofa", "Table", "Bed"]);
        assert_eq!(levels[0].percent, 100);
        assert_eq!(levels[1].percent, 40);
    }

    #[test]
    fn test_customer_patch_uses_dotted_paths() {
        let patch = CustomerPatch {
            phone: Some(" 555-0199 ".to_owned()),
            ..CustomerPatch::default()
        };
        assert!(patch.validate().is_ok());
        let set = patch.to_set();
        assert_eq!(set.get("customer.phone"), Some(&json!("555-0199")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_customer_patch_rejects_blank() {
        let patch = CustomerPatch {
            first_name: Some(String::new()),
            ..CustomerPatch::default()
        };
        let errors = patch.validate().unwrap_err();
        assert_eq!(errors.get("firstName"), Some("First name cannot be blank"));
    }
}
