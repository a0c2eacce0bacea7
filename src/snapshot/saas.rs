//! SaaS snapshot: users, orders (JSON document), order items.

use super::{SAAS_ORDER_ITEMS, SAAS_USERS};
use crate::config::{DateRange, NoiseConfig};
use crate::fake::{id_width, FakeData};
use crate::table::{round2, Table, Value};
use ahash::AHashSet;
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const USER_COLUMNS: &[&str] = &["user_id", "name", "email"];
pub const ORDER_ITEM_COLUMNS: &[&str] = &["order_id", "product_id", "quantity", "discount_pct"];

/// Status spellings, deliberately inconsistent in casing
const ORDER_STATUSES: &[&str] = &["Shipped", "shipped", "Pending", "pending", "Delivered"];
const CURRENCIES: &[&str] = &["USD", "EUR", "INR", "CAD"];
const DISCOUNTS: &[i64] = &[0, 0, 0, 5, 10, 15];

/// One element of `saas_orders.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_ref: String,
    pub order_date: NaiveDate,
    pub amount: Option<f64>,
    pub currency: String,
    pub status: String,
}

pub fn generate_users<R: Rng>(fake: &mut FakeData<R>, count: usize) -> Table {
    let mut table = Table::with_capacity(SAAS_USERS, USER_COLUMNS, count);

    for user_id in fake.unique_codes("USER", count) {
        let name = fake.person_name();
        let email = fake.email(&name);
        table.push(vec![Value::Text(user_id), Value::Text(name), Value::Text(email)]);
    }

    table
}

/// Orders reference customers; one extra slot per draw yields a fabricated
/// customer id that matches no customer.
pub fn generate_orders<R: Rng>(
    fake: &mut FakeData<R>,
    count: usize,
    customer_ids: &[String],
    dates: &DateRange,
    noise: &NoiseConfig,
) -> Vec<Order> {
    let known: AHashSet<&str> = customer_ids.iter().map(String::as_str).collect();
    let mut orders = Vec::with_capacity(count);

    for order_id in fake.unique_codes("ORD", count) {
        let customer_ref = match fake.pick_or_none(customer_ids) {
            Some(id) => id,
            None => dangling_code(fake, "CUST", id_width(customer_ids.len()), &known),
        };
        let order_date = fake.date_between(dates);
        let amount = fake.price(100.0, 5000.0);
        let amount = fake.maybe_null(round2(amount), noise.order_amount_null);
        let status = fake.pick(ORDER_STATUSES).to_string();
        let currency = fake.pick(CURRENCIES).to_string();

        orders.push(Order {
            order_id,
            customer_ref,
            order_date,
            amount,
            currency,
            status,
        });
    }

    orders
}

/// Order items draw orders and products independently; missing pools yield nulls.
pub fn generate_order_items<R: Rng>(
    fake: &mut FakeData<R>,
    count: usize,
    order_ids: &[String],
    product_ids: &[String],
) -> Table {
    let mut table = Table::with_capacity(SAAS_ORDER_ITEMS, ORDER_ITEM_COLUMNS, count);

    for _ in 0..count {
        let order_id = pick_value(fake, order_ids);
        let product_id = pick_value(fake, product_ids);
        let quantity = fake.int_range(1, 10);
        let discount = *fake.pick(DISCOUNTS);

        table.push(vec![
            order_id,
            product_id,
            Value::Int(quantity),
            Value::Int(discount),
        ]);
    }

    table
}

fn pick_value<R: Rng>(fake: &mut FakeData<R>, ids: &[String]) -> Value {
    if ids.is_empty() {
        Value::Null
    } else {
        Value::Text(fake.pick(ids).clone())
    }
}

/// A code with `prefix` that is not contained in `existing`
pub(crate) fn dangling_code<R: Rng>(
    fake: &mut FakeData<R>,
    prefix: &str,
    width: usize,
    existing: &AHashSet<&str>,
) -> String {
    loop {
        let code = fake.code(prefix, width);
        if !existing.contains(code.as_str()) {
            return code;
        }
    }
}
