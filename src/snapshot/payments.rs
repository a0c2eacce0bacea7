//! Payments snapshot: payment method lookup and payments.

use super::saas::dangling_code;
use super::{PAYMENTS, PAYMENT_METHODS};
use crate::config::{DateRange, NoiseConfig};
use crate::fake::{id_width, FakeData};
use crate::table::{Table, Value};
use ahash::AHashSet;
use rand::Rng;

pub const PAYMENT_METHOD_COLUMNS: &[&str] = &["payment_method"];
pub const PAYMENT_COLUMNS: &[&str] = &[
    "payment_id",
    "order_ref",
    "payment_date",
    "payment_amount",
    "payment_method",
];

/// Method spellings, two of them duplicated without the space
pub const METHODS: &[&str] = &[
    "Credit Card",
    "CreditCard",
    "Bank Transfer",
    "BankTransfer",
    "Cash",
];

pub fn payment_methods() -> Table {
    let mut table = Table::with_capacity(PAYMENT_METHODS, PAYMENT_METHOD_COLUMNS, METHODS.len());
    for method in METHODS {
        table.push(vec![Value::text(*method)]);
    }
    table
}

/// Payments reference orders. With `noise.payment_dangling_ref` the reference
/// is a fabricated order id; otherwise it is drawn from the order ids plus one
/// empty slot.
pub fn generate_payments<R: Rng>(
    fake: &mut FakeData<R>,
    count: usize,
    order_ids: &[String],
    dates: &DateRange,
    noise: &NoiseConfig,
) -> Table {
    let known: AHashSet<&str> = order_ids.iter().map(String::as_str).collect();
    let ref_width = id_width(order_ids.len());
    let mut table = Table::with_capacity(PAYMENTS, PAYMENT_COLUMNS, count);

    for payment_id in fake.unique_codes("PAY", count) {
        let order_ref = if fake.chance(noise.payment_dangling_ref) {
            Some(dangling_code(fake, "ORD", ref_width, &known))
        } else {
            fake.pick_or_none(order_ids)
        };
        let payment_date = fake.date_between(dates);
        let amount = fake.price(50.0, 5000.0);
        let method = *fake.pick(METHODS);

        table.push(vec![
            Value::Text(payment_id),
            Value::opt_text(order_ref),
            Value::Text(payment_date.to_string()),
            Value::Float(amount),
            Value::text(method),
        ]);
    }

    table
}
