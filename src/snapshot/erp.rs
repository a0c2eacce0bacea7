//! ERP snapshot tables: customers, customer addresses, products.

use super::{ERP_CUSTOMERS, ERP_CUSTOMER_ADDRESSES, ERP_PRODUCTS};
use crate::config::{DateRange, NoiseConfig};
use crate::fake::FakeData;
use crate::table::{Table, Value};
use rand::Rng;

pub const CUSTOMER_COLUMNS: &[&str] = &["customer_id", "customer_name", "country", "created_at"];
pub const ADDRESS_COLUMNS: &[&str] = &["customer_id", "address", "city", "state", "postal_code"];
pub const PRODUCT_COLUMNS: &[&str] = &["product_id", "product_name", "category", "price"];

pub fn generate_customers<R: Rng>(
    fake: &mut FakeData<R>,
    count: usize,
    dates: &DateRange,
    noise: &NoiseConfig,
) -> Table {
    let mut table = Table::with_capacity(ERP_CUSTOMERS, CUSTOMER_COLUMNS, count);

    for raw_id in fake.unique_codes("CUST", count) {
        let customer_id = if fake.chance(noise.customer_id_null) {
            None
        } else {
            Some(inconsistent_id(fake, raw_id, noise))
        };
        let name = fake.customer_name();
        let country = fake.country();
        let country = fake.maybe_null(country, noise.country_null);
        let created_at = fake.date_between(dates);

        table.push(vec![
            Value::opt_text(customer_id),
            Value::Text(name),
            Value::opt_text(country),
            Value::Text(created_at.to_string()),
        ]);
    }

    table
}

/// Formatting noise on an otherwise valid id: `CUST-` dash and/or lowercase.
pub fn inconsistent_id<R: Rng>(fake: &mut FakeData<R>, id: String, noise: &NoiseConfig) -> String {
    let mut id = id;
    if fake.chance(noise.customer_id_dash) {
        id = id.replacen("CUST", "CUST-", 1);
    }
    if fake.chance(noise.customer_id_lowercase) {
        id = id.to_lowercase();
    }
    id
}

/// Addresses reference customers by id; one extra slot yields a null reference.
pub fn generate_addresses<R: Rng>(
    fake: &mut FakeData<R>,
    count: usize,
    customer_ids: &[String],
) -> Table {
    let mut table = Table::with_capacity(ERP_CUSTOMER_ADDRESSES, ADDRESS_COLUMNS, count);

    for _ in 0..count {
        let customer_id = fake.pick_or_none(customer_ids);
        let address = fake.street_address();
        let city = fake.city();
        let postal_code = fake.postal_code();
        let state = fake.state();

        table.push(vec![
            Value::opt_text(customer_id),
            Value::Text(address),
            Value::Text(city),
            Value::Text(state),
            Value::Text(postal_code),
        ]);
    }

    table
}

pub fn generate_products<R: Rng>(fake: &mut FakeData<R>, count: usize) -> Table {
    let mut table = Table::with_capacity(ERP_PRODUCTS, PRODUCT_COLUMNS, count);

    for product_id in fake.unique_codes("PROD", count) {
        let name = fake.product_name();
        let price = fake.price(10.0, 500.0);
        let category = fake.product_category();

        table.push(vec![
            Value::Text(product_id),
            Value::Text(name),
            Value::text(category),
            Value::Float(price),
        ]);
    }

    table
}
