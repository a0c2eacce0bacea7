//! Per-table mutation rules used to produce the row state of an Update event.

use crate::fake::FakeData;
use crate::snapshot::{ERP_CUSTOMERS, ERP_CUSTOMER_ADDRESSES, ERP_PRODUCTS};
use crate::table::{round2, Row, Value};
use rand::Rng;

/// Suffixes appended to a product name on update
const PRODUCT_NAME_SUFFIXES: &[&str] = &[" v2", " Pro", " (Refurbished)", " - Updated", " Plus"];

/// Mutation rule of a CDC-tracked table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Country changes (half the time) or the customer is renamed
    Customer,
    /// The customer moves: new city and postal code, sometimes a new state
    Address,
    /// Price is perturbed by ±20% or a suffix is appended to the name
    Product,
    /// The update carries the row unchanged
    Identity,
}

impl Mutation {
    /// Rule registered for a table name; unknown tables are updated unchanged
    pub fn for_table(name: &str) -> Self {
        match name {
            ERP_CUSTOMERS => Mutation::Customer,
            ERP_CUSTOMER_ADDRESSES => Mutation::Address,
            ERP_PRODUCTS => Mutation::Product,
            _ => Mutation::Identity,
        }
    }

    /// Return a mutated copy of `row`. Columns the rule needs but the table
    /// lacks are left alone.
    pub fn apply<R: Rng>(self, columns: &[String], row: &Row, fake: &mut FakeData<R>) -> Row {
        let mut row = row.clone();
        let mut cols = Columns { columns, row: &mut row };

        match self {
            Mutation::Customer => {
                if fake.chance(0.5) {
                    cols.set("country", Value::Text(fake.country()));
                } else {
                    cols.set("customer_name", Value::Text(fake.customer_name()));
                }
            }
            Mutation::Address => {
                cols.set("city", Value::Text(fake.city()));
                cols.set("postal_code", Value::Text(fake.postal_code()));
                if fake.chance(0.3) {
                    cols.set("state", Value::Text(fake.state()));
                }
            }
            Mutation::Product => {
                if fake.chance(0.6) {
                    let factor = fake.rng().random_range(0.8..1.2);
                    let price = match cols.get("price").and_then(Value::as_f64) {
                        Some(price) => round2(price * factor),
                        None => fake.price(10.0, 500.0),
                    };
                    cols.set("price", Value::Float(price));
                } else {
                    let suffix = *fake.pick(PRODUCT_NAME_SUFFIXES);
                    let name = cols
                        .get("product_name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    cols.set("product_name", Value::Text(name + suffix));
                }
            }
            Mutation::Identity => {}
        }

        row
    }
}

/// Name-based access into a row
struct Columns<'a> {
    columns: &'a [String],
    row: &'a mut Row,
}

impl Columns<'_> {
    fn index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.index(name).and_then(|idx| self.row.get(idx))
    }

    fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.index(name).and_then(|idx| self.row.get_mut(idx)) {
            *slot = value;
        }
    }
}
