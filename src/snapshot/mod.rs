//! Entity snapshot builder.
//!
//! Produces every base table of a run in a fixed order, drawing all
//! randomness from the run's [`FakeData`]:
//!
//! 1. ERP: customers, customer addresses, products
//! 2. SaaS: users, orders, order items
//! 3. Payments: payment methods, payments
//!
//! Data-quality defects (null ids, `CUST-` dashes, lowercase ids, mixed
//! casing, dangling references) are injected here according to
//! [`NoiseConfig`](crate::config::NoiseConfig).

pub mod erp;
pub mod payments;
pub mod saas;

pub use saas::Order;

use crate::config::GenerateConfig;
use crate::fake::FakeData;
use crate::table::Table;
use rand::Rng;

pub const ERP_CUSTOMERS: &str = "erp_customers";
pub const ERP_CUSTOMER_ADDRESSES: &str = "erp_customer_addresses";
pub const ERP_PRODUCTS: &str = "erp_products";
pub const SAAS_USERS: &str = "saas_users";
pub const SAAS_ORDERS: &str = "saas_orders";
pub const SAAS_ORDER_ITEMS: &str = "saas_order_items";
pub const PAYMENT_METHODS: &str = "payment_methods";
pub const PAYMENTS: &str = "payments";

/// All base tables of one generation run
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub customers: Table,
    pub addresses: Table,
    pub products: Table,
    pub users: Table,
    pub orders: Vec<Order>,
    pub order_items: Table,
    pub payment_methods: Table,
    pub payments: Table,
}

impl Snapshot {
    pub fn build<R: Rng>(fake: &mut FakeData<R>, config: &GenerateConfig) -> Self {
        let counts = &config.counts;
        let dates = &config.dates;
        let noise = &config.noise;

        let customers = erp::generate_customers(fake, counts.customers, dates, noise);
        let customer_ids = customers.text_values("customer_id");
        let addresses = erp::generate_addresses(fake, counts.addresses, &customer_ids);
        let products = erp::generate_products(fake, counts.products);

        let users = saas::generate_users(fake, counts.users);
        let orders = saas::generate_orders(fake, counts.orders, &customer_ids, dates, noise);
        let order_ids: Vec<String> = orders.iter().map(|o| o.order_id.clone()).collect();
        let product_ids = products.text_values("product_id");
        let order_items =
            saas::generate_order_items(fake, counts.order_items, &order_ids, &product_ids);

        let payment_methods = payments::payment_methods();
        let payments = payments::generate_payments(fake, counts.payments, &order_ids, dates, noise);

        Self {
            customers,
            addresses,
            products,
            users,
            orders,
            order_items,
            payment_methods,
            payments,
        }
    }

    /// Tables written as CSV, in output order
    pub fn csv_tables(&self) -> [&Table; 7] {
        [
            &self.customers,
            &self.addresses,
            &self.products,
            &self.users,
            &self.order_items,
            &self.payment_methods,
            &self.payments,
        ]
    }

    /// (table name, row count) for every table including the orders document
    pub fn row_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .csv_tables()
            .into_iter()
            .map(|t| (t.name.as_str(), t.len()))
            .collect();
        counts.insert(4, (SAAS_ORDERS, self.orders.len()));
        counts
    }
}
