//! Category management for labelling ledger entries.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, expense_stats_for_window,
    get_category, list_categories, update_category,
};
pub use domain::{Category, CategoryId, CategoryKind, CategoryName, CategorySpend, NewCategory};
pub use endpoints::{
    CategoryEndpointState, category_stats_endpoint, create_category_endpoint,
    delete_category_endpoint, list_categories_endpoint, update_category_endpoint,
};
