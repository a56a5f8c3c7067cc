//! Categories for labelling transactions and budgeting.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, ensure_category_owned, get_all_categories,
    get_category, get_or_create_category, update_category,
};
pub use domain::{Category, CategoryId, CategoryName, NewCategory};
pub use endpoints::{
    create_category_endpoint, get_categories_endpoint, get_category_endpoint,
    update_category_endpoint,
};
