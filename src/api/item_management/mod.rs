pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod edit;
pub(crate) mod get_item;
pub(crate) mod models;
