pub(crate) mod connect;
pub(crate) mod login;
pub(crate) mod models;
pub(crate) mod provider;
pub(crate) mod sessions;
