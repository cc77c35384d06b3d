pub mod db_utils;
pub mod identity_cache;
pub mod identity_filter;
pub mod notify;
pub mod phone;
