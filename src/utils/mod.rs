pub mod clock;
pub mod db_utils;
pub mod email_cache;
pub mod email_filter;
