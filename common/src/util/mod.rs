pub mod date_util;
