pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    FetchOptions, build_scraper, execute_fetch, fetch_options_from_args, parse_date_arg,
    parse_frequency, write_output,
};
