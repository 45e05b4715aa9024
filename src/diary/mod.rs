pub mod error;
pub mod monthly_table;
pub mod row_parser;
pub mod source_cache;
pub mod table_fetcher;

#[cfg(test)]
pub(crate) mod fixtures;
