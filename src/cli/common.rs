//! Common CLI types shared across commands

use clap::{Args, ValueEnum};

use crate::config::api;
use crate::error::Result;
use crate::prism::{OrderBy, QuerySpec};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table (default)
    Table,
    /// Comma-separated values
    Csv,
    /// JSON array
    Json,
    /// YAML format
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Server-side query options for list commands
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// OData filter expression, e.g. "name eq 'web01'"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Comma-separated fields to return
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Sort field with optional direction, e.g. "name desc"
    #[arg(long)]
    pub order_by: Option<String>,

    /// Records per request (1-100)
    #[arg(long, default_value_t = api::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

impl QueryArgs {
    /// Build the query spec; the page size is validated by the fetcher
    pub fn to_query_spec(&self) -> Result<QuerySpec> {
        let mut query = QuerySpec::new().with_page_size(self.page_size);
        if let Some(ref filter) = self.filter {
            query = query.with_filter(filter.clone());
        }
        if !self.select.is_empty() {
            query = query.with_select(self.select.iter().map(|s| s.trim().to_string()));
        }
        if let Some(ref order_by) = self.order_by {
            query = query.with_order_by(OrderBy::parse(order_by)?);
        }
        Ok(query)
    }
}
