//! Search
//!
//! Compiles declarative search requests into SQL over the library database and
//! runs them.
//!
//! A request flows through the pipeline in order:
//!
//! - [`tags`] turns the tag lists into one query over item ids
//! - [`filters`] turn each filter into one CTE stage
//! - [`chain`] links the stages, subtracting excluded matches
//! - [`query`] wraps the chain into count and fetch statements
//! - [`execute`] runs them and streams the results

pub mod chain;
pub mod execute;
pub mod filters;
pub mod input;
pub mod output;
pub mod query;
pub mod sorting;
pub mod sql;
pub mod tags;

pub use chain::{build_rule_items_query, RuleItemFilters};
pub use execute::{search, SearchResults};
pub use filters::{Filter, FilterKind};
pub use input::{OrderParams, QueryFilters, QueryParams, SearchQuery};
pub use output::FileSearchResult;
pub use query::{CompiledQuery, QueryCompiler};
pub use sorting::{OrderBy, SortDirection};
pub use sql::Sql;
pub use tags::TagFilter;
