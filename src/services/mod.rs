pub mod normalize;
pub mod query;

pub use normalize::{QUERY_COMPARATORS, normalize_comparator, normalize_filter, normalize_rule};
pub use query::{
    CustomSort, Paging, QueryRequest, TableQueryState, compose_filter, count_filter_rules,
    fulltext_filter,
};
