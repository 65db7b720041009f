mod status_queries;

pub use status_queries::{build_status_view, StatusQueryService};
