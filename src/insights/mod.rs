// src/insights/mod.rs
//
// Read-side views over the in-memory tables: priority ranking, entity
// search, directory listings, dashboard counts and the district heatmap.
pub mod listing;
pub mod ranking;
pub mod search;
pub mod stats;

pub use listing::{funder_listing, ngo_listing, FunderFilter};
pub use ranking::{priority_ranking, RankedOrganization};
pub use search::{search_entities, SearchQuery};
pub use stats::{dashboard_stats, district_heatmap, DashboardStats, HeatmapPoint};
