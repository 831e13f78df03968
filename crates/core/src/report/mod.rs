//! Read-only reports assembled from a [`JobStore`](crate::storage::JobStore) for one reference date.
//!
//! Every report takes the store and the [`ReportWindows`](crate::aggregate::ReportWindows) of the
//! request, reads one snapshot, and scores it in memory. Nothing is cached or written back.

pub mod command_center;
pub mod deep_dive;
pub mod heatmap;
pub mod job_listings;
pub mod role_demand;

pub use command_center::{command_center, CommandCenter};
pub use deep_dive::{company_deep_dive, CompanyDeepDive};
pub use heatmap::{company_heatmap, Heatmap, MAX_HEATMAP_LIMIT};
pub use job_listings::{job_listings, normalized_listings, JobListings, ListingMode};
pub use role_demand::{role_demand_report, RoleDemandReport};
