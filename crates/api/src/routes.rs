use axum::{
    extract::{Query, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use hirepulse_core::aggregate::ReportWindows;
use hirepulse_core::config::Settings;
use hirepulse_core::listings::PageRequest;
use hirepulse_core::report::{self, ListingMode, MAX_HEATMAP_LIMIT};
use hirepulse_core::storage::{JobStore, ListingFilter};
use hirepulse_core::time::reference_date::{parse_date, resolve_reference_date};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the service started without a reachable database.
    pub store: Option<Arc<dyn JobStore>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn JobStore>>, settings: Settings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    fn store(&self) -> Result<&dyn JobStore, ApiError> {
        self.store.as_deref().ok_or(ApiError::Unavailable)
    }

    fn windows(&self, date: Option<&str>) -> Result<ReportWindows, ApiError> {
        let now = Utc::now();
        let reference_date =
            resolve_reference_date(date, now).map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(ReportWindows::new(
            reference_date,
            now,
            self.settings.freshness_anchor,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/command-center", get(command_center))
        .route("/api/company-heatmap", get(company_heatmap))
        .route("/api/company-deep-dive", get(company_deep_dive))
        .route("/api/roles", get(roles))
        .route("/api/job-listings", get(job_listings))
        .route("/api/job-listings-normalized", get(job_listings_normalized))
        .route("/api/jobs-by-date-and-role", get(jobs_by_date_and_role))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

/// JSON body with a CDN cache window.
fn cached<T: Serialize>(max_age_secs: u64, body: T) -> Response {
    (
        [(
            header::CACHE_CONTROL,
            format!("s-maxage={max_age_secs}, stale-while-revalidate"),
        )],
        Json(body),
    )
        .into_response()
}

fn parse_param<T: std::str::FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("invalid {name}: {s}"))),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    date: Option<String>,
}

async fn command_center(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let windows = state.windows(q.date.as_deref())?;
    let body = report::command_center(store, &windows).await?;
    Ok(cached(state.settings.cache_max_age_secs, body))
}

#[derive(Debug, Default, Deserialize)]
pub struct HeatmapQuery {
    date: Option<String>,
    limit: Option<String>,
}

async fn company_heatmap(
    State(state): State<AppState>,
    Query(q): Query<HeatmapQuery>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let windows = state.windows(q.date.as_deref())?;
    let limit = parse_param::<usize>("limit", q.limit.as_deref())?
        .unwrap_or(state.settings.heatmap_default_limit);
    if !(1..=MAX_HEATMAP_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_HEATMAP_LIMIT}"
        )));
    }

    let body = report::company_heatmap(store, &windows, limit).await?;
    Ok(cached(state.settings.cache_max_age_secs, body))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeepDiveQuery {
    company: Option<String>,
    date: Option<String>,
}

async fn company_deep_dive(
    State(state): State<AppState>,
    Query(q): Query<DeepDiveQuery>,
) -> Result<Response, ApiError> {
    let Some(company) = q.company.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
        return Err(ApiError::bad_request("Company parameter is required"));
    };
    let store = state.store()?;
    let windows = state.windows(q.date.as_deref())?;

    let body = report::company_deep_dive(store, &windows, company)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found or no recent jobs".to_string()))?;
    Ok(cached(state.settings.cache_max_age_secs, body))
}

async fn roles(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let windows = state.windows(q.date.as_deref())?;
    let body = report::role_demand_report(store, &windows).await?;
    Ok(cached(state.settings.roles_cache_max_age_secs, body))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    date: Option<String>,
    role: Option<String>,
    company: Option<String>,
    location: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    group_by_role: Option<String>,
}

impl ListingQuery {
    fn filter(&self) -> ListingFilter {
        ListingFilter {
            role: self.role.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
        }
    }

    fn mode(&self) -> Result<ListingMode, ApiError> {
        let grouped = parse_param::<bool>("groupByRole", self.group_by_role.as_deref())?
            .unwrap_or(true);
        if grouped {
            return Ok(ListingMode::ByTitle);
        }

        let defaults = PageRequest::default();
        let page = parse_param("page", self.page.as_deref())?.unwrap_or(defaults.page);
        let limit = parse_param("limit", self.limit.as_deref())?.unwrap_or(defaults.limit);
        let req = PageRequest::new(page, limit).map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(ListingMode::Paged(req))
    }
}

async fn job_listings(
    State(state): State<AppState>,
    Query(q): Query<ListingQuery>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let date = state.windows(q.date.as_deref())?.reference_date;
    let mode = q.mode()?;

    let body = report::job_listings(store, date, &q.filter(), mode).await?;
    Ok(cached(state.settings.cache_max_age_secs, body))
}

async fn job_listings_normalized(
    State(state): State<AppState>,
    Query(q): Query<ListingQuery>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let date = state.windows(q.date.as_deref())?.reference_date;

    let body = report::normalized_listings(store, date, &q.filter()).await?;
    Ok(cached(state.settings.cache_max_age_secs, body))
}

async fn jobs_by_date_and_role(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Response, ApiError> {
    let Some(raw) = q.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
        return Err(ApiError::bad_request("Date parameter is required"));
    };
    let date = parse_date(raw).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let store = state.store()?;

    let body = report::normalized_listings(store, date, &ListingFilter::default()).await?;
    Ok(cached(state.settings.cache_max_age_secs, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_mode_defaults_to_grouped() {
        let q = ListingQuery::default();
        assert_eq!(q.mode().unwrap(), ListingMode::ByTitle);
    }

    #[test]
    fn listing_mode_validates_paging() {
        let q = ListingQuery {
            group_by_role: Some("false".to_string()),
            page: Some("2".to_string()),
            ..ListingQuery::default()
        };
        assert_eq!(
            q.mode().unwrap(),
            ListingMode::Paged(PageRequest::new(2, 50).unwrap())
        );

        let q = ListingQuery {
            group_by_role: Some("false".to_string()),
            limit: Some("0".to_string()),
            ..ListingQuery::default()
        };
        assert!(matches!(q.mode(), Err(ApiError::BadRequest(_))));

        let q = ListingQuery {
            group_by_role: Some("maybe".to_string()),
            ..ListingQuery::default()
        };
        assert!(matches!(q.mode(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn parses_optional_params() {
        assert_eq!(parse_param::<u32>("page", None).unwrap(), None);
        assert_eq!(parse_param::<u32>("page", Some(" ")).unwrap(), None);
        assert_eq!(parse_param::<u32>("page", Some("3")).unwrap(), Some(3));
        assert!(parse_param::<u32>("page", Some("-1")).is_err());
    }
}
