use chrono::NaiveDate;
use serde_json::Value;

use super::ApiClient;
use crate::errors::ApiError;
use crate::models::{Badges, DashboardOverview, DashboardStats, PostStats, TopHost};
use crate::normalize::{normalize_list, normalize_one};

/// Filters for `GET /api/statistics/dashboard`.
#[derive(Debug, Clone, Default)]
pub struct StatsQuery {
    /// e.g. `week`, `month`, `year`, `custom`.
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StatsQuery {
    pub fn period(period: impl Into<String>) -> Self {
        Self {
            period: Some(period.into()),
            ..Self::default()
        }
    }

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(p) = &self.period {
            params.push(("period", p.clone()));
        }
        if let Some(d) = self.start_date {
            params.push(("startDate", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.end_date {
            params.push(("endDate", d.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

impl ApiClient {
    /// GET /api/statistics/dashboard
    pub async fn dashboard_stats(&self, query: &StatsQuery) -> Result<DashboardStats, ApiError> {
        let raw: Value = self.get("/api/statistics/dashboard", &query.to_params()).await?;
        Ok(normalize_one(&raw))
    }

    /// GET /api/statistics/badges
    pub async fn badges(&self) -> Result<Badges, ApiError> {
        let raw: Value = self.get("/api/statistics/badges", &[]).await?;
        Ok(normalize_one(&raw))
    }

    /// GET /api/statistics/posts
    pub async fn post_stats(&self) -> Result<PostStats, ApiError> {
        let raw: Value = self.get("/api/statistics/posts", &[]).await?;
        Ok(normalize_one(&raw))
    }

    /// GET /api/statistics/top-hosts
    pub async fn top_hosts(&self, limit: u32) -> Result<Vec<TopHost>, ApiError> {
        let raw: Value = self
            .get("/api/statistics/top-hosts", &[("limit", limit.to_string())])
            .await?;
        Ok(normalize_list(&raw))
    }

    /// Fetch everything the dashboard shows, concurrently.
    ///
    /// Only the headline stats are required. Badges, post stats and top
    /// hosts degrade to empty defaults when their fetch fails; the failed
    /// parts are listed in [`DashboardOverview::degraded`].
    pub async fn load_dashboard(&self, query: &StatsQuery, top_limit: u32) -> Result<DashboardOverview, ApiError> {
        let (stats, badges, post_stats, top_hosts) = tokio::join!(
            self.dashboard_stats(query),
            self.badges(),
            self.post_stats(),
            self.top_hosts(top_limit),
        );

        let stats = stats?;
        let mut degraded = Vec::new();

        let badges = or_degrade("badges", badges, &mut degraded);
        let post_stats = or_degrade("post_stats", post_stats, &mut degraded);
        let top_hosts = or_degrade("top_hosts", top_hosts, &mut degraded);

        Ok(DashboardOverview {
            stats,
            badges,
            post_stats,
            top_hosts,
            degraded,
        })
    }
}

fn or_degrade<T: Default>(part: &str, result: Result<T, ApiError>, degraded: &mut Vec<String>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(part, error = %e, "secondary dashboard fetch failed, using empty default");
            degraded.push(part.to_string());
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_only_include_set_filters() {
        assert!(StatsQuery::default().to_params().is_empty());

        let q = StatsQuery {
            period: Some("custom".into()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        assert_eq!(
            q.to_params(),
            vec![
                ("period", "custom".to_string()),
                ("startDate", "2024-01-01".to_string()),
                ("endDate", "2024-03-31".to_string()),
            ]
        );
    }
}
