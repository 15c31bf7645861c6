//! Baseball Savant implementations of the resolver feeds

use chrono::NaiveDate;
use serde_json::Value;

use super::{DateRange, GameFeed, StatsFeed, read_columns};
use crate::error::{Error, Result};
use crate::session::Session;

const STATCAST_PATH: &str = "/statcast_search/csv";
const GAME_FEED_PATH: &str = "/gf";
const GAME_ID_COLUMN: &str = "game_pk";
/// Regular season, postseason and spring training
const GAME_TYPES: &str = "R|PO|S|";

/// Statcast search and per-game feed client over a shared [`Session`]
#[derive(Clone, Debug)]
pub struct SavantClient {
    session: Session,
}

impl SavantClient {
    /// Create a client that issues every request through `session`
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    async fn day_game_ids(&self, day: NaiveDate, team: Option<&str>) -> Result<Vec<String>> {
        let date = day.format("%Y-%m-%d").to_string();
        let mut query = vec![
            ("all", "true"),
            ("type", "details"),
            ("player_type", "pitcher"),
            ("hfGT", GAME_TYPES),
            ("game_date_gt", date.as_str()),
            ("game_date_lt", date.as_str()),
        ];
        if let Some(team) = team {
            query.push(("team", team));
        }
        let url = self.session.endpoint(STATCAST_PATH, &query)?;

        tracing::debug!(url = %url, "Querying Statcast search");
        let body = self.get_ok(url).await?.bytes().await?;

        // A day without games may come back as an empty body
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let rows = read_columns(&body[..], &[GAME_ID_COLUMN], &format!("statcast {date}"))?;
        Ok(rows
            .into_iter()
            .filter_map(|mut cells| cells.pop())
            .filter(|id| !id.is_empty())
            .collect())
    }

    async fn get_ok(&self, url: url::Url) -> Result<reqwest::Response> {
        let response = self.session.client().get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl StatsFeed for SavantClient {
    async fn game_ids(&self, range: &DateRange, team: Option<&str>) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for day in range.days() {
            let day_ids = self.day_game_ids(day, team).await?;
            tracing::debug!(day = %day, rows = day_ids.len(), "Statcast rows");
            ids.extend(day_ids);
        }
        Ok(ids)
    }
}

#[async_trait::async_trait]
impl GameFeed for SavantClient {
    async fn game_data(&self, game_id: &str) -> Result<Value> {
        let url = self
            .session
            .endpoint(GAME_FEED_PATH, &[("game_pk", game_id)])?;
        let body = self.get_ok(url).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
