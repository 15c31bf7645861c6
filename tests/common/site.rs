//! Mock Baseball Savant site built on wiremock

use serde_json::Value;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Clip page carrying an MP4 source under `/media/{play_id}.mp4`
pub fn clip_page(play_id: &str) -> String {
    format!(
        r#"<html><body><div class="video-box"><video controls>
<source src="/media/{play_id}.mp4" type="video/mp4">
</video></div></body></html>"#
    )
}

/// Clip page for a play without video
pub const NO_VIDEO_PAGE: &str = r#"<html><body><div class="video-box"></div></body></html>"#;

/// Local stand-in for the Savant endpoints used by a batch
pub struct MockSavant {
    /// Underlying mock server
    pub server: MockServer,
}

impl MockSavant {
    /// Start an empty site
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the site
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Statcast search CSV for one day
    pub async fn statcast_day(&self, day: &str, csv: &str) {
        Mock::given(method("GET"))
            .and(path("/statcast_search/csv"))
            .and(query_param("game_date_gt", day))
            .and(query_param("game_date_lt", day))
            .respond_with(ResponseTemplate::new(200).set_body_string(csv.to_string()))
            .mount(&self.server)
            .await;
    }

    /// Per-game metadata document
    pub async fn game(&self, game_pk: &str, doc: Value) {
        Mock::given(method("GET"))
            .and(path("/gf"))
            .and(query_param("game_pk", game_pk))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc))
            .mount(&self.server)
            .await;
    }

    /// Per-game metadata endpoint failing with `status`
    pub async fn game_status(&self, game_pk: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/gf"))
            .and(query_param("game_pk", game_pk))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Clip page and media file for a play with video
    pub async fn clip(&self, play_id: &str, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path("/sporty-videos"))
            .and(query_param("playId", play_id))
            .respond_with(ResponseTemplate::new(200).set_body_string(clip_page(play_id)))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/media/{play_id}.mp4")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&self.server)
            .await;
    }

    /// Clip page for a play without video
    pub async fn missing_clip(&self, play_id: &str) {
        Mock::given(method("GET"))
            .and(path("/sporty-videos"))
            .and(query_param("playId", play_id))
            .respond_with(ResponseTemplate::new(200).set_body_string(NO_VIDEO_PAGE))
            .mount(&self.server)
            .await;
    }

    /// Clip page whose media file always fails with `status`
    pub async fn broken_clip(&self, play_id: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/sporty-videos"))
            .and(query_param("playId", play_id))
            .respond_with(ResponseTemplate::new(200).set_body_string(clip_page(play_id)))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/media/{play_id}.mp4")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the site has received
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}

/// Per-game metadata with the given `(play_id, pitch_call)` rows on the home side
pub fn game_doc(home: &[(&str, &str)]) -> Value {
    let rows: Vec<Value> = home
        .iter()
        .map(|(play_id, call)| serde_json::json!({ "play_id": play_id, "pitch_call": call }))
        .collect();
    serde_json::json!({ "team_home": rows, "team_away": [] })
}
