use super::*;
use crate::downloader::test_helpers::*;
use crate::types::{DownloadOutcome, MediaReference};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
