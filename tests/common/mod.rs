//! Shared setup for integration tests against a mock catalog API.

#![allow(dead_code)]

use movie_catalog::{ClientConfig, ClientState, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        retry_backoff_ms: 10,
        ..ClientConfig::default()
    }
}

pub fn state(server: &MockServer) -> ClientState {
    ClientState::with_store(config(server), Arc::new(MemoryStore::new())).unwrap()
}

pub fn movie(name: &str, tmdb_id: &str) -> Value {
    json!({
        "movie_name": name,
        "original_title": name,
        "genre": "Action",
        "year": 1999,
        "runtime": "136 min",
        "rating": 8.7,
        "overview": "",
        "poster_url": "",
        "backdrop_url": "",
        "tmdb_id": tmdb_id,
        "movie_link": "",
        "fshare_link": "",
        "category_id": null
    })
}

pub fn user(username: &str) -> Value {
    json!({
        "id": 1,
        "username": username,
        "email": format!("{}@example.com", username),
        "is_active": true,
        "created_at": "2024-05-01T12:00:00.123456"
    })
}
