//! Shared fixtures: a small catalog with inbound, outbound and nested
//! named sources, plus an in-memory transport that records requests.

use crate::{
    error::Error,
    transport::{Request, Response, Transport},
};
use async_trait::async_trait;
use ermpath_schema::{
    node::{Catalog, Table},
    types::ColumnType,
};
use serde_json::{Value, json};
use std::{collections::VecDeque, sync::Mutex};

pub fn dataset_table() -> Table {
    Table::new("s", "dataset")
        .with_column("id", ColumnType::Int4, false)
        .with_column("title", ColumnType::Text, true)
        .with_column("category", ColumnType::Int4, true)
        .with_column("owner", ColumnType::Text, true)
        .with_column("reviewer", ColumnType::Text, true)
        .with_column("created", ColumnType::Timestamptz, true)
        .with_column("meta", ColumnType::Jsonb, true)
        .with_key("dataset_pkey", &["id"])
        .with_foreign_key("dataset_category_fkey", &[("category", "id")], ("s", "category"))
        .with_foreign_key("dataset_owner_fkey", &[("owner", "name")], ("s", "person"))
        .with_foreign_key("dataset_reviewer_fkey", &[("reviewer", "name")], ("s", "person"))
        .with_row_order(&[("title", false)])
        .with_source_definitions(json!({
            "sources": {
                "owner_row": {"source": [{"outbound": ["s", "dataset_owner_fkey"]}, "name"]},
                "owner_affiliation": {"source": [{"sourcekey": "owner_row"}, "affiliation"]},
                "owner_institute": {"source": [
                    {"sourcekey": "owner_row"},
                    {"outbound": ["s", "person_institute_fkey"]},
                    "name"
                ]},
                "file_count": {
                    "source": [{"inbound": ["s", "file_dataset_fkey"]}, "id"],
                    "aggregate": "cnt"
                }
            },
            "search-box": {"or": [{"source": "title"}, {"source": "owner"}]}
        }))
}

pub fn catalog() -> Catalog {
    let category = Table::new("s", "category")
        .with_column("id", ColumnType::Int4, false)
        .with_column("name", ColumnType::Text, false)
        .with_key("category_pkey", &["id"])
        .with_key("category_name_key", &["name"]);

    let person = Table::new("s", "person")
        .with_column("name", ColumnType::Text, false)
        .with_column("affiliation", ColumnType::Text, true)
        .with_column("institute", ColumnType::Int4, true)
        .with_key("person_pkey", &["name"])
        .with_foreign_key("person_institute_fkey", &[("institute", "id")], ("s", "institute"));

    let institute = Table::new("s", "institute")
        .with_column("id", ColumnType::Int4, false)
        .with_column("name", ColumnType::Text, true)
        .with_key("institute_pkey", &["id"]);

    let file = Table::new("s", "file")
        .with_column("id", ColumnType::Int4, false)
        .with_column("dataset", ColumnType::Int4, false)
        .with_column("url", ColumnType::Text, true)
        .with_column("bytes", ColumnType::Int8, true)
        .with_key("file_pkey", &["id"])
        .with_foreign_key("file_dataset_fkey", &[("dataset", "id")], ("s", "dataset"));

    Catalog::new("1", [dataset_table(), category, person, institute, file])
}

///
/// RecordingTransport
///
/// Replays queued responses in order and keeps every request it saw.
/// An empty queue answers `200` with an empty array.
///

#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn with_responses(bodies: impl IntoIterator<Item = Value>) -> Self {
        let responses = bodies
            .into_iter()
            .map(|body| Response { status: 200, body })
            .collect();

        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: Response) {
        self.responses
            .lock()
            .expect("response queue lock should not be poisoned")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .expect("request log lock should not be poisoned")
            .clone()
    }

    pub fn uris(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.uri).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        self.requests
            .lock()
            .expect("request log lock should not be poisoned")
            .push(request);

        let next = self
            .responses
            .lock()
            .expect("response queue lock should not be poisoned")
            .pop_front();

        Ok(next.unwrap_or(Response {
            status: 200,
            body: Value::Array(Vec::new()),
        }))
    }
}
