use std::{fs, sync::Arc, time::Instant};

use anyhow::Context;
use axum::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use scylla::{
    frame::value::CqlTimestamp, load_balancing::DefaultPolicy,
    prepared_statement::PreparedStatement, statement::Consistency, transport::Compression,
    ExecutionProfile, Session, SessionBuilder,
};
use uuid::Uuid;

use crate::data::page_view::{PageView, PageViews};
use crate::service::ViewStore;

const INSERT_QUERY: &str = "INSERT INTO personalization_keyspace.user_views (event_id, user_id, page_url, event_time) VALUES (?, ?, ?, ?)";
const SELECT_QUERY: &str = "SELECT event_id, user_id, page_url, event_time FROM personalization_keyspace.user_views WHERE user_id = ?";

type ViewRow = (Uuid, String, String, CqlTimestamp);

#[derive(Clone)]
pub struct ScyllaDbService {
    db_session: Arc<Session>,
    insert_ps: Arc<PreparedStatement>,
    select_ps: Arc<PreparedStatement>,
}

impl ScyllaDbService {
    /// Connects, runs every statement of `schema_file` and prepares the
    /// insert/select statements.
    pub async fn connect(dc: &str, host: &str, schema_file: &str) -> Result<Self, anyhow::Error> {
        info!("ScyllaDbService: connecting to {}. DC: {}.", host, dc);
        let policy = DefaultPolicy::builder()
            .prefer_datacenter(dc.to_owned())
            .token_aware(true)
            .build();
        let profile = ExecutionProfile::builder()
            .load_balancing_policy(policy)
            .consistency(Consistency::LocalOne)
            .build();
        let session: Session = SessionBuilder::new()
            .known_node(host)
            .compression(Some(Compression::Lz4))
            .default_execution_profile_handle(profile.into_handle())
            .build()
            .await
            .with_context(|| format!("Error connecting to ScyllaDB at {}", host))?;
        info!("ScyllaDbService: connected to {}. DC: {}.", host, dc);

        let schema = fs::read_to_string(schema_file)
            .with_context(|| format!("Error reading schema file {}", schema_file))?;
        provision(&session, &schema).await?;

        let insert_ps = session
            .prepare(INSERT_QUERY)
            .await
            .context("Error preparing insert query")?;
        let select_ps = session
            .prepare(SELECT_QUERY)
            .await
            .context("Error preparing select query")?;

        Ok(Self {
            db_session: Arc::new(session),
            insert_ps: Arc::new(insert_ps),
            select_ps: Arc::new(select_ps),
        })
    }
}

async fn provision(session: &Session, schema: &str) -> Result<(), anyhow::Error> {
    info!("ScyllaDbService: creating schema...");
    for query in schema_statements(schema) {
        info!("Running Query: {}", query);
        session
            .query(query.as_str(), ())
            .await
            .with_context(|| format!("Error creating schema: {}", query))?;
    }
    info!("ScyllaDbService: schema is ready.");
    Ok(())
}

/// Splits a CQL script into single statements. `--` comments run to the end
/// of their line; blank fragments are dropped.
pub fn schema_statements(schema: &str) -> Vec<String> {
    let script = schema
        .lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    script
        .split(';')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| q.to_owned() + ";")
        .collect()
}

fn row_to_view((event_id, user_id, page_url, event_time): ViewRow) -> Result<PageView, anyhow::Error> {
    let event_time = DateTime::<Utc>::from_timestamp_millis(event_time.0)
        .with_context(|| format!("event_time out of range for event {}", event_id))?;
    Ok(PageView {
        event_id,
        user_id,
        page_url,
        event_time,
    })
}

#[async_trait]
impl ViewStore for ScyllaDbService {
    async fn insert(&self, view: &PageView) -> Result<(), anyhow::Error> {
        let values = (
            view.event_id,
            view.user_id.as_str(),
            view.page_url.as_str(),
            CqlTimestamp(view.event_time.timestamp_millis()),
        );
        self.db_session
            .execute(&self.insert_ps, values)
            .await
            .context("Error inserting page view")?;
        debug!("ScyllaDbService: insert: saved event {}", view.event_id);
        Ok(())
    }

    async fn views_for_user(&self, user_id: &str) -> Result<PageViews, anyhow::Error> {
        let now = Instant::now();
        let result = self
            .db_session
            .execute(&self.select_ps, (user_id,))
            .await
            .context("Error querying page views")?;
        let views = result
            .rows_typed::<ViewRow>()?
            .map(|row| row_to_view(row?))
            .collect::<Result<PageViews, _>>()?;
        debug!(
            "ScyllaDbService: views_for_user: {} rows for {}. Took: {:.2?}",
            views.len(),
            user_id,
            now.elapsed()
        );
        Ok(views)
    }
}
