//! Event store database schema.

/// SQL to create the events table. Mirrors `migrations/0001_create_domain_events.sql`.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS domain_events (
    event_id        UUID PRIMARY KEY,
    stream_id       VARCHAR(255) NOT NULL,
    position        BIGINT NOT NULL CHECK (position >= 0),
    event_type      VARCHAR(255) NOT NULL,
    schema_version  INTEGER NOT NULL CHECK (schema_version >= 1),
    payload         JSONB NOT NULL,
    correlation_id  UUID NOT NULL,
    causation_id    UUID NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL,
    UNIQUE (stream_id, position)
);

CREATE INDEX IF NOT EXISTS idx_domain_events_correlation_id
    ON domain_events (correlation_id);
";
