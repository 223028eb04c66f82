//! V001 migration: masks, rounds, per-round selections and statistics.

pub const MIGRATION_SQL: &str = r#"
-- Current label mask of every cloud, bit-packed LSB first.
CREATE TABLE IF NOT EXISTS clouds (
    cloud_id INTEGER PRIMARY KEY,
    path TEXT NOT NULL,
    size INTEGER NOT NULL,
    labeled INTEGER NOT NULL,
    mask BLOB NOT NULL,
    updated_round INTEGER,
    updated_at INTEGER NOT NULL DEFAULT (unixepoch())
) STRICT;

CREATE TABLE IF NOT EXISTS selection_rounds (
    round INTEGER PRIMARY KEY,
    criterion TEXT NOT NULL,
    granularity TEXT NOT NULL,
    percentage REAL NOT NULL,
    selected_units INTEGER NOT NULL,
    labeled_ratio REAL NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
) STRICT;

-- Selected unit indices of one cloud in one round, little-endian u32.
CREATE TABLE IF NOT EXISTS round_selections (
    round INTEGER NOT NULL REFERENCES selection_rounds(round) ON DELETE CASCADE,
    cloud_id INTEGER NOT NULL,
    unit_count INTEGER NOT NULL,
    indices BLOB NOT NULL,
    PRIMARY KEY (round, cloud_id)
) STRICT;

CREATE TABLE IF NOT EXISTS metric_statistics (
    round INTEGER NOT NULL REFERENCES selection_rounds(round) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    PRIMARY KEY (round, kind)
) STRICT;
"#;
