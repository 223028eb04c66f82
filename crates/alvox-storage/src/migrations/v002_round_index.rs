//! V002 migration: lookups of a cloud's selection history.

pub const MIGRATION_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_round_selections_cloud ON round_selections(cloud_id, round);
CREATE INDEX IF NOT EXISTS idx_clouds_updated_round ON clouds(updated_round);
"#;
