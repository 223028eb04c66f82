//! Span definitions per operation: selection round, inference, ranking.

/// Create a selection round span.
#[macro_export]
macro_rules! round_span {
    ($round:expr, $criterion:expr, $granularity:expr) => {
        ::tracing::info_span!(
            "alvox.round",
            round = $round,
            criterion = %$criterion,
            granularity = %$granularity
        )
    };
}

/// Create a model inference span.
#[macro_export]
macro_rules! inference_span {
    ($items:expr, $batch_size:expr) => {
        ::tracing::info_span!("alvox.inference", items = $items, batch_size = $batch_size)
    };
}

/// Create a ranking span.
#[macro_export]
macro_rules! ranking_span {
    ($criterion:expr, $eligible_units:expr) => {
        ::tracing::info_span!(
            "alvox.ranking",
            criterion = %$criterion,
            eligible_units = $eligible_units
        )
    };
}
