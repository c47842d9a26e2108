//! Fan-out of independent search units over a scoped worker pool.
//!
//! Units share no mutable state, so each worker builds its own result list
//! and the lists are concatenated in unit order afterwards.

use std::thread;

use tracing::debug;

use crate::error::SearchError;

/// Run `work` over every unit using up to `workers` threads.
///
/// Units are split into contiguous chunks, one per worker. Output preserves
/// unit order. When several units fail, the error of the earliest unit is
/// returned.
pub fn run_units<U, R, F>(units: &[U], workers: usize, work: F) -> Result<Vec<R>, SearchError>
where
    U: Sync,
    R: Send,
    F: Fn(&U) -> Result<Vec<R>, SearchError> + Sync,
{
    if workers == 0 {
        return Err(SearchError::InvalidConfig("workers must be > 0"));
    }
    if workers == 1 || units.len() <= 1 {
        return run_chunk(units, &work);
    }

    let chunk_len = units.len().div_ceil(workers);
    debug!(units = units.len(), workers, chunk_len, "dispatching search units");

    let work = &work;
    let chunk_results: Vec<Result<Vec<R>, SearchError>> = thread::scope(|scope| {
        let handles: Vec<_> = units
            .chunks(chunk_len)
            .map(|chunk| scope.spawn(move || run_chunk(chunk, work)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(Err(SearchError::Worker)))
            .collect()
    });

    let mut out = Vec::new();
    for result in chunk_results {
        out.extend(result?);
    }
    Ok(out)
}

fn run_chunk<U, R, F>(units: &[U], work: &F) -> Result<Vec<R>, SearchError>
where
    F: Fn(&U) -> Result<Vec<R>, SearchError>,
{
    let mut out = Vec::new();
    for unit in units {
        out.extend(work(unit)?);
    }
    Ok(out)
}
