//! Static work sharding across a fixed worker count.
//!
//! Parallelism is process-level only: an orchestrator launches N workers,
//! each re-derives the same task list, partitions it the same way and takes
//! only its own slice. Determinism here is what makes re-running a single
//! failed worker safe.

/// Splits `tasks` into at most `max_parallel_steps` contiguous chunks of
/// near-equal size.
///
/// The first `tasks.len() % max_parallel_steps` chunks are one element
/// longer than the rest. Empty chunks are dropped, so fewer tasks than
/// workers yields fewer chunks than workers. A step count of zero is
/// treated as one.
pub fn partition<T>(tasks: &[T], max_parallel_steps: usize) -> Vec<&[T]> {
    let chunk_count = max_parallel_steps.max(1);
    let base = tasks.len() / chunk_count;
    let extra = tasks.len() % chunk_count;

    let mut chunks = Vec::with_capacity(chunk_count.min(tasks.len()));
    let mut offset = 0;
    for idx in 0..chunk_count {
        let size = base + usize::from(idx < extra);
        if size == 0 {
            break;
        }
        chunks.push(&tasks[offset..offset + size]);
        offset += size;
    }
    chunks
}

/// Chunk assigned to `worker_idx`, or `None` when the index is past the
/// last non-empty chunk. `None` is an expected scale-down case, not an
/// error: the caller logs the skip and exits successfully.
pub fn select<'a, T>(chunks: &[&'a [T]], worker_idx: usize) -> Option<&'a [T]> {
    chunks.get(worker_idx).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_list(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("task-{i:03}")).collect()
    }

    #[test]
    fn test_partition_sizes() {
        let tasks = task_list(10);
        let chunks = partition(&tasks, 3);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_partition_union_is_exact() {
        for (n, steps) in [(1, 1), (7, 3), (10, 4), (12, 12), (100, 7)] {
            let tasks = task_list(n);
            let chunks = partition(&tasks, steps);
            assert!(chunks.len() <= steps);
            let rejoined: Vec<String> = chunks.iter().flat_map(|c| c.to_vec()).collect();
            assert_eq!(rejoined, tasks, "n={n} steps={steps}");
        }
    }

    #[test]
    fn test_partition_more_workers_than_tasks() {
        let tasks = task_list(3);
        let chunks = partition(&tasks, 5);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_partition_single_worker_gets_everything() {
        let tasks = task_list(4);
        let chunks = partition(&tasks, 1);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], tasks.as_slice());
    }

    #[test]
    fn test_partition_empty_tasks() {
        let tasks: Vec<String> = Vec::new();
        assert!(partition(&tasks, 4).is_empty());
    }

    #[test]
    fn test_select_in_and_out_of_range() {
        let tasks = task_list(10);
        let chunks = partition(&tasks, 3);
        assert_eq!(select(&chunks, 0), Some(&tasks[0..4]));
        assert_eq!(select(&chunks, 2), Some(&tasks[7..10]));
        assert_eq!(select(&chunks, 3), None);
        assert_eq!(select(&chunks, 100), None);
    }

    #[test]
    fn test_select_is_stable_across_runs() {
        let tasks = task_list(11);
        let first = select(&partition(&tasks, 4), 2).unwrap().to_vec();
        let second = select(&partition(&tasks, 4), 2).unwrap().to_vec();
        assert_eq!(first, second);
    }
}
