/// Number of parallel compile jobs the build tool is told to run.
///
/// Below `low_mem_threshold_mib` the build is serial regardless of cores.
/// Otherwise the result is the smallest of the CPU count, the number of
/// `memory_per_job_mib` slices that fit in RAM plus swap, and `hard_cap`,
/// never less than 1.
pub fn compute_job_count(
    cpu_count: u32,
    total_memory_mib: u64,
    swap_mib: u64,
    memory_per_job_mib: u64,
    low_mem_threshold_mib: u64,
    hard_cap: Option<u32>,
) -> u32 {
    if total_memory_mib < low_mem_threshold_mib {
        return 1;
    }

    let by_memory = total_memory_mib
        .saturating_add(swap_mib)
        .checked_div(memory_per_job_mib)
        .unwrap_or(u64::MAX)
        .max(1);
    let by_memory = u32::try_from(by_memory).unwrap_or(u32::MAX);

    let mut jobs = cpu_count.min(by_memory);
    if let Some(cap) = hard_cap {
        jobs = jobs.min(cap);
    }
    jobs.max(1)
}
