//! Atlas measurement names backing each logical metric

/// Normalized CPU components; their sum is total CPU percent
pub const CPU_COMPONENTS: &[&str] = &[
    "SYSTEM_NORMALIZED_CPU_GUEST",
    "SYSTEM_NORMALIZED_CPU_IOWAIT",
    "SYSTEM_NORMALIZED_CPU_IRQ",
    "SYSTEM_NORMALIZED_CPU_KERNEL",
    "SYSTEM_NORMALIZED_CPU_NICE",
    "SYSTEM_NORMALIZED_CPU_SOFTIRQ",
    "SYSTEM_NORMALIZED_CPU_STEAL",
    "SYSTEM_NORMALIZED_CPU_USER",
];

/// Reported in KB
pub const MEMORY_USED: &str = "SYSTEM_MEMORY_USED";

/// Storage size, bytes; the second is consulted when the first has no data
pub const DISK_USED: &str = "DB_STORAGE_TOTAL";
pub const DISK_USED_FALLBACK: &str = "DB_DATA_SIZE_TOTAL";

pub const DISK_IOPS: &str = "DISK_PARTITION_IOPS_TOTAL";

pub const CONNECTIONS: &str = "CONNECTIONS";

pub const READ_OPS: &[&str] = &["OPCOUNTER_CMD", "OPCOUNTER_GETMORE", "OPCOUNTER_QUERY"];

pub const WRITE_OPS: &[&str] = &[
    "OPCOUNTER_DELETE",
    "OPCOUNTER_TTL_DELETED",
    "OPCOUNTER_INSERT",
    "OPCOUNTER_UPDATE",
];

pub const KB_PER_GB: f64 = 1024.0 * 1024.0;
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
