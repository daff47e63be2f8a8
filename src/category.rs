use serde::Serialize;
use serde_json::Value;

/// One rule of the error taxonomy. `priority` 1 is highest; categories with
/// lower priority numbers are checked first.
#[derive(Debug, Serialize)]
pub struct ErrorCategory {
    pub name: &'static str,
    pub priority: u8,
    pub description: &'static str,
    pub patterns: &'static [&'static str],
}

impl ErrorCategory {
    /// Substring match against an already-lowercased text blob.
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| text.contains(p))
    }
}

/// The error taxonomy as an ordered decision list: entries are sorted by
/// ascending priority number and the first match wins. Pattern lists overlap
/// deliberately ("timeout" appears under Database, Network, and Performance);
/// a message matching several categories is assigned the earliest one. The
/// terminal "Unknown" entry has no patterns and is returned on exhaustion.
pub static ERROR_CATEGORIES: [ErrorCategory; 20] = [
    ErrorCategory {
        name: "Database",
        priority: 1,
        description: "Database connection, query, or transaction failures",
        patterns: &[
            "database", "db", "sql", "connection", "timeout", "deadlock", "constraint",
            "foreign key", "transaction", "rollback", "commit", "postgres", "mysql",
            "mongodb", "redis",
        ],
    },
    ErrorCategory {
        name: "Authentication",
        priority: 2,
        description: "User authentication and authorization failures",
        patterns: &[
            "auth", "login", "token", "jwt", "oauth", "permission", "unauthorized",
            "forbidden", "credential", "password", "session", "expired",
        ],
    },
    ErrorCategory {
        name: "Network",
        priority: 3,
        description: "Network connectivity and communication issues",
        patterns: &[
            "network", "connection", "timeout", "refused", "unreachable", "dns", "socket",
            "http", "tcp", "udp", "proxy", "gateway",
        ],
    },
    ErrorCategory {
        name: "External API",
        priority: 4,
        description: "Third-party service and API failures",
        patterns: &[
            "api", "external", "service", "endpoint", "http", "rest", "graphql", "webhook",
            "integration", "third-party", "upstream",
        ],
    },
    ErrorCategory {
        name: "File System",
        priority: 5,
        description: "File and storage system errors",
        patterns: &[
            "file", "disk", "storage", "io", "read", "write", "permission", "not found",
            "access denied", "quota", "space", "mount",
        ],
    },
    ErrorCategory {
        name: "Memory",
        priority: 6,
        description: "Memory allocation and garbage collection issues",
        patterns: &[
            "memory", "heap", "out of memory", "oom", "gc", "garbage", "allocation",
            "leak", "buffer",
        ],
    },
    ErrorCategory {
        name: "Configuration",
        priority: 7,
        description: "Application configuration and environment issues",
        patterns: &[
            "config", "environment", "env", "setting", "parameter", "missing", "invalid",
            "default", "bootstrap",
        ],
    },
    ErrorCategory {
        name: "Validation",
        priority: 8,
        description: "Input validation and data format errors",
        patterns: &[
            "validation", "invalid", "format", "parse", "json", "xml", "schema",
            "required", "type", "cast",
        ],
    },
    ErrorCategory {
        name: "Business Logic",
        priority: 9,
        description: "Application-specific business rule violations",
        patterns: &[
            "business", "rule", "constraint", "limit", "quota", "rate", "policy",
            "workflow", "state",
        ],
    },
    ErrorCategory {
        name: "Concurrency",
        priority: 10,
        description: "Threading, locking, and concurrent access issues",
        patterns: &[
            "concurrent", "thread", "lock", "race", "deadlock", "mutex", "semaphore",
            "atomic", "synchronization",
        ],
    },
    ErrorCategory {
        name: "Security",
        priority: 11,
        description: "Security violations and suspicious activities",
        patterns: &[
            "security", "attack", "injection", "xss", "csrf", "malicious", "breach",
            "exploit", "vulnerability",
        ],
    },
    ErrorCategory {
        name: "Performance",
        priority: 12,
        description: "Performance degradation and resource exhaustion",
        patterns: &[
            "performance", "slow", "latency", "timeout", "bottleneck", "cpu", "load",
            "throughput", "response time",
        ],
    },
    ErrorCategory {
        name: "Dependency",
        priority: 13,
        description: "External dependency and service failures",
        patterns: &[
            "dependency", "service", "microservice", "circuit", "breaker", "fallback",
            "retry", "cascade",
        ],
    },
    ErrorCategory {
        name: "Serialization",
        priority: 14,
        description: "Data serialization and deserialization errors",
        patterns: &[
            "serialize", "deserialize", "marshal", "unmarshal", "encode", "decode",
            "binary", "protobuf", "avro",
        ],
    },
    ErrorCategory {
        name: "Cache",
        priority: 15,
        description: "Caching system failures and inconsistencies",
        patterns: &[
            "cache", "redis", "memcached", "ttl", "expire", "invalidate", "miss", "hit",
            "eviction",
        ],
    },
    ErrorCategory {
        name: "Queue",
        priority: 16,
        description: "Message queue and event processing failures",
        patterns: &[
            "queue", "message", "event", "producer", "consumer", "kafka", "rabbitmq",
            "sqs", "pubsub",
        ],
    },
    ErrorCategory {
        name: "Monitoring",
        priority: 17,
        description: "Monitoring, logging, and observability issues",
        patterns: &[
            "monitor", "metric", "log", "trace", "alert", "dashboard", "telemetry",
            "observability",
        ],
    },
    ErrorCategory {
        name: "Deployment",
        priority: 18,
        description: "Deployment and infrastructure issues",
        patterns: &[
            "deploy", "container", "docker", "kubernetes", "pod", "node",
            "infrastructure", "orchestration",
        ],
    },
    ErrorCategory {
        name: "Code Error",
        priority: 19,
        description: "Application code errors and exceptions",
        patterns: &[
            "exception", "error", "bug", "null", "undefined", "reference", "index",
            "range", "stack", "trace",
        ],
    },
    ErrorCategory {
        name: "Unknown",
        priority: 20,
        description: "Unclassified or unknown error types",
        patterns: &[],
    },
];

/// Assign an error to exactly one category. Pure: the result depends only on
/// `message` and `data`. The message and the JSON-stringified payload are
/// concatenated and lowercased, then evaluated against the decision list.
pub fn categorize_error(message: &str, data: &Value) -> &'static ErrorCategory {
    let payload = if data.is_null() {
        String::from("{}")
    } else {
        serde_json::to_string(data).unwrap_or_default()
    };
    let text = format!("{} {}", message, payload).to_lowercase();
    ERROR_CATEGORIES
        .iter()
        .find(|c| c.matches(&text))
        .unwrap_or(&ERROR_CATEGORIES[ERROR_CATEGORIES.len() - 1])
}
