//! Cluster to process matching
//!
//! Processes are listed per project, so each cluster has to pick out its
//! own members: first by the hosts named in its connection string, then by
//! a loose match of the cluster name inside the hostname.

use crate::models::{ClusterIdentity, ProcessInfo};
use std::collections::HashSet;

/// Pick the process whose measurements represent `cluster`
///
/// Prefers the replica set primary among the matched processes.
pub fn resolve<'a>(cluster: &ClusterIdentity, processes: &'a [ProcessInfo]) -> Option<&'a ProcessInfo> {
    let hosts = uri_hostnames(cluster.mongo_uri.as_deref().unwrap_or(""));

    let mut matched: Vec<&ProcessInfo> = processes
        .iter()
        .filter(|p| {
            hosts.contains(p.hostname.as_str())
                || p.user_alias
                    .as_deref()
                    .map_or(false, |alias| hosts.contains(alias))
        })
        .collect();

    if matched.is_empty() {
        let needle = normalize(&cluster.name);
        if !needle.is_empty() {
            matched = processes
                .iter()
                .filter(|p| normalize(&p.hostname).contains(&needle))
                .collect();
        }
    }

    matched
        .iter()
        .find(|p| p.is_primary())
        .or_else(|| matched.first())
        .copied()
}

/// Hostnames listed in a `mongodb://` connection string
pub fn uri_hostnames(uri: &str) -> HashSet<&str> {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let rest = rest.rsplit_once('@').map_or(rest, |(_, hosts)| hosts);
    let hosts = rest.split(['/', '?']).next().unwrap_or("");

    hosts
        .split(',')
        .map(|host| host.split(':').next().unwrap_or("").trim())
        .filter(|host| !host.is_empty())
        .collect()
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
