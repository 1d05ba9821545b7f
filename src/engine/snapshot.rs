//! In-memory policy snapshot
//!
//! The full tuple set a replica evaluates against, indexed for the hot
//! path: policies by subject, grouping edges by member. Reachability is
//! breadth-first over the grouping graph with a visited set and a fixed
//! hop bound: user -> role is one hop, role -> internal-role is the second.
//! Deeper chains are not part of the model and are never followed.

use std::collections::{HashMap, HashSet};

use crate::model::{
    AccessRequest, GroupingTuple, PolicySet, PolicyTuple, action_match, domain_match, key_match,
};

/// Maximum grouping hops followed during a check: user -> role and
/// role -> internal-role.
pub const MAX_GROUPING_DEPTH: usize = 2;

/// Indexed view over one [`PolicySet`]
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    set: PolicySet,
    /// Policy indexes by subject. Policies are never removed, so the
    /// indexes stay valid across incremental adds.
    policies_by_subject: HashMap<String, Vec<usize>>,
    /// Direct grouping edges by member
    groups_by_member: HashMap<String, Vec<String>>,
}

impl PolicySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a freshly loaded tuple set
    pub fn from_set(set: PolicySet) -> Self {
        let mut snapshot = Self {
            set,
            policies_by_subject: HashMap::new(),
            groups_by_member: HashMap::new(),
        };
        snapshot.rebuild_policy_index();
        snapshot.rebuild_grouping_index();
        snapshot
    }

    fn rebuild_policy_index(&mut self) {
        self.policies_by_subject.clear();
        for (i, tuple) in self.set.policies.iter().enumerate() {
            self.policies_by_subject
                .entry(tuple.subject.clone())
                .or_default()
                .push(i);
        }
    }

    fn rebuild_grouping_index(&mut self) {
        self.groups_by_member.clear();
        for edge in &self.set.groupings {
            self.groups_by_member
                .entry(edge.member.clone())
                .or_default()
                .push(edge.group.clone());
        }
    }

    /// Whether any policy allows the request, following grouping edges
    /// from the request subject up to the hop bound. First match wins;
    /// no match is a deny.
    pub fn allows(&self, request: &AccessRequest) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut frontier: Vec<&str> = vec![request.subject.as_str()];
        visited.insert(request.subject.as_str());

        for depth in 0..=MAX_GROUPING_DEPTH {
            let mut next: Vec<&str> = Vec::new();
            for subject in &frontier {
                if self.subject_allows(subject, request) {
                    return true;
                }
                if depth < MAX_GROUPING_DEPTH {
                    if let Some(groups) = self.groups_by_member.get(*subject) {
                        for group in groups {
                            if visited.insert(group.as_str()) {
                                next.push(group.as_str());
                            }
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        false
    }

    fn subject_allows(&self, subject: &str, request: &AccessRequest) -> bool {
        let Some(indexes) = self.policies_by_subject.get(subject) else {
            return false;
        };
        indexes.iter().any(|&i| {
            let policy = &self.set.policies[i];
            domain_match(&policy.domain, &request.domain)
                && key_match(&policy.object, &request.object)
                && action_match(&policy.action, &request.action)
        })
    }

    /// Add policies, skipping exact duplicates. Returns how many were new.
    pub fn add_policies(&mut self, tuples: &[PolicyTuple]) -> usize {
        let mut added = 0;
        for tuple in tuples {
            if self.set.policies.contains(tuple) {
                continue;
            }
            self.policies_by_subject
                .entry(tuple.subject.clone())
                .or_default()
                .push(self.set.policies.len());
            self.set.policies.push(tuple.clone());
            added += 1;
        }
        added
    }

    /// Add one grouping edge. Returns false if it already existed.
    pub fn add_grouping(&mut self, edge: GroupingTuple) -> bool {
        if self.set.groupings.contains(&edge) {
            return false;
        }
        self.groups_by_member
            .entry(edge.member.clone())
            .or_default()
            .push(edge.group.clone());
        self.set.groupings.push(edge);
        true
    }

    /// Remove every grouping edge whose member is `subject`. Returns the
    /// number of removed edges.
    pub fn remove_groupings_for_subject(&mut self, subject: &str) -> usize {
        let before = self.set.groupings.len();
        self.set.groupings.retain(|edge| edge.member != subject);
        let removed = before - self.set.groupings.len();
        if removed > 0 {
            self.rebuild_grouping_index();
        }
        removed
    }

    /// Remove every grouping edge whose group is `group`. Returns the
    /// number of removed edges.
    pub fn remove_groupings_for_group(&mut self, group: &str) -> usize {
        let before = self.set.groupings.len();
        self.set.groupings.retain(|edge| edge.group != group);
        let removed = before - self.set.groupings.len();
        if removed > 0 {
            self.rebuild_grouping_index();
        }
        removed
    }

    pub fn policies(&self) -> &[PolicyTuple] {
        &self.set.policies
    }

    pub fn groupings(&self) -> &[GroupingTuple] {
        &self.set.groupings
    }

    /// Grouping edges whose member matches
    pub fn groupings_for_member(&self, member: &str) -> Vec<GroupingTuple> {
        self.set
            .groupings
            .iter()
            .filter(|edge| edge.member == member)
            .cloned()
            .collect()
    }

    /// Grouping edges whose group matches
    pub fn groupings_for_group(&self, group: &str) -> Vec<GroupingTuple> {
        self.set
            .groupings
            .iter()
            .filter(|edge| edge.group == group)
            .cloned()
            .collect()
    }

    /// Copy of the full tuple set, the unit flushed to the policy store
    pub fn to_set(&self) -> PolicySet {
        self.set.clone()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
