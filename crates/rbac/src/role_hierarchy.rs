//! RoleHierarchy - Direct inheritance edges and their transitive closure

use shared::{RbacError, Result, Role};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Role inheritance table.
///
/// Stores only the *direct* edges ("R inherits the permissions of R'") and
/// precomputes the transitive closure once, when the table is built. The
/// table is validated on construction: no cycles, no self edges, and the base
/// role inherits nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    /// Role -> roles it directly inherits from
    edges: BTreeMap<Role, BTreeSet<Role>>,
    /// Role -> every role reachable through `edges`, excluding itself
    closure: BTreeMap<Role, BTreeSet<Role>>,
}

impl RoleHierarchy {
    /// Build a hierarchy from direct edges. Roles not mentioned inherit nothing.
    pub fn new<I, J>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Role, J)>,
        J: IntoIterator<Item = Role>,
    {
        let mut table: BTreeMap<Role, BTreeSet<Role>> =
            Role::ALL.iter().map(|r| (*r, BTreeSet::new())).collect();

        for (role, inherited) in edges {
            table.entry(role).or_default().extend(inherited);
        }

        for (role, inherited) in &table {
            if inherited.contains(role) {
                return Err(RbacError::InvalidHierarchy(format!(
                    "role '{}' inherits from itself",
                    role
                )));
            }
        }

        let base = Role::base();
        if !table[&base].is_empty() {
            return Err(RbacError::InvalidHierarchy(format!(
                "base role '{}' must not inherit from other roles",
                base
            )));
        }

        if let Some(cycle) = find_cycle(&table) {
            let path: Vec<&str> = cycle.iter().map(|r| r.as_str()).collect();
            return Err(RbacError::InvalidHierarchy(format!(
                "inheritance cycle: {}",
                path.join(" -> ")
            )));
        }

        let closure = table
            .keys()
            .map(|role| (*role, collect_closure(&table, *role)))
            .collect();

        Ok(Self { edges: table, closure })
    }

    /// Hierarchy where no role inherits anything
    pub fn flat() -> Self {
        let empty: BTreeMap<Role, BTreeSet<Role>> =
            Role::ALL.iter().map(|r| (*r, BTreeSet::new())).collect();
        Self {
            edges: empty.clone(),
            closure: empty,
        }
    }

    /// Roles a role directly inherits from
    pub fn direct(&self, role: Role) -> &BTreeSet<Role> {
        &self.edges[&role]
    }

    /// Every role whose permissions `role` inherits, excluding itself
    pub fn closure(&self, role: Role) -> &BTreeSet<Role> {
        &self.closure[&role]
    }

    /// Check if `role` inherits (directly or not) from `ancestor`
    pub fn inherits_from(&self, role: Role, ancestor: Role) -> bool {
        self.closure(role).contains(&ancestor)
    }

    /// Every role that inherits from `role`, excluding itself
    pub fn roles_inheriting(&self, role: Role) -> BTreeSet<Role> {
        self.closure
            .iter()
            .filter(|(_, inherited)| inherited.contains(&role))
            .map(|(r, _)| *r)
            .collect()
    }

    /// Direct edge table
    pub fn edges(&self) -> &BTreeMap<Role, BTreeSet<Role>> {
        &self.edges
    }
}

impl Default for RoleHierarchy {
    /// Built-in table:
    ///
    /// ```text
    /// SUPER_ADMIN      -> ADMIN
    /// ADMIN            -> MANAGER, PROPRIETOR
    /// PROPRIETOR       -> PHARMACY_MANAGER
    /// MANAGER          -> PHARMACIST
    /// PHARMACY_MANAGER -> PHARMACIST
    /// PHARMACIST       -> TECHNICIAN
    /// TECHNICIAN       -> USER
    /// ```
    fn default() -> Self {
        Self::new([
            (Role::SuperAdmin, vec![Role::Admin]),
            (Role::Admin, vec![Role::Manager, Role::Proprietor]),
            (Role::Proprietor, vec![Role::PharmacyManager]),
            (Role::Manager, vec![Role::Pharmacist]),
            (Role::PharmacyManager, vec![Role::Pharmacist]),
            (Role::Pharmacist, vec![Role::Technician]),
            (Role::Technician, vec![Role::User]),
        ])
        .unwrap_or_else(|e| unreachable!("built-in hierarchy is valid: {}", e))
    }
}

/// BFS over direct edges
fn collect_closure(edges: &BTreeMap<Role, BTreeSet<Role>>, start: Role) -> BTreeSet<Role> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<Role> = edges[&start].iter().copied().collect();

    while let Some(role) = queue.pop_front() {
        if role == start || !seen.insert(role) {
            continue;
        }
        queue.extend(edges[&role].iter().copied());
    }

    seen
}

/// Return one cycle as a path (first role repeated at the end), if any
fn find_cycle(edges: &BTreeMap<Role, BTreeSet<Role>>) -> Option<Vec<Role>> {
    fn visit(
        role: Role,
        edges: &BTreeMap<Role, BTreeSet<Role>>,
        done: &mut HashSet<Role>,
        stack: &mut Vec<Role>,
    ) -> Option<Vec<Role>> {
        if let Some(pos) = stack.iter().position(|r| *r == role) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(role);
            return Some(cycle);
        }
        if done.contains(&role) {
            return None;
        }

        stack.push(role);
        for next in &edges[&role] {
            if let Some(cycle) = visit(*next, edges, done, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        done.insert(role);
        None
    }

    let mut done = HashSet::new();
    for role in edges.keys() {
        let mut stack = Vec::new();
        if let Some(cycle) = visit(*role, edges, &mut done, &mut stack) {
            return Some(cycle);
        }
    }
    None
}
