use std::fmt;

use foundation::ids::{DatasetId, GroupId};
use layers::RenderGroup;

/// Role a render group plays on the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// The layer being edited.
    Active,
    /// A secondary layer spotlighted by the application.
    Highlight,
    /// The layer under the pointer.
    Hover,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Role::Active => 3,
            Role::Highlight => 2,
            Role::Hover => 1,
        }
    }

    /// True when a group holding `self` must not be taken over for `other`.
    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Active => "active",
            Role::Highlight => "highlight",
            Role::Hover => "hover",
        })
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
struct Roles {
    active: Option<GroupId>,
    highlight: Option<GroupId>,
    hover: Option<GroupId>,
}

impl Roles {
    fn slot(&mut self, role: Role) -> &mut Option<GroupId> {
        match role {
            Role::Active => &mut self.active,
            Role::Highlight => &mut self.highlight,
            Role::Hover => &mut self.hover,
        }
    }

    fn get(&self, role: Role) -> Option<GroupId> {
        match role {
            Role::Active => self.active,
            Role::Highlight => self.highlight,
            Role::Hover => self.hover,
        }
    }

    fn release(&mut self, id: GroupId) {
        for slot in [&mut self.active, &mut self.highlight, &mut self.hover] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }
}

/// Live render groups plus the role table pointing into them.
///
/// Invariants kept here rather than by callers:
/// - at most one live group per dataset;
/// - each role names at most one group and each group holds at most one role;
/// - removing a group releases whatever role it held.
///
/// Iteration follows insertion order.
#[derive(Debug)]
pub struct GroupSet<G> {
    next_id: u64,
    groups: Vec<(GroupId, G)>,
    roles: Roles,
}

impl<G> Default for GroupSet<G> {
    fn default() -> Self {
        Self {
            next_id: 1,
            groups: Vec::new(),
            roles: Roles::default(),
        }
    }
}

impl<G: RenderGroup> GroupSet<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &G)> + '_ {
        self.groups.iter().map(|(id, g)| (*id, g))
    }

    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|(id, _)| *id).collect()
    }

    pub fn get(&self, id: GroupId) -> Option<&G> {
        self.groups.iter().find(|(gid, _)| *gid == id).map(|(_, g)| g)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut G> {
        self.groups
            .iter_mut()
            .find(|(gid, _)| *gid == id)
            .map(|(_, g)| g)
    }

    pub fn find(&self, dataset: DatasetId) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|(_, g)| g.dataset().id() == dataset)
            .map(|(id, _)| *id)
    }

    /// Appends a group. Callers look up with [`GroupSet::find`] first.
    pub fn insert(&mut self, group: G) -> GroupId {
        debug_assert!(
            self.find(group.dataset().id()).is_none(),
            "duplicate render group for {}",
            group.dataset().id()
        );
        let id = GroupId(self.next_id);
        self.next_id += 1;
        self.groups.push((id, group));
        id
    }

    pub fn remove(&mut self, id: GroupId) -> Option<G> {
        let pos = self.groups.iter().position(|(gid, _)| *gid == id)?;
        self.roles.release(id);
        Some(self.groups.remove(pos).1)
    }

    /// Removes every group of `dataset`; zero matches is a no-op.
    pub fn remove_dataset(&mut self, dataset: DatasetId) -> Vec<(GroupId, G)> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.groups)
            .into_iter()
            .partition(|(_, g)| g.dataset().id() == dataset);
        self.groups = kept;
        for (id, _) in &removed {
            self.roles.release(*id);
        }
        removed
    }

    pub fn holder(&self, role: Role) -> Option<GroupId> {
        self.roles.get(role)
    }

    pub fn role_of(&self, id: GroupId) -> Option<Role> {
        [Role::Active, Role::Highlight, Role::Hover]
            .into_iter()
            .find(|r| self.roles.get(*r) == Some(id))
    }

    /// Gives `role` to group `id`. The group drops any other role it held and
    /// the previous holder of `role` becomes role-less.
    pub fn assign(&mut self, role: Role, id: GroupId) {
        debug_assert!(self.get(id).is_some(), "assigning {role} to dead {id}");
        self.roles.release(id);
        *self.roles.slot(role) = Some(id);
    }

    pub fn clear(&mut self, role: Role) -> Option<GroupId> {
        self.roles.slot(role).take()
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupSet, Role};
    use foundation::ids::DatasetId;
    use layers::{GroupOptions, LayerGroup};
    use model::{Dataset, DatasetHandle};

    fn group(id: u64) -> LayerGroup {
        let ds = DatasetHandle::new(Dataset::new(DatasetId(id), Vec::new(), None));
        LayerGroup::new(ds, GroupOptions::default())
    }

    #[test]
    fn find_insert_remove() {
        let mut set = GroupSet::new();
        assert!(set.find(DatasetId(1)).is_none());
        let a = set.insert(group(1));
        let b = set.insert(group(2));
        assert_ne!(a, b);
        assert_eq!(set.find(DatasetId(2)), Some(b));
        assert_eq!(set.ids(), vec![a, b]);

        assert!(set.remove_dataset(DatasetId(3)).is_empty());
        let removed = set.remove_dataset(DatasetId(1));
        assert_eq!(removed.len(), 1);
        assert_eq!(set.len(), 1);
        assert!(set.find(DatasetId(1)).is_none());
    }

    #[test]
    fn one_role_per_group_and_group_per_role() {
        let mut set = GroupSet::new();
        let a = set.insert(group(1));
        let b = set.insert(group(2));

        set.assign(Role::Hover, a);
        set.assign(Role::Active, a);
        assert_eq!(set.role_of(a), Some(Role::Active));
        assert_eq!(set.holder(Role::Hover), None);

        set.assign(Role::Active, b);
        assert_eq!(set.role_of(a), None);
        assert_eq!(set.holder(Role::Active), Some(b));
    }

    #[test]
    fn removal_releases_roles() {
        let mut set = GroupSet::new();
        let a = set.insert(group(1));
        let b = set.insert(group(2));
        set.assign(Role::Highlight, a);
        set.assign(Role::Active, b);

        set.remove_dataset(DatasetId(1));
        assert_eq!(set.holder(Role::Highlight), None);
        assert!(set.remove(b).is_some());
        assert_eq!(set.holder(Role::Active), None);
        assert!(set.remove(b).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut set = GroupSet::new();
        let a = set.insert(group(1));
        set.remove(a);
        let b = set.insert(group(1));
        assert_ne!(a, b);
    }

    #[test]
    fn role_precedence() {
        assert!(Role::Active.outranks(Role::Highlight));
        assert!(Role::Highlight.outranks(Role::Hover));
        assert!(!Role::Hover.outranks(Role::Hover));
        assert!(!Role::Hover.outranks(Role::Active));
    }
}
