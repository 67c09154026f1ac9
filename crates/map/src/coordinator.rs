use foundation::bounds::Aabb2;
use foundation::ids::{DatasetId, GroupId, LayerId};
use layers::{GroupOptions, RenderGroup, Style, Surface};
use model::DatasetHandle;
use tracing::{debug, trace, warn};

use crate::config::MapConfig;
use crate::events::{HitEvent, MapEvent, ModelEvent, UpdateFlags, ViewportEvent};
use crate::groups::{GroupSet, Role};
use crate::styles::layer_role_style;
use crate::viewport::Viewport;

/// What an active-layer update did to the camera.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// The viewport was re-fit to the active layer.
    Reset,
    /// The camera stayed put and every group was redrawn.
    Refresh,
}

/// Style computed when a role was last assigned.
#[derive(Debug, Default)]
struct RoleStyles {
    active: Option<Style>,
    highlight: Option<Style>,
    hover: Option<Style>,
}

impl RoleStyles {
    fn get(&self, role: Role) -> Option<&Style> {
        match role {
            Role::Active => self.active.as_ref(),
            Role::Highlight => self.highlight.as_ref(),
            Role::Hover => self.hover.as_ref(),
        }
    }

    fn set(&mut self, role: Role, style: Option<Style>) {
        match role {
            Role::Active => self.active = style,
            Role::Highlight => self.highlight = style,
            Role::Hover => self.hover = style,
        }
    }
}

/// Keeps render groups, roles and the camera in step with the model.
///
/// Handlers are synchronous and never re-enter each other: a camera reset is
/// reported back by the viewport and handled here as a viewport change.
pub struct MapCoordinator<S: Surface, V: Viewport> {
    surface: S,
    viewport: V,
    config: MapConfig,
    groups: GroupSet<S::Group>,
    styles: RoleStyles,
}

impl<S: Surface, V: Viewport> MapCoordinator<S, V> {
    pub fn new(surface: S, viewport: V, config: MapConfig) -> Self {
        Self {
            surface,
            viewport,
            config,
            groups: GroupSet::new(),
            styles: RoleStyles::default(),
        }
    }

    /// The surface the groups are attached to.
    pub fn element(&self) -> &S {
        &self.surface
    }

    pub fn extent(&self) -> &V {
        &self.viewport
    }

    /// Direct camera access. Callers that move the camera must follow up with
    /// `ViewportEvent::Change`.
    pub fn extent_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn groups(&self) -> &GroupSet<S::Group> {
        &self.groups
    }

    pub fn find_group(&self, dataset: DatasetId) -> Option<GroupId> {
        self.groups.find(dataset)
    }

    pub fn group(&self, id: GroupId) -> Option<&S::Group> {
        self.groups.get(id)
    }

    pub fn holder(&self, role: Role) -> Option<GroupId> {
        self.groups.holder(role)
    }

    pub fn role_of(&self, id: GroupId) -> Option<Role> {
        self.groups.role_of(id)
    }

    /// Style the group holding `role` is drawn with.
    pub fn role_style(&self, role: Role) -> Option<&Style> {
        self.groups.holder(role).and_then(|_| self.styles.get(role))
    }

    /// Bounds of the active layer, if any.
    pub fn active_bounds(&self) -> Option<Aabb2> {
        self.groups
            .holder(Role::Active)
            .and_then(|id| self.groups.get(id))
            .and_then(RenderGroup::bounds)
    }

    /// Routes an event to its handler. Only active-layer updates report a
    /// camera action.
    pub fn dispatch(&mut self, event: MapEvent) -> Option<ViewAction> {
        match event {
            MapEvent::Model(e) => self.on_model_event(e),
            MapEvent::Hit(e) => {
                self.on_hit(e);
                None
            }
            MapEvent::Viewport(ViewportEvent::Change) => {
                self.on_viewport_change();
                None
            }
        }
    }

    pub fn on_model_event(&mut self, event: ModelEvent) -> Option<ViewAction> {
        match event {
            ModelEvent::Delete { dataset } => {
                self.on_delete(&dataset);
                None
            }
            ModelEvent::Select => {
                self.on_select();
                None
            }
            ModelEvent::Update {
                dataset,
                layer,
                flags,
            } => Some(self.on_update(&dataset, layer, flags)),
        }
    }

    /// Makes `layer` of `dataset` the active layer, then either re-fits the
    /// camera or redraws every group.
    pub fn on_update(
        &mut self,
        dataset: &DatasetHandle,
        layer: LayerId,
        flags: UpdateFlags,
    ) -> ViewAction {
        let prev = self.active_bounds();
        let id = self.get_or_create(dataset, GroupOptions::default());

        if let Some(group) = self.groups.get_mut(id) {
            if flags.geometry_changed() {
                if flags.proj {
                    group.set_retained_pct(1.0);
                }
                group.updated();
            }
            group.show_layer(layer);
        }

        let style = {
            let ds = dataset.borrow();
            layer_role_style(
                &self.config.palette.active,
                &self.config.palette,
                &self.config.dot_size,
                &ds,
                ds.layer(layer),
            )
        };
        self.assign(Role::Active, id, Some(style));

        let Some(new) = self.groups.get(id).and_then(RenderGroup::bounds) else {
            debug!(dataset = %dataset.id(), %layer, "active layer has no bounds");
            self.refresh_all();
            return ViewAction::Refresh;
        };

        let reset = self
            .config
            .reset
            .needs_reset(&new, prev.as_ref(), &self.viewport.bounds());
        self.viewport.set_bounds(new);
        if reset {
            debug!(dataset = %dataset.id(), %layer, "resetting viewport");
            if self.viewport.reset(true) {
                self.on_viewport_change();
            }
            ViewAction::Reset
        } else {
            self.refresh_all();
            ViewAction::Refresh
        }
    }

    pub fn on_delete(&mut self, dataset: &DatasetHandle) {
        self.delete_group(dataset.id());
    }

    /// Selection moved: the hover group no longer applies. Every other group
    /// keeps its role.
    pub fn on_select(&mut self) {
        if let Some(id) = self.groups.holder(Role::Hover) {
            self.remove_group(id);
        }
    }

    /// Moves the hover role to the hit layer and redraws the hover group.
    pub fn on_hit(&mut self, hit: HitEvent) {
        let HitEvent {
            dataset,
            layer,
            pinned,
        } = hit;

        if let Some(id) = self.groups.holder(Role::Hover) {
            let same = self
                .groups
                .get(id)
                .is_some_and(|g| g.dataset().id() == dataset.id());
            if !same {
                self.remove_group(id);
            }
        }
        if let Some(held) = self.blocking_role(dataset.id(), Role::Hover) {
            debug!(dataset = %dataset.id(), %held, "hover skipped");
            return;
        }

        let id = self.get_or_create(&dataset, GroupOptions::no_filtering());
        if let Some(group) = self.groups.get_mut(id) {
            group.show_layer(layer);
        }
        let kind = dataset.borrow().layer(layer).and_then(|l| l.geometry);
        let style = self.config.palette.hover_style(kind, pinned);
        self.assign(Role::Hover, id, style);
        self.refresh_one(id, true);
    }

    pub fn on_viewport_change(&mut self) {
        trace!(groups = self.groups.len(), "viewport changed");
        self.refresh_all();
    }

    /// Replaces the highlighted layer. `None` only clears the current one.
    pub fn set_highlight_layer(&mut self, layer: Option<LayerId>, dataset: &DatasetHandle) {
        if let Some(id) = self.groups.holder(Role::Highlight) {
            self.remove_group(id);
        }
        let Some(layer) = layer else {
            return;
        };
        if let Some(held) = self.blocking_role(dataset.id(), Role::Highlight) {
            warn!(dataset = %dataset.id(), %layer, %held, "highlight refused");
            return;
        }

        let id = self.get_or_create(dataset, GroupOptions::default());
        if let Some(group) = self.groups.get_mut(id) {
            group.show_layer(layer);
        }
        let style = {
            let ds = dataset.borrow();
            layer_role_style(
                &self.config.palette.highlight,
                &self.config.palette,
                &self.config.dot_size,
                &ds,
                ds.layer(layer),
            )
        };
        self.assign(Role::Highlight, id, Some(style));
        self.refresh_one(id, true);
    }

    /// Changes how much simplification detail the active layer shows.
    pub fn set_simplify_pct(&mut self, pct: f64) {
        let Some(id) = self.groups.holder(Role::Active) else {
            warn!(pct, "no active layer to simplify");
            return;
        };
        if let Some(group) = self.groups.get_mut(id) {
            group.set_retained_pct(pct);
        }
        self.refresh_one(id, false);
    }

    /// Redraws the group representing `dataset`, if there is one.
    pub fn refresh_layer(&mut self, dataset: &DatasetHandle) {
        if let Some(id) = self.groups.find(dataset.id()) {
            self.refresh_one(id, false);
        }
    }

    pub fn refresh(&mut self) {
        self.refresh_all();
    }

    /// Removes every group of `dataset` along with any role it held.
    pub fn delete_group(&mut self, dataset: DatasetId) {
        for (id, group) in self.groups.remove_dataset(dataset) {
            debug!(%dataset, group = %id, "group deleted");
            self.teardown(id, group);
        }
        self.forget_vacant_styles();
    }

    fn remove_group(&mut self, id: GroupId) {
        if let Some(group) = self.groups.remove(id) {
            debug!(dataset = %group.dataset().id(), group = %id, "group deleted");
            self.teardown(id, group);
        }
        self.forget_vacant_styles();
    }

    fn teardown(&mut self, id: GroupId, mut group: S::Group) {
        group.remove();
        self.surface.detach(id);
    }

    fn add_group(&mut self, dataset: DatasetHandle, options: GroupOptions) -> GroupId {
        let ds_id = dataset.id();
        let group = self.surface.create_group(dataset, options);
        let id = self.groups.insert(group);
        self.surface.attach(id);
        debug!(dataset = %ds_id, group = %id, no_filtering = options.no_filtering, "group added");
        id
    }

    /// Returns the dataset's group, creating it when missing. A group created
    /// with different options is replaced.
    fn get_or_create(&mut self, dataset: &DatasetHandle, options: GroupOptions) -> GroupId {
        if let Some(id) = self.groups.find(dataset.id()) {
            let reusable = self.groups.get(id).is_some_and(|g| g.options() == options);
            if reusable {
                return id;
            }
            self.remove_group(id);
        }
        self.add_group(dataset.clone(), options)
    }

    /// Role held by `dataset`'s group that outranks `wanted`.
    fn blocking_role(&self, dataset: DatasetId, wanted: Role) -> Option<Role> {
        self.groups
            .find(dataset)
            .and_then(|id| self.groups.role_of(id))
            .filter(|held| held.outranks(wanted))
    }

    fn assign(&mut self, role: Role, id: GroupId, style: Option<Style>) {
        if self.groups.holder(role) != Some(id) {
            debug!(group = %id, %role, "role assigned");
        }
        self.groups.assign(role, id);
        self.styles.set(role, style);
        self.forget_vacant_styles();
    }

    fn forget_vacant_styles(&mut self) {
        for role in [Role::Active, Role::Highlight, Role::Hover] {
            if self.groups.holder(role).is_none() {
                self.styles.set(role, None);
            }
        }
    }

    fn refresh_one(&mut self, id: GroupId, full: bool) {
        let view = self.viewport.transform();
        let style = self.groups.role_of(id).and_then(|r| self.styles.get(r));
        let Some(group) = self.groups.get_mut(id) else {
            return;
        };
        match style {
            None => group.hide(),
            Some(style) if full => group.draw_shapes(style, &view),
            Some(style) => group.draw_structure(style, &view),
        }
        trace!(group = %id, full, visibility = ?group.visibility(), "group refreshed");
    }

    fn refresh_all(&mut self) {
        for id in self.groups.ids() {
            self.refresh_one(id, false);
        }
    }
}
