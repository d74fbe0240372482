//! # Entity Events
//!
//! The closed set of event kinds an entity component can subscribe to, the
//! event payload handed to handlers, and the priority scale used to order
//! handlers of the same kind.

/// One value from the closed enumeration of entity events.
///
/// The discriminants are dense and start at zero so a kind doubles as a
/// table index and as a bit position in [`EventMask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// Local or world transform changed. `n_param[0]` carries [`XformFlags`].
    Xform = 0,
    /// Transform edit finished in the editor.
    XformFinishedEditor,
    /// Entity timer expired. `n_param[0]` = timer id, `n_param[1]` = milliseconds.
    Timer,
    /// Unremovable entity respawned.
    Init,
    /// Entity is about to be removed.
    Done,
    /// Pooled entity is about to be returned to its pool.
    ReturningToPool,
    /// Visibility changed. `n_param[0]` is 1 when visible.
    Visibility,
    /// Entity state reset (editor game mode toggle).
    Reset,
    /// Child attached (sent to parent).
    Attach,
    /// Attached to a parent (sent to child).
    AttachThis,
    /// Child detached (sent to parent).
    Detach,
    /// Detached from parent (sent to child).
    DetachThis,
    /// Entity link added.
    Link,
    /// Entity link about to be removed.
    Delink,
    /// Entity must be hidden.
    Hide,
    /// Entity must be unhidden.
    Unhide,
    /// Physics processing enabled or disabled.
    EnablePhysics,
    /// Physics entity woke up or went to sleep.
    PhysicsChangeState,
    /// Script broadcast an event.
    ScriptEvent,
    /// Trigger entered an area.
    EnterArea,
    /// Trigger left an area.
    LeaveArea,
    /// Trigger entered the near region of an area.
    EnterNearArea,
    /// Trigger left the near region of an area.
    LeaveNearArea,
    /// Trigger moved inside an area.
    MoveInsideArea,
    /// Trigger moved inside the near region of an area.
    MoveNearArea,
    /// Trigger crossed between areas of the same group.
    CrossArea,
    /// Physics post-step notification.
    PhysPostStep,
    /// Breakable object broke.
    PhysBreak,
    /// AI finished its current order.
    AiDone,
    /// A sound finished playing.
    SoundDone,
    /// Entity has not been rendered for a while.
    NotSeenTimeout,
    /// Physical collision.
    Collision,
    /// Entity was rendered (only with the send-render-event flag).
    Render,
    /// Pre-physics update. `f_param[0]` = frame time.
    PrePhysicsUpdate,
    /// Level finished loading.
    LevelLoaded,
    /// Level started.
    StartLevel,
    /// Game started.
    StartGame,
    /// Entered a script state.
    EnterScriptState,
    /// Left a script state.
    LeaveScriptState,
    /// About to serialize.
    PreSerialize,
    /// Finished serializing.
    PostSerialize,
    /// Entity became invisible.
    Invisible,
    /// Entity left invisibility.
    Visible,
    /// Material changed. `n_param[0]` = material id.
    Material,
    /// Material layer mask changed.
    MaterialLayer,
    /// Hit by a weapon.
    OnHit,
    /// Animation event encountered. `n_param[0]` = event id, `n_param[1]` = slot.
    AnimEvent,
    /// Script requested a collider mode.
    ScriptRequestColliderMode,
    /// Activate a flow node output.
    ActivateFlowNodeOutput,
    /// Editor property changed.
    EditorPropertyChanged,
    /// Script reloaded in the editor.
    ReloadScript,
    /// Entity added to the update list.
    Activated,
    /// Entity removed from the update list.
    Deactivated,
    /// Script property animated by the sequencer.
    ScriptPropertyAnimated,
}

impl EventKind {
    /// Number of concrete event kinds.
    pub const COUNT: usize = 54;

    /// Every concrete kind in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Xform,
        Self::XformFinishedEditor,
        Self::Timer,
        Self::Init,
        Self::Done,
        Self::ReturningToPool,
        Self::Visibility,
        Self::Reset,
        Self::Attach,
        Self::AttachThis,
        Self::Detach,
        Self::DetachThis,
        Self::Link,
        Self::Delink,
        Self::Hide,
        Self::Unhide,
        Self::EnablePhysics,
        Self::PhysicsChangeState,
        Self::ScriptEvent,
        Self::EnterArea,
        Self::LeaveArea,
        Self::EnterNearArea,
        Self::LeaveNearArea,
        Self::MoveInsideArea,
        Self::MoveNearArea,
        Self::CrossArea,
        Self::PhysPostStep,
        Self::PhysBreak,
        Self::AiDone,
        Self::SoundDone,
        Self::NotSeenTimeout,
        Self::Collision,
        Self::Render,
        Self::PrePhysicsUpdate,
        Self::LevelLoaded,
        Self::StartLevel,
        Self::StartGame,
        Self::EnterScriptState,
        Self::LeaveScriptState,
        Self::PreSerialize,
        Self::PostSerialize,
        Self::Invisible,
        Self::Visible,
        Self::Material,
        Self::MaterialLayer,
        Self::OnHit,
        Self::AnimEvent,
        Self::ScriptRequestColliderMode,
        Self::ActivateFlowNodeOutput,
        Self::EditorPropertyChanged,
        Self::ReloadScript,
        Self::Activated,
        Self::Deactivated,
        Self::ScriptPropertyAnimated,
    ];

    /// Returns the dense index of this kind.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks a kind up by its dense index.
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the single-bit mask for this kind.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u64 {
        1 << (self as u64)
    }
}

/// Selects either one concrete kind or every kind at once.
///
/// `All` exists only for bulk enable/disable and is expanded by the
/// distributor into a loop over [`EventKind::ALL`]; it is never stored as a
/// subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventSelector {
    /// Every concrete kind.
    All,
    /// A single kind.
    Kind(EventKind),
}

impl EventSelector {
    /// Expands the selector into the concrete kinds it covers.
    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        let (all, one) = match self {
            Self::All => (true, None),
            Self::Kind(kind) => (false, Some(kind)),
        };
        EventKind::ALL
            .into_iter()
            .filter(move |kind| all || one == Some(*kind))
    }
}

impl From<EventKind> for EventSelector {
    fn from(kind: EventKind) -> Self {
        Self::Kind(kind)
    }
}

/// Set of event kinds, one bit per [`EventKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EventMask(u64);

impl EventMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Checks whether `kind` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Adds `kind`, returning `true` if it was not present.
    #[inline]
    pub fn insert(&mut self, kind: EventKind) -> bool {
        let absent = !self.contains(kind);
        self.0 |= kind.bit();
        absent
    }

    /// Removes `kind`, returning `true` if it was present.
    #[inline]
    pub fn remove(&mut self, kind: EventKind) -> bool {
        let present = self.contains(kind);
        self.0 &= !kind.bit();
        present
    }

    /// Checks whether the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of kinds in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the kinds in the set in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<EventKind> for EventMask {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for kind in iter {
            mask.insert(kind);
        }
        mask
    }
}

/// Flags carried in `n_param[0]` of an [`EventKind::Xform`] event.
pub struct XformFlags;

impl XformFlags {
    /// Position changed.
    pub const POSITION: i64 = 1 << 1;
    /// Rotation changed.
    pub const ROTATION: i64 = 1 << 2;
    /// Scale changed.
    pub const SCALE: i64 = 1 << 3;
    /// Transform inherited from the parent.
    pub const FROM_PARENT: i64 = 1 << 5;
    /// Do not re-register the object with the scene (character optimization).
    pub const NOT_REREGISTER: i64 = 1 << 17;
}

/// An event instance as handed to every subscriber of its kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityEvent {
    /// Which kind of event this is.
    pub kind: EventKind,
    /// Integer parameters, meaning depends on the kind.
    pub n_param: [i64; 4],
    /// Float parameters, meaning depends on the kind.
    pub f_param: [f32; 2],
}

impl EntityEvent {
    /// Creates an event with zeroed parameters.
    #[inline]
    #[must_use]
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            n_param: [0; 4],
            f_param: [0.0; 2],
        }
    }

    /// Sets integer parameter `slot` (0-3).
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[must_use]
    pub fn with_int(mut self, slot: usize, value: i64) -> Self {
        self.n_param[slot] = value;
        self
    }

    /// Sets float parameter `slot` (0-1).
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[must_use]
    pub fn with_float(mut self, slot: usize, value: f32) -> Self {
        self.f_param[slot] = value;
        self
    }
}

/// Dispatch priority of a component for one event kind. Higher runs first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EventPriority(pub i32);

impl EventPriority {
    /// Components with no particular ordering requirement.
    pub const DEFAULT: Self = Self(0);
    /// Game object extensions (vehicles, actors) layered on top of an entity.
    pub const GAME_OBJECT_EXTENSION: Self = Self(1000);
    /// Script component.
    pub const SCRIPT: Self = Self(2000);
    /// Trigger / area components.
    pub const TRIGGER: Self = Self(3000);
    /// Render component.
    pub const RENDER: Self = Self(4000);
    /// Physics component. Processes a frame event before anything else.
    pub const PHYSICS: Self = Self(5000);

    /// Returns this priority shifted by `delta`, saturating at the bounds.
    #[inline]
    #[must_use]
    pub const fn offset(self, delta: i32) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_table_is_dense() {
        for (index, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
        assert_eq!(
            EventKind::ScriptPropertyAnimated.index(),
            EventKind::COUNT - 1
        );
        assert!(EventKind::COUNT <= 64);
    }

    #[test]
    fn test_selector_expansion() {
        assert_eq!(EventSelector::All.kinds().count(), EventKind::COUNT);
        let one: Vec<_> = EventSelector::from(EventKind::Timer).kinds().collect();
        assert_eq!(one, vec![EventKind::Timer]);
    }

    #[test]
    fn test_mask_insert_remove() {
        let mut mask = EventMask::EMPTY;
        assert!(mask.insert(EventKind::Hide));
        assert!(!mask.insert(EventKind::Hide));
        assert!(mask.insert(EventKind::ScriptPropertyAnimated));
        assert_eq!(mask.len(), 2);
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            vec![EventKind::Hide, EventKind::ScriptPropertyAnimated]
        );
        assert!(mask.remove(EventKind::Hide));
        assert!(!mask.remove(EventKind::Hide));
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_domain_priority_order() {
        assert!(EventPriority::PHYSICS > EventPriority::RENDER);
        assert!(EventPriority::RENDER > EventPriority::SCRIPT);
        assert!(EventPriority::GAME_OBJECT_EXTENSION.offset(1) > EventPriority::GAME_OBJECT_EXTENSION);
    }

    #[test]
    fn test_event_builder() {
        let event = EntityEvent::new(EventKind::Timer)
            .with_int(0, 7)
            .with_float(1, 0.5);
        assert_eq!(event.n_param, [7, 0, 0, 0]);
        assert!((event.f_param[1] - 0.5).abs() < f32::EPSILON);
    }
}
