//! [`RealtimeEngine`] — the uniform surface shared by
//! [`crate::OfflineRealtimeEngine`] and [`crate::OnlineRealtimeEngine`] (§4.5).

use csp_entity::SpaceEntity;
use csp_math::Transform;

use crate::collections::EntityCallbacks;
use crate::error::EngineError;

/// Parameters for [`RealtimeEngine::create_avatar`].
#[derive(Debug, Clone)]
pub struct CreateAvatarParams {
    pub name: String,
    pub user_id: u64,
    pub transform: Transform,
    pub is_visible: bool,
    pub avatar_state: String,
    pub avatar_id: String,
    pub play_mode: String,
}

impl CreateAvatarParams {
    #[must_use]
    pub fn new(name: impl Into<String>, user_id: u64, transform: Transform) -> Self {
        Self {
            name: name.into(),
            user_id,
            transform,
            is_visible: true,
            avatar_state: String::new(),
            avatar_id: String::new(),
            play_mode: String::new(),
        }
    }
}

/// Parameters for [`RealtimeEngine::create_entity`].
#[derive(Debug, Clone)]
pub struct CreateEntityParams {
    pub name: String,
    pub transform: Transform,
    pub parent_id: Option<u64>,
}

impl CreateEntityParams {
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            parent_id: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// The uniform entity-CRUD/iteration/tick surface both engine
/// implementations expose (§4.5).
///
/// Long-running operations (`create_avatar`, `create_entity`,
/// `destroy_entity`, `fetch_all_entities_and_populate_buffers`) are native
/// `async fn`s rather than the source's callback parameters — per §9's
/// design note, a continuation chain maps directly onto the target
/// language's asynchrony, and a future already guarantees the "invoked
/// exactly once" contract the source enforced by hand. Per-entity
/// update/destroy/patch-sent observers (§6 Public surface) are instead
/// registered once via [`RealtimeEngine::set_entity_callbacks`] and fired
/// repeatedly by the engine as patches are applied or entities torn down.
///
/// Not `Send`/`Sync`: an entity's attached `EntityScript` owns a `quick_js`
/// context, which is thread-confined. This matches §5's scheduling model —
/// one application thread drives ticks, callbacks from other threads
/// (transport) are only ever queued, never given direct engine access — and
/// §9's suggested alternative to recursive locking: a single owner thread
/// rather than cross-thread sharing.
pub trait RealtimeEngine {
    /// Allocate an id, materialize a new avatar entity with an
    /// `AvatarComponent` pre-attached, and (online only) announce it to the
    /// hub. Errors are logged and returned rather than panicking, matching
    /// §7's propagation policy.
    fn create_avatar(
        &self,
        params: CreateAvatarParams,
    ) -> impl Future<Output = Result<u64, EngineError>>;

    /// Allocate an id and materialize a new object entity (no avatar
    /// component), optionally parented.
    fn create_entity(
        &self,
        params: CreateEntityParams,
    ) -> impl Future<Output = Result<u64, EngineError>>;

    /// Destroy `entity_id`: reparent its children to root, tear down the
    /// local view immediately, and (online only) emit the compound
    /// delete+reparent patch. Returns whether the entity was known.
    fn destroy_entity(&self, entity_id: u64) -> impl Future<Output = Result<bool, EngineError>>;

    /// Register (or replace) the update/destroy/patch-sent callbacks for
    /// `entity_id`.
    fn set_entity_callbacks(&self, entity_id: u64, callbacks: EntityCallbacks);

    /// Run `f` with read access to `entity_id`'s current committed state,
    /// or `None` if unknown. Acquires the engine's entity lock (§5).
    fn with_entity<R>(&self, entity_id: u64, f: impl FnOnce(Option<&SpaceEntity>) -> R) -> R;

    /// Run `f` with mutable access to `entity_id`, or `None` if unknown.
    fn with_entity_mut<R>(&self, entity_id: u64, f: impl FnOnce(Option<&mut SpaceEntity>) -> R) -> R;

    /// Run `f` with read access to the full entity/avatar/object/
    /// root-hierarchy collections, holding the entity lock for the
    /// duration — the Rust analogue of §4.5's `lockEntityUpdate` family:
    /// callers that need to iterate collections concurrently with a tick
    /// take the lock for exactly the closure's scope instead of a manual
    /// lock/unlock pair.
    fn with_collections<R>(&self, f: impl FnOnce(&crate::collections::EngineCollections) -> R) -> R;

    /// Enqueue `entity_id` into the de-duplicated pending-outbound set
    /// (§4.4 `queueUpdate`).
    fn queue_entity_update(&self, entity_id: u64);

    /// Drain pending adds/incoming patches/outbound sends/removes for one
    /// tick (§4.7's `ProcessPendingEntityOperations`, or the offline
    /// engine's synchronous equivalent).
    fn process_pending_entity_operations(&self) -> impl Future<Output = Result<(), EngineError>>;

    /// Populate the engine's collections from `space_id`: the initial
    /// paged fetch for the online engine, or the scene-loaded count for the
    /// offline engine (§4.6, §4.7). `started` fires once fetching begins;
    /// `complete` fires exactly once with the total entity count loaded.
    fn fetch_all_entities_and_populate_buffers(
        &self,
        space_id: &str,
        started: impl FnOnce(),
        complete: impl FnOnce(u32),
    ) -> impl Future<Output = Result<(), EngineError>>;
}
