use bevy::{
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};

use crate::{error::Result, mesh::IsoMesh, volume::Volume};

/// System sets for the extraction pipeline.
///
/// Use these to order your own systems relative to mesh generation:
///
/// ```rust,ignore
/// // Run after geometry is ready but before it's uploaded, e.g. to build a collider:
/// app.add_systems(Update, build_collider.after(IsosurfaceSet::Generate)
///                                       .before(IsosurfaceSet::Upload));
/// ```
///
/// ```text
/// IsosurfaceSet::Spawn  →  [async compute]  →  IsosurfaceSet::Generate  →  [your systems]  →  IsosurfaceSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum IsosurfaceSet {
    /// Spawns an async compute task for each queued volume.
    Spawn,
    /// Polls async tasks and inserts [`GeneratedMesh`] on completion.
    Generate,
    /// Uploads [`GeneratedMesh`] into a Bevy [`Mesh3d`] and removes it.
    Upload,
}

/// Marker component added to [`Volume`] entities waiting to be meshed.
///
/// Removed once the volume's mesh has been uploaded or its extraction failed.
#[derive(Component)]
pub struct QueuedVolume;

/// Holds the in-flight extraction for a [`Volume`].
#[derive(Component)]
pub struct ComputeTask(Task<Result<IsoMesh>>);

/// The finished mesh of a [`Volume`], present between [`IsosurfaceSet::Generate`] and
/// [`IsosurfaceSet::Upload`].
#[derive(Component, Debug, Deref)]
pub struct GeneratedMesh(pub IsoMesh);

/// Runtime configuration for the extraction pipeline.
///
/// Inserted as a resource by [`IsosurfacePlugin`]:
///
/// ```rust,ignore
/// app.add_plugins(IsosurfacePlugin { max_tasks_per_frame: 8 });
///
/// fn my_system(mut config: ResMut<IsosurfaceConfig>) {
///     config.max_tasks_per_frame = 1;
/// }
/// ```
#[derive(Resource)]
pub struct IsosurfaceConfig {
    /// Maximum number of extraction tasks spawned per frame. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for IsosurfaceConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that meshes [`Volume`]s off the main thread.
///
/// With the `auto_queue` feature every added or changed [`Volume`] is processed:
///
/// ```text
/// Volume added / changed
///   → QueuedVolume inserted         (queue_volumes)
///   → ComputeTask spawned           (IsosurfaceSet::Spawn)
///   → [async compute runs]
///   → GeneratedMesh inserted        (IsosurfaceSet::Generate, once the task completes)
///   → Mesh3d inserted               (IsosurfaceSet::Upload, skipped for empty meshes)
///   → QueuedVolume + GeneratedMesh removed
/// ```
pub struct IsosurfacePlugin {
    /// Initial value for [`IsosurfaceConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for IsosurfacePlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: IsosurfaceConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for IsosurfacePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(IsosurfaceConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        });

        #[cfg(feature = "auto_queue")]
        app.configure_sets(
            Update,
            (
                IsosurfaceSet::Spawn,
                IsosurfaceSet::Generate,
                IsosurfaceSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                queue_volumes.before(IsosurfaceSet::Spawn),
                spawn_mesh_tasks.in_set(IsosurfaceSet::Spawn),
                poll_mesh_tasks.in_set(IsosurfaceSet::Generate),
                upload_mesh.in_set(IsosurfaceSet::Upload),
            ),
        );
    }
}

/// Queues every added or modified [`Volume`], dropping any extraction already running
/// for its previous state.
pub fn queue_volumes(mut commands: Commands, query: Query<Entity, Changed<Volume>>) {
    for entity in query.iter() {
        commands
            .entity(entity)
            .insert(QueuedVolume)
            .remove::<(ComputeTask, GeneratedMesh)>();
    }
}

/// Spawns extraction tasks for [`QueuedVolume`]s, up to [`IsosurfaceConfig::max_tasks_per_frame`] per frame.
pub fn spawn_mesh_tasks(
    mut commands: Commands,
    config: Res<IsosurfaceConfig>,
    query: Query<
        (Entity, &Volume),
        (With<QueuedVolume>, Without<ComputeTask>, Without<GeneratedMesh>),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, volume) in query.iter().take(config.max_tasks_per_frame) {
        // Only the field handle is cloned; the field itself is shared.
        let volume = volume.clone();
        let task = task_pool.spawn(async move { volume.extract() });
        commands.entity(entity).insert(ComputeTask(task));
    }
}

/// Polls in-flight [`ComputeTask`]s and inserts [`GeneratedMesh`] on success.
///
/// Failed extractions are logged and dequeued.
pub fn poll_mesh_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut compute_task.0)) else {
            continue;
        };

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<ComputeTask>();
        match result {
            Ok(mesh) => {
                entity_commands.insert(GeneratedMesh(mesh));
            }
            Err(error) => {
                warn!("extraction failed for {entity}: {error}");
                entity_commands.remove::<QueuedVolume>();
            }
        }
    }
}

/// Uploads each [`GeneratedMesh`] into a [`Mesh3d`], then removes it and [`QueuedVolume`].
///
/// An empty mesh clears any previous [`Mesh3d`] instead of uploading.
pub fn upload_mesh(
    mut commands: Commands,
    query: Query<(Entity, &GeneratedMesh), With<QueuedVolume>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, generated) in query.iter() {
        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<(QueuedVolume, GeneratedMesh)>();

        if generated.is_empty() {
            debug!("volume {entity} has no surface");
            entity_commands.remove::<Mesh3d>();
            continue;
        }

        entity_commands.insert(Mesh3d(meshes.add(generated.to_bevy_mesh())));
    }
}

#[cfg(all(test, feature = "auto_queue"))]
mod tests {
    use super::*;
    use crate::{
        field::sphere,
        types::{Bounds, Point},
    };

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .add_plugins(IsosurfacePlugin::default());
        app
    }

    fn run_until(app: &mut App, entity: Entity, done: impl Fn(&World, Entity) -> bool) {
        for _ in 0..1000 {
            app.update();
            if done(app.world(), entity) {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        panic!("volume was never processed");
    }

    fn finished(world: &World, entity: Entity) -> bool {
        world.get::<QueuedVolume>(entity).is_none()
    }

    #[test]
    fn spawned_volume_gets_a_mesh() {
        let mut app = app();
        let entity = app.world_mut().spawn(Volume::new(sphere(4.0))).id();
        run_until(&mut app, entity, finished);

        assert!(app.world().get::<Mesh3d>(entity).is_some());
        assert!(app.world().get::<GeneratedMesh>(entity).is_none());
    }

    #[test]
    fn empty_volume_is_not_uploaded() {
        let mut app = app();
        let far = Bounds::new(Point::new(20.0, 20.0, 20.0), Point::new(24.0, 24.0, 24.0));
        let entity = app
            .world_mut()
            .spawn(Volume::new(sphere(4.0)).with_bounds(far))
            .id();
        run_until(&mut app, entity, finished);

        assert!(app.world().get::<Mesh3d>(entity).is_none());
    }

    #[test]
    fn failed_extraction_is_dequeued() {
        let mut app = app();
        let entity = app
            .world_mut()
            .spawn(Volume::new(sphere(4.0)).with_cell_size(0.0))
            .id();
        run_until(&mut app, entity, finished);

        assert!(app.world().get::<Mesh3d>(entity).is_none());
        assert!(app.world().get::<ComputeTask>(entity).is_none());
    }

    #[test]
    fn changing_a_volume_requeues_it() {
        let mut app = app();
        let far = Bounds::new(Point::new(20.0, 20.0, 20.0), Point::new(24.0, 24.0, 24.0));
        let entity = app
            .world_mut()
            .spawn(Volume::new(sphere(4.0)).with_bounds(far))
            .id();
        run_until(&mut app, entity, finished);
        assert!(app.world().get::<Mesh3d>(entity).is_none());

        if let Some(mut volume) = app.world_mut().get_mut::<Volume>(entity) {
            volume.params.bounds = Bounds::default();
        }
        run_until(&mut app, entity, |world, entity| {
            world.get::<Mesh3d>(entity).is_some()
        });
    }
}
