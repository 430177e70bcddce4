//! Rapier query world for static level geometry.
//!
//! Level colliders are described with [`WorldStaticDef`] and built once into a
//! [`RapierQueryWorld`]. The world only answers queries: ray casts, overlap tests and the
//! capsule sweeps of Rapier's `KinematicCharacterController`. Nothing in it moves.
//!
//! Every collider carries a layer mask in its `user_data`; masked queries skip colliders
//! whose layers do not intersect the query mask.

pub use rapier3d;

use rapier3d::{
    na::{Translation3, UnitQuaternion},
    parry::{query as parry_query, shape::Shape},
    prelude::*,
};

use crate::{math::Vec3, settings::ALL_LAYERS};

/// Definition of one immutable level collider.
///
/// Planes take their normal from the pose (`rotation * +Y`) and pass through
/// `translation + normal * offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable identifier; colliders are inserted in `id` order.
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    /// Collision layers this collider belongs to.
    pub layers: u32,
}

impl WorldStaticDef {
    pub fn new(id: u32, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            layers: ALL_LAYERS,
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }
}

#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), solid below the normal.
    Plane { offset_along_normal: f32 },
    Cuboid { half_extents: Vector<f32> },
    Sphere { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },
}

/// Ray hit reported by [`RapierQueryWorld::cast_ray`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

pub struct RapierQueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
}

impl RapierQueryWorld {
    /// Build the world. Input order does not matter; colliders are inserted sorted by `id`.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for def in defs.iter() {
            let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
            let rb_handle = bodies.insert(RigidBodyBuilder::fixed().pose(iso).build());
            colliders.insert_with_parent(collider_from_def(def), rb_handle, &mut bodies);
        }

        // Collision detection only: fills the broad-phase BVH so queries can run.
        let mut broad_phase = BroadPhaseBvh::new();
        let mut narrow_phase = NarrowPhase::new();
        let mut collision_pipeline = CollisionPipeline::new();
        collision_pipeline.step(
            0.0,
            &mut broad_phase,
            &mut narrow_phase,
            &mut bodies,
            &mut colliders,
            &(),
            &(),
        );

        log::debug!("built query world with {} colliders", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase,
        }
    }

    /// Borrowed query pipeline for scene queries and the character controller.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Closest hit along `direction` (unit length) within `max_distance`, among colliders
    /// whose layers intersect `mask`.
    pub fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<RayHit> {
        let in_mask = |_: ColliderHandle, collider: &Collider| layers_of(collider) & mask != 0;
        let pipeline = self.query_pipeline(QueryFilter::only_fixed().predicate(&in_mask));

        let ray = Ray::new(Point::from(origin), direction);
        pipeline
            .cast_ray_and_get_normal(&ray, max_distance.max(0.0), true)
            .map(|(_handle, hit)| RayHit {
                distance: hit.time_of_impact,
                point: ray.point_at(hit.time_of_impact).coords,
                normal: hit.normal,
            })
    }

    /// Number of colliders in `mask` intersecting `shape` placed at `pose`.
    pub fn count_overlaps(&self, pose: &Isometry<f32>, shape: &dyn Shape, mask: u32) -> usize {
        self.colliders
            .iter()
            .filter(|(_, collider)| layers_of(collider) & mask != 0)
            .filter(|(_, collider)| {
                parry_query::intersection_test(pose, shape, collider.position(), collider.shape())
                    .unwrap_or(false)
            })
            .count()
    }

    /// Brute-force variant of [`Self::cast_ray`] over every collider. Used to cross-check
    /// the pipeline in tests.
    #[cfg(test)]
    fn cast_ray_brute_force(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        use rapier3d::parry::query::RayCast;

        let ray = Ray::new(Point::from(origin), direction);
        self.colliders
            .iter()
            .filter_map(|(_, c)| {
                c.shape()
                    .cast_ray_and_get_normal(c.position(), &ray, max_distance, true)
                    .map(|hit| hit.time_of_impact)
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}

fn layers_of(collider: &Collider) -> u32 {
    (collider.user_data & u128::from(u32::MAX)) as u32
}

// The parent rigid body carries the pose, so shapes are built in local space.
fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => ColliderBuilder::halfspace(Vector::y_axis())
            .translation(Vector::y() * *offset_along_normal),
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
    };
    builder.user_data(u128::from(def.layers)).build()
}
