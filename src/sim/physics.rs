//! Physics engine capability
//!
//! The simulation cores never own rigid-body state. They hold opaque handles
//! and talk to whatever engine is plugged in through [`PhysicsWorld`].
//!
//! [`HeadlessWorld`] is a small in-process backend for the native demo and
//! tests: gravity, damping, impulses, kinematic targets, spherical joints
//! (solved as a rigid distance), a ground plane, and contact-enter events for
//! ball colliders. Bodies are not pushed apart by contacts.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::GRAVITY;
use crate::error::PhysicsError;

/// Opaque rigid-body handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Opaque joint handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointHandle(pub u32);

/// How the engine moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves
    Fixed,
    /// Integrated by the engine
    Dynamic,
    /// Moved by the caller through `set_next_kinematic_translation`
    KinematicPosition,
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

impl ColliderShape {
    /// Vertical distance from body centre to the bottom of the shape
    fn half_height(&self) -> f32 {
        match *self {
            ColliderShape::Ball { radius } => radius,
            ColliderShape::Cuboid { half_extents } => half_extents.y,
        }
    }
}

/// Everything needed to create a rigid body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub collider: Option<ColliderShape>,
    /// Dynamic body starts asleep and stays put until an impulse wakes it
    pub sleeping: bool,
}

impl BodyDesc {
    pub fn new(kind: BodyKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            mass: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            restitution: 0.0,
            friction: 0.5,
            collider: None,
            sleeping: false,
        }
    }

    pub fn dynamic(position: Vec3) -> Self {
        Self::new(BodyKind::Dynamic, position)
    }

    pub fn kinematic(position: Vec3) -> Self {
        Self::new(BodyKind::KinematicPosition, position)
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_material(mut self, restitution: f32, friction: f32) -> Self {
        self.restitution = restitution;
        self.friction = friction;
        self
    }

    pub fn with_collider(mut self, collider: ColliderShape) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn asleep(mut self) -> Self {
        self.sleeping = true;
        self
    }
}

/// Contact reported by the engine during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Body receiving the callback
    pub body: BodyHandle,
    /// Other participant (`None` for the ground plane)
    pub other: Option<BodyHandle>,
    /// Total contact force magnitude
    pub total_force_magnitude: f32,
}

/// Rigid-body engine as seen by the simulation cores
pub trait PhysicsWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError>;

    /// Remove a body and any joints attached to it (unknown handles are ignored)
    fn remove_body(&mut self, body: BodyHandle);

    /// Join two bodies at local anchor offsets
    fn create_spherical_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
    ) -> Result<JointHandle, PhysicsError>;

    fn translation(&self, body: BodyHandle) -> Option<Vec3>;

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    /// Target position for a kinematic body, reached on the next step
    fn set_next_kinematic_translation(&mut self, body: BodyHandle, position: Vec3);

    /// Instantaneous momentum change (wakes sleeping bodies)
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3);

    /// Advance by `dt`, appending contact events raised during the step
    fn step(&mut self, dt: f32, events: &mut Vec<CollisionEvent>);
}

/// Default body budget for [`HeadlessWorld`]
pub const DEFAULT_BODY_CAPACITY: usize = 4096;

/// Contact key used for the ground plane
const GROUND: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Body {
    handle: BodyHandle,
    desc: BodyDesc,
    pos: Vec3,
    vel: Vec3,
    kinematic_target: Option<Vec3>,
    sleeping: bool,
}

impl Body {
    fn inv_mass(&self) -> f32 {
        if self.desc.kind == BodyKind::Dynamic && !self.sleeping && self.desc.mass > 0.0 {
            1.0 / self.desc.mass
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
struct Joint {
    handle: JointHandle,
    a: BodyHandle,
    b: BodyHandle,
    rest_length: f32,
}

/// Minimal in-process physics backend
#[derive(Debug, Clone)]
pub struct HeadlessWorld {
    /// Bodies sorted by handle
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    /// Active contact pairs, for enter-only events
    contacts: HashSet<(u32, u32)>,
    /// Scripted events delivered on the next step
    queued: Vec<CollisionEvent>,
    gravity: Vec3,
    capacity: usize,
    next_body: u32,
    next_joint: u32,
}

impl Default for HeadlessWorld {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BODY_CAPACITY)
    }
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bodies: Vec::new(),
            joints: Vec::new(),
            contacts: HashSet::new(),
            queued: Vec::new(),
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
            capacity,
            next_body: 1,
            next_joint: 1,
        }
    }

    /// Deliver a scripted collision on the next `step`
    pub fn queue_collision(&mut self, event: CollisionEvent) {
        self.queued.push(event);
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.index_of(body).is_some()
    }

    pub fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.get(body).is_some_and(|b| b.sleeping)
    }

    fn index_of(&self, body: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&body, |b| b.handle).ok()
    }

    fn get(&self, body: BodyHandle) -> Option<&Body> {
        self.index_of(body).map(|i| &self.bodies[i])
    }

    fn get_mut(&mut self, body: BodyHandle) -> Option<&mut Body> {
        self.index_of(body).map(|i| &mut self.bodies[i])
    }

    fn integrate(&mut self, dt: f32) {
        for body in &mut self.bodies {
            match body.desc.kind {
                BodyKind::Fixed => {}
                BodyKind::KinematicPosition => {
                    if let Some(target) = body.kinematic_target.take() {
                        body.vel = (target - body.pos) / dt;
                        body.pos = target;
                    } else {
                        body.vel = Vec3::ZERO;
                    }
                }
                BodyKind::Dynamic => {
                    if body.sleeping {
                        continue;
                    }
                    body.vel += self.gravity * dt;
                    body.vel *= 1.0 / (1.0 + dt * body.desc.linear_damping);
                    body.pos += body.vel * dt;
                }
            }
        }
    }

    fn solve_joints(&mut self, dt: f32) {
        for i in 0..self.joints.len() {
            let (a, b, rest) = {
                let j = &self.joints[i];
                (j.a, j.b, j.rest_length)
            };
            let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
                continue;
            };
            let wa = self.bodies[ia].inv_mass();
            let wb = self.bodies[ib].inv_mass();
            let w = wa + wb;
            if w <= 0.0 {
                continue;
            }

            let delta = self.bodies[ib].pos - self.bodies[ia].pos;
            let len = delta.length();
            if len < 1e-6 {
                continue;
            }
            let n = delta / len;
            let c = len - rest;

            let corr_a = n * c * (wa / w);
            let corr_b = -n * c * (wb / w);
            self.bodies[ia].pos += corr_a;
            self.bodies[ia].vel += corr_a / dt;
            self.bodies[ib].pos += corr_b;
            self.bodies[ib].vel += corr_b / dt;
        }
    }

    fn detect_contacts(&mut self, dt: f32, events: &mut Vec<CollisionEvent>) {
        let mut touching: HashSet<(u32, u32)> = HashSet::new();

        // Ground plane
        for body in &mut self.bodies {
            if body.desc.kind != BodyKind::Dynamic || body.sleeping {
                continue;
            }
            let Some(shape) = body.desc.collider else {
                continue;
            };
            let bottom = body.pos.y - shape.half_height();
            if bottom > 0.0 {
                continue;
            }
            let key = (body.handle.0, GROUND);
            let closing = (-body.vel.y).max(0.0);
            if !self.contacts.contains(&key) && closing > 0.0 {
                events.push(CollisionEvent {
                    body: body.handle,
                    other: None,
                    total_force_magnitude: body.desc.mass * closing / dt,
                });
            }
            touching.insert(key);

            body.pos.y -= bottom;
            if body.vel.y < 0.0 {
                body.vel.y = -body.vel.y * body.desc.restitution;
            }
            let keep = (1.0 - body.desc.friction * dt).max(0.0);
            body.vel.x *= keep;
            body.vel.z *= keep;
        }

        // Ball against everything with a collider
        for i in 0..self.bodies.len() {
            let Some(ColliderShape::Ball { radius }) = self.bodies[i].desc.collider else {
                continue;
            };
            for j in 0..self.bodies.len() {
                if i == j {
                    continue;
                }
                let (ball, other) = (&self.bodies[i], &self.bodies[j]);
                let Some(shape) = other.desc.collider else {
                    continue;
                };
                let overlapping = match shape {
                    ColliderShape::Ball { radius: r } => {
                        // Ball pairs are visited twice; keep one
                        if j < i {
                            continue;
                        }
                        ball.pos.distance(other.pos) < radius + r
                    }
                    ColliderShape::Cuboid { half_extents } => {
                        let closest = ball
                            .pos
                            .clamp(other.pos - half_extents, other.pos + half_extents);
                        ball.pos.distance(closest) < radius
                    }
                };
                if !overlapping {
                    continue;
                }

                let key = (ball.handle.0.min(other.handle.0), ball.handle.0.max(other.handle.0));
                if !self.contacts.contains(&key) {
                    let closing = (ball.vel - other.vel).length();
                    let mass = if ball.desc.kind == BodyKind::Dynamic {
                        ball.desc.mass
                    } else {
                        other.desc.mass
                    };
                    let force = mass * closing / dt;
                    events.push(CollisionEvent {
                        body: ball.handle,
                        other: Some(other.handle),
                        total_force_magnitude: force,
                    });
                    events.push(CollisionEvent {
                        body: other.handle,
                        other: Some(ball.handle),
                        total_force_magnitude: force,
                    });
                }
                touching.insert(key);
            }
        }

        self.contacts = touching;
    }
}

impl PhysicsWorld for HeadlessWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, PhysicsError> {
        if self.bodies.len() >= self.capacity {
            return Err(PhysicsError::CapacityExhausted {
                limit: self.capacity,
            });
        }
        let handle = BodyHandle(self.next_body);
        self.next_body += 1;
        self.bodies.push(Body {
            handle,
            desc: desc.clone(),
            pos: desc.position,
            vel: Vec3::ZERO,
            kinematic_target: None,
            sleeping: desc.sleeping && desc.kind == BodyKind::Dynamic,
        });
        Ok(handle)
    }

    fn remove_body(&mut self, body: BodyHandle) {
        if let Some(i) = self.index_of(body) {
            self.bodies.remove(i);
            self.joints.retain(|j| j.a != body && j.b != body);
            self.contacts
                .retain(|&(a, b)| a != body.0 && b != body.0);
        }
    }

    fn create_spherical_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
    ) -> Result<JointHandle, PhysicsError> {
        if !self.contains(a) {
            return Err(PhysicsError::UnknownBody(a));
        }
        if !self.contains(b) {
            return Err(PhysicsError::UnknownBody(b));
        }
        let handle = JointHandle(self.next_joint);
        self.next_joint += 1;
        self.joints.push(Joint {
            handle,
            a,
            b,
            rest_length: (local_anchor_b - local_anchor_a).length(),
        });
        log::debug!(
            "Joint {:?} between {:?} and {:?}",
            self.joints[self.joints.len() - 1].handle,
            a,
            b
        );
        Ok(handle)
    }

    fn translation(&self, body: BodyHandle) -> Option<Vec3> {
        self.get(body).map(|b| b.pos)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.get(body).map(|b| b.vel)
    }

    fn set_next_kinematic_translation(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(b) = self.get_mut(body) {
            if b.desc.kind == BodyKind::KinematicPosition {
                b.kinematic_target = Some(position);
            }
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3) {
        if let Some(b) = self.get_mut(body) {
            if b.desc.kind == BodyKind::Dynamic && b.desc.mass > 0.0 {
                b.sleeping = false;
                b.vel += impulse / b.desc.mass;
            }
        }
    }

    fn step(&mut self, dt: f32, events: &mut Vec<CollisionEvent>) {
        events.append(&mut self.queued);
        if dt <= 0.0 {
            return;
        }
        self.integrate(dt);
        self.solve_joints(dt);
        self.detect_contacts(dt, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_capacity_exhausted() {
        let mut world = HeadlessWorld::with_capacity(1);
        assert!(world.create_body(&BodyDesc::dynamic(Vec3::ZERO)).is_ok());
        let err = world.create_body(&BodyDesc::dynamic(Vec3::ZERO)).unwrap_err();
        assert_eq!(err, PhysicsError::CapacityExhausted { limit: 1 });
    }

    #[test]
    fn test_joint_requires_known_bodies() {
        let mut world = HeadlessWorld::new();
        let a = world.create_body(&BodyDesc::kinematic(Vec3::ZERO)).unwrap();
        let err = world
            .create_spherical_joint(a, BodyHandle(99), Vec3::ZERO, Vec3::Y)
            .unwrap_err();
        assert_eq!(err, PhysicsError::UnknownBody(BodyHandle(99)));
    }

    #[test]
    fn test_kinematic_target_reached_next_step() {
        let mut world = HeadlessWorld::new();
        let a = world.create_body(&BodyDesc::kinematic(Vec3::ZERO)).unwrap();
        world.set_next_kinematic_translation(a, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(world.translation(a), Some(Vec3::ZERO));

        world.step(DT, &mut Vec::new());
        assert_eq!(world.translation(a), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_joint_keeps_pendulum_length() {
        let mut world = HeadlessWorld::new();
        let anchor = world
            .create_body(&BodyDesc::kinematic(Vec3::new(0.0, 18.0, 0.0)))
            .unwrap();
        let ball = world
            .create_body(&BodyDesc::dynamic(Vec3::new(0.0, 10.0, 0.0)).with_mass(200.0))
            .unwrap();
        world
            .create_spherical_joint(anchor, ball, Vec3::ZERO, Vec3::new(0.0, 8.0, 0.0))
            .unwrap();

        for i in 0..120 {
            let x = (i as f32) * 0.05;
            world.set_next_kinematic_translation(anchor, Vec3::new(x, 18.0, 0.0));
            world.step(DT, &mut Vec::new());
            let d = world
                .translation(anchor)
                .unwrap()
                .distance(world.translation(ball).unwrap());
            assert!((d - 8.0).abs() < 1e-3, "length drifted to {d}");
        }
    }

    #[test]
    fn test_sleeping_body_wakes_on_impulse() {
        let mut world = HeadlessWorld::new();
        let b = world
            .create_body(&BodyDesc::dynamic(Vec3::new(0.0, 5.0, 0.0)).asleep())
            .unwrap();
        world.step(DT, &mut Vec::new());
        assert_eq!(world.translation(b), Some(Vec3::new(0.0, 5.0, 0.0)));

        world.apply_impulse(b, Vec3::new(0.0, 1.0, 0.0));
        assert!(!world.is_sleeping(b));
        world.step(DT, &mut Vec::new());
        assert_ne!(world.translation(b), Some(Vec3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn test_ball_cuboid_contact_enter_only_once() {
        let mut world = HeadlessWorld::new();
        let brick = world
            .create_body(
                &BodyDesc::dynamic(Vec3::new(0.0, 5.0, 0.0))
                    .with_mass(10.0)
                    .with_collider(ColliderShape::Cuboid {
                        half_extents: Vec3::new(1.0, 0.5, 0.5),
                    })
                    .asleep(),
            )
            .unwrap();
        let ball = world
            .create_body(
                &BodyDesc::kinematic(Vec3::new(-3.0, 5.0, 0.0))
                    .with_mass(200.0)
                    .with_collider(ColliderShape::Ball { radius: 1.5 }),
            )
            .unwrap();

        let mut events = Vec::new();
        world.set_next_kinematic_translation(ball, Vec3::new(-2.0, 5.0, 0.0));
        world.step(DT, &mut events);
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.body == brick && e.other == Some(ball)));
        assert!(events[0].total_force_magnitude > 1000.0);

        // Still overlapping: no new enter event
        events.clear();
        world.set_next_kinematic_translation(ball, Vec3::new(-1.9, 5.0, 0.0));
        world.step(DT, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_ground_contact_and_queued_events() {
        let mut world = HeadlessWorld::new();
        let b = world
            .create_body(
                &BodyDesc::dynamic(Vec3::new(0.0, 0.6, 0.0))
                    .with_collider(ColliderShape::Ball { radius: 0.5 }),
            )
            .unwrap();
        world.queue_collision(CollisionEvent {
            body: b,
            other: None,
            total_force_magnitude: 42.0,
        });

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step(DT, &mut events);
        }
        assert_eq!(events[0].total_force_magnitude, 42.0);
        assert!(events.iter().skip(1).any(|e| e.other.is_none()));
        assert!(world.translation(b).unwrap().y >= 0.5 - 1e-4);
    }

    #[test]
    fn test_remove_body_drops_joints() {
        let mut world = HeadlessWorld::new();
        let a = world.create_body(&BodyDesc::kinematic(Vec3::ZERO)).unwrap();
        let b = world.create_body(&BodyDesc::dynamic(Vec3::NEG_Y)).unwrap();
        world.create_spherical_joint(a, b, Vec3::ZERO, Vec3::Y).unwrap();
        world.remove_body(b);
        assert_eq!(world.joint_count(), 0);
        assert!(!world.contains(b));
        assert_eq!(world.translation(b), None);
    }
}
