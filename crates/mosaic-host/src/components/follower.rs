use std::any::Any;

use mosaic_core::{Component, CoreResult, Entity, EntityId, Node, Property, Updatable, Vector3};

use super::{attribute, entity_property};

/// Eases `Position` toward `Target` every update, covering `FollowRate`
/// of the remaining distance per second. `ToggleFollow` pauses and
/// resumes it.
pub struct Follower {
    name: String,
    owner: EntityId,
    position: Property<Vector3>,
    target: Property<Vector3>,
    rate: Property<f32>,
    following: Property<bool>,
}

impl Follower {
    /// Factory name.
    pub const TYPE_NAME: &'static str = "Follower";

    /// Bind to `entity`'s properties and add `ToggleFollow`.
    pub fn new(entity: &mut Entity, name: &str) -> Self {
        let following = entity_property(entity, "Following", true);
        let toggle = following.clone();
        entity.add_event("ToggleFollow", move |_: &dyn Any| toggle.update(|f| !f));

        Self {
            name: name.to_string(),
            owner: entity.id(),
            position: entity_property(entity, "Position", Vector3::ZERO),
            target: entity_property(entity, "Target", Vector3::ZERO),
            rate: entity_property(entity, "FollowRate", 1.0_f32),
            following,
        }
    }

    /// Whether following is switched on.
    pub fn is_following(&self) -> bool {
        self.following.get()
    }
}

impl Updatable for Follower {
    fn update(&mut self, elapsed: f32) {
        if !self.following.get() {
            return;
        }
        let step = (self.rate.get() * elapsed).clamp(0.0, 1.0);
        let target = self.target.get();
        self.position.update(|p| *p + (target - *p) * step);
    }
}

impl Component for Follower {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> EntityId {
        self.owner
    }

    fn parse(&mut self, node: &Node, _entity: &mut Entity) -> CoreResult<()> {
        if let Some(active) = attribute::<bool>(&self.name, node, "active")? {
            self.following.set(active);
        }
        if let Some(rate) = attribute::<f32>(&self.name, node, "rate")? {
            self.rate.set(rate);
        }
        Ok(())
    }

    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use mosaic_core::PropertyContainer;

    use super::*;

    #[test]
    fn moves_toward_target() {
        let mut entity = Entity::new("Dog");
        let mut follower = Follower::new(&mut entity, "Follower");
        let node = Node::new("component").with_attr("rate", "0.5");
        follower.parse(&node, &mut entity).unwrap();
        entity
            .get_property::<Vector3>("Target")
            .unwrap()
            .set(Vector3::new(8.0, 0.0, 0.0));

        follower.update(1.0);
        let position = entity.get_property::<Vector3>("Position").unwrap();
        assert_eq!(position.get(), Vector3::new(4.0, 0.0, 0.0));
        follower.update(1.0);
        assert_eq!(position.get(), Vector3::new(6.0, 0.0, 0.0));
        // Large steps never overshoot.
        follower.update(100.0);
        assert_eq!(position.get(), Vector3::new(8.0, 0.0, 0.0));
    }

    #[test]
    fn toggle_pauses_following() {
        let mut entity = Entity::new("Dog");
        let mut follower = Follower::new(&mut entity, "Follower");
        entity.get_property::<Vector3>("Target").unwrap().set(Vector3::new(1.0, 1.0, 1.0));

        entity.invoke_event("ToggleFollow", &());
        assert!(!follower.is_following());
        follower.update(1.0);
        assert_eq!(entity.get_property::<Vector3>("Position").unwrap().get(), Vector3::ZERO);

        entity.invoke_event("ToggleFollow", &());
        follower.update(1.0);
        assert_eq!(
            entity.get_property::<Vector3>("Position").unwrap().get(),
            Vector3::new(1.0, 1.0, 1.0)
        );
    }

    #[test]
    fn inactive_attribute() {
        let mut entity = Entity::new("Dog");
        let mut follower = Follower::new(&mut entity, "Follower");
        follower
            .parse(&Node::new("component").with_attr("active", "false"), &mut entity)
            .unwrap();
        assert!(!follower.is_following());
    }
}
