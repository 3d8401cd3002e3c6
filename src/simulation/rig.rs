//! Character body-part hierarchy
//!
//! A character owns a small tree of parts. Part 0 is the root and carries
//! the primary collision volume; the rest are the ragdoll bones. Changes that
//! apply to a whole subtree walk it with an explicit stack.

use super::types::Layer;

#[derive(Debug, Clone)]
pub struct BodyPart {
    pub name: &'static str,
    pub layer: Layer,
    /// Simulated by physics rather than driven by animation
    pub dynamic: bool,
    pub collider_enabled: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Rig {
    parts: Vec<BodyPart>,
}

pub const ROOT: usize = 0;

impl Rig {
    pub fn new(root_name: &'static str, layer: Layer) -> Self {
        Self {
            parts: vec![BodyPart {
                name: root_name,
                layer,
                dynamic: false,
                collider_enabled: true,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Root plus the usual ragdoll bones. Bones start kinematic with
    /// colliders off so they don't fight the animator.
    pub fn humanoid(layer: Layer) -> Self {
        let mut rig = Rig::new("root", layer);
        let hips = rig.add_part(ROOT, "hips");
        let spine = rig.add_part(hips, "spine");
        rig.add_part(spine, "head");
        for arm in ["upper_arm_l", "upper_arm_r"] {
            let upper = rig.add_part(spine, arm);
            rig.add_part(upper, "forearm");
        }
        for leg in ["thigh_l", "thigh_r"] {
            let thigh = rig.add_part(hips, leg);
            rig.add_part(thigh, "shin");
        }
        for index in rig.descendants(ROOT) {
            rig.parts[index].collider_enabled = false;
        }
        rig
    }

    pub fn add_part(&mut self, parent: usize, name: &'static str) -> usize {
        let index = self.parts.len();
        let layer = self.parts[parent].layer;
        self.parts.push(BodyPart {
            name,
            layer,
            dynamic: false,
            collider_enabled: true,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.parts[parent].children.push(index);
        index
    }

    pub fn root(&self) -> &BodyPart {
        &self.parts[ROOT]
    }

    pub fn root_mut(&mut self) -> &mut BodyPart {
        &mut self.parts[ROOT]
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.parts.get(index).and_then(|part| part.parent)
    }

    /// Every part strictly below `from`, depth first
    pub fn descendants(&self, from: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.parts[from].children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            out.push(index);
            stack.extend(self.parts[index].children.iter().rev().copied());
        }
        out
    }

    /// Reclassify `from` and its whole subtree
    pub fn set_layer_recursive(&mut self, from: usize, layer: Layer) {
        self.parts[from].layer = layer;
        for index in self.descendants(from) {
            self.parts[index].layer = layer;
        }
    }

    pub fn set_colliders_enabled(&mut self, enabled: bool) {
        for part in &mut self.parts {
            part.collider_enabled = enabled;
        }
    }

    /// Hand every bone to physics. The root stays as configured by the caller.
    pub fn activate_ragdoll(&mut self) {
        for index in self.descendants(ROOT) {
            let part = &mut self.parts[index];
            part.dynamic = true;
            part.collider_enabled = true;
        }
    }

    pub fn ragdoll_active(&self) -> bool {
        self.descendants(ROOT)
            .into_iter()
            .all(|index| self.parts[index].dynamic)
    }
}
