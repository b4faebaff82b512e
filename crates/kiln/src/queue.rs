//! Id-keyed object queue shared by [`Renderer`](crate::renderer::Renderer)
//! and [`BatchRenderer`](crate::batch::BatchRenderer).
//!
//! Iteration order is id order. Adding an object whose id is already queued
//! replaces the earlier entry.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::id::ObjectId;
use crate::object::SharedObject;

#[derive(Default)]
pub struct ObjectQueue {
    objects: BTreeMap<ObjectId, SharedObject>,
}

impl ObjectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id. Returns the replaced object, if any.
    pub fn add(&mut self, object: SharedObject) -> Option<SharedObject> {
        let id = object.borrow().id();
        self.objects.insert(id, object)
    }

    /// Remove whatever is queued under `object`'s id.
    pub fn remove(&mut self, object: &SharedObject) -> Option<SharedObject> {
        let id = object.borrow().id();
        self.remove_by_id(id)
    }

    pub fn remove_by_id(&mut self, id: ObjectId) -> Option<SharedObject> {
        self.objects.remove(&id)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SharedObject> {
        self.objects.get(&id)
    }

    /// Objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedObject> {
        self.objects.values()
    }

    /// Step every queued object by `dt` seconds.
    pub fn update(&self, dt: f32) {
        for object in self.objects.values() {
            object.borrow_mut().update(dt);
        }
    }

    /// `true` if any queued object has a stale world matrix or stale text.
    pub fn any_dirty(&self) -> bool {
        self.objects.values().any(|object| {
            let object = object.borrow();
            object.transform().is_dirty() || object.text_state().is_some_and(|t| t.needs_update())
        })
    }

    /// `true` if `object` is the exact instance queued under its id.
    pub fn holds(&self, object: &SharedObject) -> bool {
        let id = object.borrow().id();
        self.objects.get(&id).is_some_and(|queued| Rc::ptr_eq(queued, object))
    }
}

impl std::fmt::Debug for ObjectQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.objects.keys()).finish()
    }
}
