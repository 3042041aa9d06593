// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render-pass scoped resource ownership.

use std::cell::RefCell;
use std::rc::Rc;

use crate::pattern::Tile;
use crate::picture::Picture;

/// Pattern synthesis re-enters the pipeline for tile content,
/// and malformed documents can chain such re-entries indefinitely.
const MAX_NESTING: usize = 8;

/// A render-pass resource scope.
///
/// Every pattern tile and recorded picture produced during paint
/// resolution is registered here and released when the scope is dropped.
/// One scope must not be shared across concurrent render passes.
///
/// Scopes nest: a tile's own content renders into a child scope obtained
/// via [`RenderScope::nested`], so inner resources are released no later
/// than the scope that produced them.
#[derive(Default, Debug)]
pub struct RenderScope {
    depth: usize,
    tiles: RefCell<Vec<Rc<Tile>>>,
    pictures: RefCell<Vec<Rc<Picture>>>,
}

impl RenderScope {
    /// Creates a root scope for a render pass.
    pub fn new() -> Self {
        RenderScope::default()
    }

    /// Creates a child scope for nested content rendering.
    ///
    /// Returns `None` past the nesting cap, so pathologically recursive
    /// documents fail into do-not-draw instead of overflowing the stack.
    pub fn nested(&self) -> Option<RenderScope> {
        if self.depth >= MAX_NESTING {
            log::warn!("Pattern nesting is too deep.");
            return None;
        }

        Some(RenderScope {
            depth: self.depth + 1,
            ..RenderScope::default()
        })
    }

    /// Takes ownership of a pattern tile for the rest of the render pass.
    pub fn register_tile(&self, tile: Tile) -> Rc<Tile> {
        let tile = Rc::new(tile);
        self.tiles.borrow_mut().push(tile.clone());
        tile
    }

    /// Takes ownership of a recorded picture for the rest of the render pass.
    pub fn register_picture(&self, picture: Picture) -> Rc<Picture> {
        let picture = Rc::new(picture);
        self.pictures.borrow_mut().push(picture.clone());
        picture
    }

    /// Amount of resources currently owned by this scope.
    pub fn resource_count(&self) -> usize {
        self.tiles.borrow().len() + self.pictures.borrow().len()
    }
}
