//! Uniform-cell spatial hash grid
//!
//! The grid buckets keys by every cell their bounding box overlaps. It never
//! owns the indexed values: geometry is read back through a [`BoundsSource`]
//! (normally the arena that owns the objects), and the per-key bookkeeping
//! lives in a [`SpatialIndexHandle`] table owned by the grid itself.
//!
//! Coordinates outside the declared world rectangle are clamped to the edge
//! cells, both on insertion and on query. The clamp is monotone, so an
//! object that overlaps a query rectangle always shares at least one cell
//! with it, even when both lie outside the grid.

use crate::{Rect, SearchId, WorldContext};
use slotmap::{Key, SlotMap};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

/// Anything with a world-space bounding box
pub trait Bounded {
    fn bounds(&self) -> Rect;
}

impl Bounded for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

/// Looks up the current bounds of an indexed key.
///
/// Returning `None` means the key no longer refers to a live value; searches
/// skip such keys instead of reporting them.
pub trait BoundsSource<K> {
    fn bounds_of(&self, key: K) -> Option<Rect>;
}

impl<K: Key, T: Bounded> BoundsSource<K> for SlotMap<K, T> {
    fn bounds_of(&self, key: K) -> Option<Rect> {
        self.get(key).map(Bounded::bounds)
    }
}

impl<K: Eq + Hash, T: Bounded, S: BuildHasher> BoundsSource<K> for HashMap<K, T, S> {
    fn bounds_of(&self, key: K) -> Option<Rect> {
        self.get(&key).map(Bounded::bounds)
    }
}

/// Collection that search results are written into
pub trait SearchOutput<K> {
    fn push_result(&mut self, key: K);
}

impl<K> SearchOutput<K> for Vec<K> {
    fn push_result(&mut self, key: K) {
        self.push(key);
    }
}

impl<K: Eq + Hash, S: BuildHasher> SearchOutput<K> for HashSet<K, S> {
    fn push_result(&mut self, key: K) {
        self.insert(key);
    }
}

impl<K: Ord> SearchOutput<K> for BTreeSet<K> {
    fn push_result(&mut self, key: K) {
        self.insert(key);
    }
}

/// Inclusive range of cell indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellSpan {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl CellSpan {
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Number of cells covered
    pub fn cell_count(&self) -> usize {
        (self.right - self.left + 1) * (self.bottom - self.top + 1)
    }

    pub fn contains_cell(&self, column: usize, row: usize) -> bool {
        column >= self.left && column <= self.right && row >= self.top && row <= self.bottom
    }
}

/// Bookkeeping the grid keeps for every indexed key.
///
/// A key is indexed exactly when the grid holds a handle for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpatialIndexHandle {
    /// Cells the key was inserted into at the last add/update
    pub span: CellSpan,
    /// Id of the last search call that visited this key
    pub search_stamp: SearchId,
}

/// Spatial hash grid over a fixed world rectangle
#[derive(Debug, Clone)]
pub struct SpatialGrid<K> {
    bounds: Rect,
    cell_width: f32,
    cell_height: f32,
    hcount: usize,
    vcount: usize,
    cells: Vec<Vec<K>>,
    handles: HashMap<K, SpatialIndexHandle>,
    cell_writes: u64,
}

impl<K: Copy + Eq + Hash> SpatialGrid<K> {
    /// Create a grid covering `bounds` with cells of the given size.
    ///
    /// Non-positive sizes produce a grid with no cells: every add is recorded
    /// but lands nowhere, and every search comes back empty.
    pub fn new(bounds: Rect, cell_width: f32, cell_height: f32) -> Self {
        let hcount = cell_count(bounds.width, cell_width);
        let vcount = cell_count(bounds.height, cell_height);
        let (hcount, vcount) = if hcount == 0 || vcount == 0 {
            (0, 0)
        } else {
            (hcount, vcount)
        };
        Self {
            bounds,
            cell_width,
            cell_height,
            hcount,
            vcount,
            cells: (0..hcount * vcount).map(|_| Vec::new()).collect(),
            handles: HashMap::new(),
            cell_writes: 0,
        }
    }

    /// World rectangle the grid was declared over
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn cell_size(&self) -> (f32, f32) {
        (self.cell_width, self.cell_height)
    }

    /// Number of cell columns
    pub fn columns(&self) -> usize {
        self.hcount
    }

    /// Number of cell rows
    pub fn rows(&self) -> usize {
        self.vcount
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_indexed(&self, key: K) -> bool {
        self.handles.contains_key(&key)
    }

    pub fn handle(&self, key: K) -> Option<&SpatialIndexHandle> {
        self.handles.get(&key)
    }

    /// Total number of cell insertions and removals performed so far
    pub fn cell_writes(&self) -> u64 {
        self.cell_writes
    }

    /// Keys currently bucketed in one cell, in insertion order
    pub fn keys_in_cell(&self, column: usize, row: usize) -> &[K] {
        if column >= self.hcount || row >= self.vcount {
            return &[];
        }
        &self.cells[row * self.hcount + column]
    }

    /// Cells a rectangle covers: every edge floored to a cell index, then
    /// clamped into the grid.
    ///
    /// A box ending exactly on a cell boundary also occupies the cell that
    /// boundary starts.
    pub fn span_of(&self, rect: &Rect) -> CellSpan {
        let left = clamp_cell((rect.left() - self.bounds.x) / self.cell_width, self.hcount);
        let top = clamp_cell((rect.top() - self.bounds.y) / self.cell_height, self.vcount);
        let right = clamp_cell((rect.right() - self.bounds.x) / self.cell_width, self.hcount);
        let bottom = clamp_cell((rect.bottom() - self.bounds.y) / self.cell_height, self.vcount);
        CellSpan::new(left, top, right.max(left), bottom.max(top))
    }

    /// Index `key` with the given bounds. Returns false if it was already indexed.
    pub fn add(&mut self, key: K, bounds: Rect) -> bool {
        if self.handles.contains_key(&key) {
            return false;
        }
        let span = self.span_of(&bounds);
        self.insert_into_cells(key, span);
        self.handles.insert(
            key,
            SpatialIndexHandle {
                span,
                search_stamp: 0,
            },
        );
        true
    }

    /// Drop `key` from every cell it occupies. Returns false if it was not indexed.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(handle) = self.handles.remove(&key) else {
            return false;
        };
        self.remove_from_cells(key, handle.span);
        true
    }

    /// Re-bucket `key` after its bounds changed.
    ///
    /// Moves that keep the covered span touch no cells at all. Returns true
    /// only when the key was re-bucketed.
    pub fn update_entity(&mut self, key: K, bounds: Rect) -> bool {
        let span = self.span_of(&bounds);
        let Some(handle) = self.handles.get_mut(&key) else {
            return false;
        };
        if handle.span == span {
            return false;
        }
        let old = handle.span;
        handle.span = span;
        self.remove_from_cells(key, old);
        self.insert_into_cells(key, span);
        true
    }

    /// Collect every key in the cells `rect` covers.
    ///
    /// In accurate mode each candidate's current bounds must intersect `rect`;
    /// otherwise cell membership alone is enough.
    pub fn search<S, O>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        source: &S,
        out: &mut O,
    ) where
        S: BoundsSource<K>,
        O: SearchOutput<K>,
    {
        self.search_filtered(ctx, rect, accurate, source, out, |_| true);
    }

    /// Like [`search`](Self::search), keeping only keys accepted by `predicate`.
    ///
    /// Every key is evaluated at most once per call, however many of the
    /// covered cells it sits in.
    pub fn search_filtered<S, O, P>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        source: &S,
        out: &mut O,
        mut predicate: P,
    ) where
        S: BoundsSource<K>,
        O: SearchOutput<K>,
        P: FnMut(K) -> bool,
    {
        if self.cells.is_empty() {
            return;
        }
        let search_id = ctx.next_search_id();
        let span = self.span_of(&rect);
        for row in span.top..=span.bottom {
            for column in span.left..=span.right {
                for &key in &self.cells[row * self.hcount + column] {
                    let Some(handle) = self.handles.get_mut(&key) else {
                        continue;
                    };
                    if handle.search_stamp == search_id {
                        continue;
                    }
                    handle.search_stamp = search_id;

                    if !predicate(key) {
                        continue;
                    }
                    let Some(bounds) = source.bounds_of(key) else {
                        continue;
                    };
                    if accurate && !bounds.intersects(&rect) {
                        continue;
                    }
                    out.push_result(key);
                }
            }
        }
    }

    /// First key in the covered cells accepted by `predicate`
    pub fn search_first<S, P>(
        &self,
        rect: Rect,
        accurate: bool,
        source: &S,
        mut predicate: P,
    ) -> Option<K>
    where
        S: BoundsSource<K>,
        P: FnMut(K) -> bool,
    {
        if self.cells.is_empty() {
            return None;
        }
        let span = self.span_of(&rect);
        for row in span.top..=span.bottom {
            for column in span.left..=span.right {
                for &key in &self.cells[row * self.hcount + column] {
                    if !predicate(key) {
                        continue;
                    }
                    let Some(bounds) = source.bounds_of(key) else {
                        continue;
                    };
                    if accurate && !bounds.intersects(&rect) {
                        continue;
                    }
                    return Some(key);
                }
            }
        }
        None
    }

    /// First key whose bounds contain the point, looking only at the point's own cell
    pub fn entity_at<S: BoundsSource<K>>(&self, x: f32, y: f32, source: &S) -> Option<K> {
        if self.cells.is_empty() {
            return None;
        }
        let column = clamp_cell((x - self.bounds.x) / self.cell_width, self.hcount);
        let row = clamp_cell((y - self.bounds.y) / self.cell_height, self.vcount);
        self.cells[row * self.hcount + column]
            .iter()
            .copied()
            .find(|&key| {
                source
                    .bounds_of(key)
                    .is_some_and(|bounds| bounds.contains_point(x, y))
            })
    }

    /// Forget every key
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.handles.clear();
    }

    fn insert_into_cells(&mut self, key: K, span: CellSpan) {
        if self.cells.is_empty() {
            return;
        }
        for row in span.top..=span.bottom {
            for column in span.left..=span.right {
                self.cells[row * self.hcount + column].push(key);
                self.cell_writes += 1;
            }
        }
    }

    fn remove_from_cells(&mut self, key: K, span: CellSpan) {
        if self.cells.is_empty() {
            return;
        }
        for row in span.top..=span.bottom {
            for column in span.left..=span.right {
                let cell = &mut self.cells[row * self.hcount + column];
                if let Some(pos) = cell.iter().position(|&k| k == key) {
                    cell.remove(pos);
                    self.cell_writes += 1;
                }
            }
        }
    }
}

fn cell_count(extent: f32, cell: f32) -> usize {
    if extent > 0.0 && cell > 0.0 {
        (extent / cell).ceil() as usize
    } else {
        0
    }
}

/// Floor a fractional cell coordinate and clamp it into `[0, count)`
#[inline]
fn clamp_cell(value: f32, count: usize) -> usize {
    // Also catches NaN.
    if count == 0 || !(value > 0.0) {
        return 0;
    }
    (value.floor() as usize).min(count - 1)
}
