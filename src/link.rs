//! Intrusive doubly-linked lists over an arena of nodes.
//!
//! Every node carries its own [`Links`] (prev/next indices).  A list has no
//! owner and no header: it is simply the set of nodes reachable through those
//! links, and any member can be used to reach the head or tail.  A node is a
//! member of at most one list at a time; a detached node is a list of one.
//!
//! The list operations are provided methods of [`LinkArena`], so any arena
//! that can hand out `&Links` for a [`NodeId`] gets them for free.  Links live
//! in `Cell`s, which lets the port layer rewire topics through `&self` while a
//! broadcast is in flight.

use core::cell::Cell;

/// Stable index of a node inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u16);

impl NodeId {
    /// Convert an arena index, if it fits the id width.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index <= u16::MAX as usize {
            Some(Self(index as u16))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Prev/next back-references of one node.
#[derive(Debug, Default)]
pub struct Links {
    prev: Cell<Option<NodeId>>,
    next: Cell<Option<NodeId>>,
}

impl Links {
    pub const fn new() -> Self {
        Self {
            prev: Cell::new(None),
            next: Cell::new(None),
        }
    }
}

/// List mechanics over an arena of [`Links`].
pub trait LinkArena {
    /// Links of node `id`.  Out-of-range ids are a contract violation.
    fn links(&self, id: NodeId) -> &Links;

    /// Whether `id` shares a list with at least one other node.
    fn is_linked(&self, id: NodeId) -> bool {
        let links = self.links(id);
        links.prev.get().is_some() || links.next.get().is_some()
    }

    fn next(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).next.get()
    }

    fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).prev.get()
    }

    /// First node of the list containing `id`.
    fn head(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(prev) = self.prev(node) {
            node = prev;
        }
        node
    }

    /// Last node of the list containing `id`.
    fn tail(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(next) = self.next(node) {
            node = next;
        }
        node
    }

    /// Append the whole list containing `that` after the tail of the list
    /// containing `this`.
    ///
    /// No-op if `that` is absent, is `this`, or already shares its list.
    fn merge(&self, this: NodeId, that: Option<NodeId>) {
        let Some(that) = that else { return };
        if that == this {
            return;
        }
        let that_head = self.head(that);
        if self.head(this) == that_head {
            return;
        }
        let this_tail = self.tail(this);
        self.links(this_tail).next.set(Some(that_head));
        self.links(that_head).prev.set(Some(this_tail));
    }

    /// Detach `id` from its list, closing the gap.  No-op when detached.
    fn unlink(&self, id: NodeId) {
        let links = self.links(id);
        let prev = links.prev.replace(None);
        let next = links.next.replace(None);
        if let Some(prev) = prev {
            self.links(prev).next.set(next);
        }
        if let Some(next) = next {
            self.links(next).prev.set(prev);
        }
    }

    /// Stable-partition the list containing `member` into `K` buckets by
    /// `key`, then relink the buckets in ascending key order.
    ///
    /// Order inside each bucket is preserved.
    ///
    /// # Panics
    ///
    /// Panics if `key` returns a bucket index `>= K`.
    fn clusterize<const K: usize>(&self, member: NodeId, key: impl Fn(NodeId) -> usize) {
        let mut clusters: [Option<(NodeId, NodeId)>; K] = [None; K];

        let mut cursor = Some(self.head(member));
        while let Some(id) = cursor {
            cursor = self.next(id);
            self.unlink(id);

            let bucket = key(id);
            assert!(bucket < K, "cluster key {bucket} out of range for {K} clusters");
            clusters[bucket] = Some(match clusters[bucket] {
                None => (id, id),
                Some((first, last)) => {
                    self.links(last).next.set(Some(id));
                    self.links(id).prev.set(Some(last));
                    (first, id)
                }
            });
        }

        let mut tail: Option<NodeId> = None;
        for (first, last) in clusters.into_iter().flatten() {
            if let Some(tail) = tail {
                self.links(tail).next.set(Some(first));
                self.links(first).prev.set(Some(tail));
            }
            tail = Some(last);
        }
    }

    /// Walk forward from `from`, inclusive.
    fn walk(&self, from: NodeId) -> Walk<'_, Self> {
        Walk {
            arena: self,
            cursor: Some(from),
        }
    }
}

impl LinkArena for [Links] {
    fn links(&self, id: NodeId) -> &Links {
        &self[id.index()]
    }
}

/// Forward iterator over a list; see [`LinkArena::walk`].
pub struct Walk<'w, A: LinkArena + ?Sized> {
    arena: &'w A,
    cursor: Option<NodeId>,
}

impl<A: LinkArena + ?Sized> Iterator for Walk<'_, A> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cursor?;
        self.cursor = self.arena.next(id);
        Some(id)
    }
}
