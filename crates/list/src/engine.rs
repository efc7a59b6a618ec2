//! The list engine: head ownership, append, and skip-link navigation.

use skiplog_store::BlockStore;
use skiplog_types::codec;
use skiplog_types::error::{
    BadEncodingSnafu, BadStructureSnafu, CancelledSnafu, EmptySnafu, EmptyValueSnafu, NotFoundSnafu,
    StoreSnafu,
};
use skiplog_types::{Cid, Node, Result};
use snafu::{OptionExt, ResultExt, ensure};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::cache::{CacheStats, DEFAULT_CACHE_CAPACITY, NodeCache};

/// An append-only indexed list over a content-addressed block store.
///
/// The engine owns the in-memory head (the latest node and its CID) and a
/// bounded cache of previously visited nodes. `append` constructs the new
/// node's skip links, writes the node to the store, and only then advances
/// the head; `get` navigates the links from the head toward the target
/// index in a logarithmic number of fetches.
///
/// Every operation that touches the store takes a
/// [`CancellationToken`]. Cancellation is observed at each store
/// suspension point; an operation cancelled mid-flight never commits
/// partial state.
#[derive(Debug)]
pub struct List<S> {
    store: S,
    head: Option<(Node, Cid)>,
    cache: NodeCache,
}

impl<S: BlockStore> List<S> {
    /// Creates an empty list over `store`.
    pub fn new(store: S) -> Self {
        Self::with_cache_capacity(store, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates an empty list with an explicit cache capacity.
    ///
    /// Capacity tunes fetch amortization, never correctness.
    pub fn with_cache_capacity(store: S, capacity: usize) -> Self {
        Self { store, head: None, cache: NodeCache::new(capacity) }
    }

    /// Reopens a list from the CID of its head node.
    ///
    /// Fetches and decodes the head through the store and seeds the cache
    /// with it. The CID is the only handle a caller needs to durably
    /// record to reopen a list later.
    pub async fn load(store: S, head_cid: Cid, ctx: &CancellationToken) -> Result<Self> {
        let mut list = Self::new(store);
        let node = list.fetch_node(ctx, &head_cid).await?;
        debug!(index = node.index, %head_cid, "loaded list head");
        list.cache.insert(node.index, node.clone(), head_cid);
        list.head = Some((node, head_cid));
        Ok(list)
    }

    /// Index of the newest entry, or `Empty` for a fresh list.
    pub fn head_index(&self) -> Result<u64> {
        let (node, _) = self.head.as_ref().context(EmptySnafu)?;
        Ok(node.index)
    }

    /// CID of the head node, or `None` for a fresh list.
    ///
    /// Record this to reopen the list with [`List::load`].
    pub fn head_cid(&self) -> Option<Cid> {
        self.head.as_ref().map(|(_, cid)| *cid)
    }

    /// Number of entries in the list.
    pub fn len(&self) -> u64 {
        self.head.as_ref().map_or(0, |(node, _)| node.index + 1)
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The underlying block store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the lookup cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the payload bytes at `index`.
    ///
    /// # Errors
    ///
    /// - `Empty` for a fresh list
    /// - `NotFound` when `index` is beyond the head
    /// - `EmptyValue` when the resolved node carries no payload
    /// - `BadEncoding` / `BadStructure` / `Store` on corrupt or failing
    ///   store contents, `Cancelled` if the token trips mid-walk
    pub async fn get(&self, ctx: &CancellationToken, index: u64) -> Result<Vec<u8>> {
        let (head, head_cid) = self.head.as_ref().context(EmptySnafu)?;
        ensure!(index <= head.index, NotFoundSnafu { index, head: head.index });
        if index == head.index {
            return payload(head);
        }

        let (node, _) = self.lookup(ctx, head, *head_cid, index).await?;
        // the walk lands exactly on the target when the invariants hold
        ensure!(node.index == index, NotFoundSnafu { index, head: head.index });
        payload(&node)
    }

    /// Appends a payload, assigning it the next sequential index.
    ///
    /// The payload must be exactly one CBOR item; it is stored opaquely
    /// and returned verbatim by [`List::get`]. A bare CBOR null is the
    /// wire marker for an absent payload and is rejected up front, like an
    /// empty payload. The node is written to the store before the head
    /// advances, so a failed or cancelled append leaves the list
    /// unchanged.
    pub async fn append(&mut self, ctx: &CancellationToken, value: &[u8]) -> Result<()> {
        let next = self.head.as_ref().map_or(0, |(node, _)| node.index + 1);
        ensure!(
            !value.is_empty() && !codec::is_null_payload(value),
            EmptyValueSnafu { index: next }
        );
        codec::validate_payload(value).context(BadEncodingSnafu)?;

        let links = match self.head.clone() {
            None => Vec::new(),
            Some((prev, prev_cid)) => {
                // one link per power of two dividing the new index; the
                // immediate predecessor's CID is already in hand
                let order = next.trailing_zeros();
                let mut links = Vec::with_capacity(1 + order as usize);
                links.push(prev_cid);
                for k in 1..=order {
                    let target = next - (1u64 << k);
                    let (_, cid) = self.lookup(ctx, &prev, prev_cid, target).await?;
                    links.push(cid);
                }
                links
            }
        };

        let node = Node { index: next, links, value: value.to_vec() };
        let bytes = codec::encode(&node).context(BadEncodingSnafu)?;
        let cid = self.put_block(ctx, &bytes).await?;
        debug!(index = next, links = node.links.len(), %cid, "appended entry");

        self.cache.insert(next, node.clone(), cid);
        self.head = Some((node, cid));
        Ok(())
    }

    /// Walks from `start` down to `index`, returning that node and its CID.
    ///
    /// Precondition: `index <= start.index`. Each step descends the link
    /// whose order is `floor(log2(remaining distance))`, clamped to the
    /// links available. An unclamped hop at least halves the remaining
    /// distance; a clamped hop strictly increases the current node's
    /// trailing zeros, so the walk is `O(log(start - index))` hops, each
    /// served from the cache when possible.
    async fn lookup(
        &self,
        ctx: &CancellationToken,
        start: &Node,
        start_cid: Cid,
        index: u64,
    ) -> Result<(Node, Cid)> {
        if index == start.index {
            return Ok((start.clone(), start_cid));
        }
        if let Some(hit) = self.cache.get(index) {
            return Ok(hit);
        }

        let mut node = start.clone();
        let mut cid = start_cid;
        while node.index > index {
            ensure!(!node.links.is_empty(), BadStructureSnafu { index: node.index });

            let distance = node.index - index;
            // the clamp is defensive; with the invariants held the link
            // orders cover every distance the walk can produce
            let order = distance.ilog2().min(node.links.len() as u32 - 1);
            let target = node.index - (1u64 << order);
            trace!(from = node.index, to = index, order, "descending skip link");

            match self.cache.get(target) {
                Some((hit, hit_cid)) => {
                    node = hit;
                    cid = hit_cid;
                }
                None => {
                    let link = node.links[order as usize];
                    node = self.fetch_node(ctx, &link).await?;
                    cid = link;
                    self.cache.insert(node.index, node.clone(), cid);
                }
            }
        }
        Ok((node, cid))
    }

    /// Fetches and decodes one node, observing cancellation.
    async fn fetch_node(&self, ctx: &CancellationToken, cid: &Cid) -> Result<Node> {
        ensure!(!ctx.is_cancelled(), CancelledSnafu);
        let bytes = tokio::select! {
            biased;
            _ = ctx.cancelled() => return CancelledSnafu.fail(),
            res = self.store.get(cid) => res.context(StoreSnafu)?,
        };
        let node = codec::decode(&bytes).context(BadEncodingSnafu)?;
        trace!(index = node.index, links = node.links.len(), "fetched node");
        Ok(node)
    }

    /// Writes one encoded node, observing cancellation.
    async fn put_block(&self, ctx: &CancellationToken, bytes: &[u8]) -> Result<Cid> {
        ensure!(!ctx.is_cancelled(), CancelledSnafu);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => CancelledSnafu.fail(),
            res = self.store.put(bytes) => res.context(StoreSnafu),
        }
    }
}

/// Extracts a node's payload, rejecting valueless nodes.
fn payload(node: &Node) -> Result<Vec<u8>> {
    ensure!(!node.value.is_empty(), EmptyValueSnafu { index: node.index });
    Ok(node.value.clone())
}
