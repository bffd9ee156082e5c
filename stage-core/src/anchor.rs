//! Anchor, stretch and alignment flags.

bitflags::bitflags! {
    /// Edges and axis centres of a parent rectangle.
    ///
    /// Used three ways: as anchors (which edge a position is measured from),
    /// as stretch (LEFT & RIGHT or TOP & BOTTOM fill the parent on that axis)
    /// and as text alignment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnchorFlags: u32 {
        /// Left edge.
        const LEFT = 0x1;
        /// Right edge.
        const RIGHT = 0x2;
        /// Top edge.
        const TOP = 0x4;
        /// Bottom edge.
        const BOTTOM = 0x8;
        /// Horizontal centre.
        const CENTER_X = 0x10;
        /// Vertical centre.
        const CENTER_Y = 0x20;
    }
}

const HORIZONTAL_EDGES: AnchorFlags = AnchorFlags::LEFT.union(AnchorFlags::RIGHT);
const VERTICAL_EDGES: AnchorFlags = AnchorFlags::TOP.union(AnchorFlags::BOTTOM);

impl AnchorFlags {
    /// Default anchoring: top-left.
    pub const TOP_LEFT: Self = Self::LEFT.union(Self::TOP);

    /// Build from a serialized integer, dropping unknown bits.
    #[must_use]
    pub fn from_bits_lossy(bits: i64) -> Self {
        u32::try_from(bits).map_or(Self::empty(), Self::from_bits_truncate)
    }

    /// Remove conflicting bits; a centre flag wins over its axis edges.
    ///
    /// Idempotent: `v.sanitize().sanitize() == v.sanitize()`.
    #[must_use]
    pub fn sanitize(self) -> Self {
        let mut out = self;
        if out.contains(Self::CENTER_X) {
            out.remove(HORIZONTAL_EDGES);
        }
        if out.contains(Self::CENTER_Y) {
            out.remove(VERTICAL_EDGES);
        }
        out
    }

    /// Sanitize a value that replaces `previous`.
    ///
    /// When both a centre flag and an edge of the same axis are requested,
    /// whichever side was newly set relative to `previous` wins. If neither
    /// or both were newly set, [`sanitize`](Self::sanitize) decides.
    #[must_use]
    pub fn sanitize_against(self, previous: Self) -> Self {
        let added = self.difference(previous);
        let mut out = self;
        Self::resolve_axis(&mut out, added, Self::CENTER_X, HORIZONTAL_EDGES);
        Self::resolve_axis(&mut out, added, Self::CENTER_Y, VERTICAL_EDGES);
        out.sanitize()
    }

    fn resolve_axis(out: &mut Self, added: Self, center: Self, edges: Self) {
        if !(out.contains(center) && out.intersects(edges)) {
            return;
        }
        let center_new = added.contains(center);
        let edge_new = added.intersects(edges);
        if edge_new && !center_new {
            out.remove(center);
        } else if center_new && !edge_new {
            out.remove(edges);
        }
    }

    /// Whether these stretch flags fill the parent horizontally.
    #[must_use]
    pub fn stretches_horizontally(self) -> bool {
        self.contains(HORIZONTAL_EDGES)
    }

    /// Whether these stretch flags fill the parent vertically.
    #[must_use]
    pub fn stretches_vertically(self) -> bool {
        self.contains(VERTICAL_EDGES)
    }

    /// Serialized integer form.
    #[must_use]
    pub fn to_json_bits(self) -> i64 {
        i64::from(self.bits())
    }
}
