use crate::ast::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SegmentId(pub(crate) usize);

/// A basic block of a code path: predecessors, successors and a
/// reachability flag. Back-edges are appended after creation when a
/// loop closes.
#[derive(Debug)]
pub struct CodePathSegment {
    pub id: String,
    pub prev_segments: Vec<SegmentId>,
    pub next_segments: Vec<SegmentId>,
    pub reachable: bool,
}

/// The control-flow graph of one program or function-like node.
#[derive(Debug)]
pub struct CodePath {
    pub id: String,
    pub origin: NodeId,
    segments: Vec<CodePathSegment>,
    pub initial_segment: SegmentId,
    pub final_segments: Vec<SegmentId>,
    pub returned_segments: Vec<SegmentId>,
    pub thrown_segments: Vec<SegmentId>,
}

impl CodePath {
    pub(crate) fn new(path_number: usize, origin: NodeId) -> Self {
        let mut path = Self {
            id: format!("s{path_number}"),
            origin,
            segments: Default::default(),
            initial_segment: SegmentId(0),
            final_segments: Default::default(),
            returned_segments: Default::default(),
            thrown_segments: Default::default(),
        };
        path.initial_segment = path.add_segment(Vec::new(), true);
        path
    }

    fn add_segment(&mut self, prev_segments: Vec<SegmentId>, reachable: bool) -> SegmentId {
        let id = SegmentId(self.segments.len());
        let segment_id = format!("{}_{}", self.id, self.segments.len());
        for &prev in &prev_segments {
            self.segments[prev.0].next_segments.push(id);
        }
        self.segments.push(CodePathSegment {
            id: segment_id,
            prev_segments,
            next_segments: Default::default(),
            reachable,
        });
        id
    }

    /// A new segment reachable iff any predecessor is.
    pub(crate) fn new_segment(&mut self, prev_segments: Vec<SegmentId>) -> SegmentId {
        let reachable = prev_segments
            .iter()
            .any(|&prev| self.segments[prev.0].reachable);
        self.add_segment(prev_segments, reachable)
    }

    /// A new segment forced unreachable, used after `return`, `throw`,
    /// `break` and `continue`.
    pub(crate) fn new_unreachable_segment(&mut self, prev_segments: Vec<SegmentId>) -> SegmentId {
        self.add_segment(prev_segments, false)
    }

    /// A segment whose predecessors arrive later (`for` update
    /// clauses, which run after the body they precede in source).
    pub(crate) fn new_disconnected_segment(&mut self, reachable: bool) -> SegmentId {
        self.add_segment(Vec::new(), reachable)
    }

    /// Appends an edge after both endpoints exist (loop back-edges,
    /// fallthrough into pre-created segments).
    pub(crate) fn link(&mut self, from: SegmentId, to: SegmentId) {
        if !self.segments[to.0].prev_segments.contains(&from) {
            self.segments[to.0].prev_segments.push(from);
            self.segments[from.0].next_segments.push(to);
        }
    }

    pub fn segment(&self, id: SegmentId) -> &CodePathSegment {
        &self.segments[id.0]
    }

    pub fn segments(&self) -> impl Iterator<Item = &CodePathSegment> {
        self.segments.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
