use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Half-open `[start, end)` pair of byte offsets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn collapsed_start(&self) -> SourceRange {
        Self::new(self.start, self.start)
    }

    pub fn collapsed_end(&self) -> SourceRange {
        Self::new(self.end, self.end)
    }
}

impl From<SourceRange> for std::ops::Range<usize> {
    fn from(value: SourceRange) -> Self {
        value.start..value.end
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Boolean,
    Identifier,
    Keyword,
    Null,
    Numeric,
    Punctuator,
    RegularExpression,
    String,
    Template,
    PrivateIdentifier,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub range: SourceRange,
    pub loc: SourceLocation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommentKind {
    Line,
    Block,
    Shebang,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    pub value: String,
    pub range: SourceRange,
    pub loc: SourceLocation,
}

/// Index of a node in its `Ast` arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Clone, Debug)]
pub enum NodeChild {
    Single(NodeId),
    Many(Vec<NodeId>),
}

/// One AST node: an ESTree type name plus positional info, scalar
/// attributes (`kind`, `name`, `operator`, ...) and named child slots.
#[derive(Clone, Debug)]
pub struct NodeData {
    kind: String,
    range: SourceRange,
    loc: SourceLocation,
    attributes: Vec<(String, Value)>,
    children: Vec<(String, NodeChild)>,
}

impl NodeData {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn loc(&self) -> SourceLocation {
        self.loc
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(attribute_name, _)| attribute_name == name)
            .map(|(_, value)| value)
    }

    pub fn string_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_str)
    }

    pub fn child(&self, key: &str) -> Option<NodeId> {
        self.children
            .iter()
            .find_map(|(child_key, child)| match child {
                NodeChild::Single(id) if child_key == key => Some(*id),
                _ => None,
            })
    }

    pub fn child_list(&self, key: &str) -> &[NodeId] {
        self.children
            .iter()
            .find_map(|(child_key, child)| match child {
                NodeChild::Many(ids) if child_key == key => Some(&**ids),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn child_slot(&self, key: &str) -> Option<&NodeChild> {
        self.children
            .iter()
            .find(|(child_key, _)| child_key == key)
            .map(|(_, child)| child)
    }

    /// Child keys in insertion order, for kinds absent from the
    /// visitor-key table.
    pub fn own_child_keys(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(key, _)| &**key)
    }

    pub fn child_entries(&self) -> impl Iterator<Item = (&str, &NodeChild)> {
        self.children.iter().map(|(key, child)| (&**key, child))
    }
}

#[derive(Clone, Debug)]
pub struct Ast {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &str {
        self.node(id).kind()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

/// Incremental arena construction, used by parser adapters.
#[derive(Default)]
pub struct AstBuilder {
    nodes: Vec<NodeData>,
}

impl AstBuilder {
    pub fn add_node(
        &mut self,
        kind: impl Into<String>,
        range: SourceRange,
        loc: SourceLocation,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind: kind.into(),
            range,
            loc,
            attributes: Default::default(),
            children: Default::default(),
        });
        id
    }

    pub fn set_range(&mut self, id: NodeId, range: SourceRange, loc: SourceLocation) {
        let node = &mut self.nodes[id.index()];
        node.range = range;
        node.loc = loc;
    }

    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<Value>) {
        self.nodes[id.index()]
            .attributes
            .push((name.into(), value.into()));
    }

    pub fn set_child(&mut self, id: NodeId, key: impl Into<String>, child: NodeId) {
        self.nodes[id.index()]
            .children
            .push((key.into(), NodeChild::Single(child)));
    }

    pub fn set_child_list(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        children: impl IntoIterator<Item = NodeId>,
    ) {
        self.nodes[id.index()]
            .children
            .push((key.into(), NodeChild::Many(children.into_iter().collect())));
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
        }
    }
}

/// Node type → ordered child keys, controlling traversal order.
#[derive(Clone, Debug, Default)]
pub struct VisitorKeys {
    keys: HashMap<String, Vec<String>>,
}

impl VisitorKeys {
    pub fn new(keys: HashMap<String, Vec<String>>) -> Self {
        Self { keys }
    }

    pub fn keys_for(&self, kind: &str) -> Option<&[String]> {
        self.keys.get(kind).map(|keys| &**keys)
    }

    pub fn insert(&mut self, kind: impl Into<String>, keys: impl IntoIterator<Item = &'static str>) {
        self.keys
            .insert(kind.into(), keys.into_iter().map(str::to_owned).collect());
    }

    /// The stock ESTree table. Parsers may hand back their own to
    /// override or extend it.
    pub fn standard() -> Self {
        let mut keys = Self::default();
        keys.insert("Program", ["body"]);
        keys.insert("ExpressionStatement", ["expression"]);
        keys.insert("BlockStatement", ["body"]);
        keys.insert("EmptyStatement", []);
        keys.insert("DebuggerStatement", []);
        keys.insert("WithStatement", ["object", "body"]);
        keys.insert("ReturnStatement", ["argument"]);
        keys.insert("LabeledStatement", ["label", "body"]);
        keys.insert("BreakStatement", ["label"]);
        keys.insert("ContinueStatement", ["label"]);
        keys.insert("IfStatement", ["test", "consequent", "alternate"]);
        keys.insert("SwitchStatement", ["discriminant", "cases"]);
        keys.insert("SwitchCase", ["test", "consequent"]);
        keys.insert("ThrowStatement", ["argument"]);
        keys.insert("TryStatement", ["block", "handler", "finalizer"]);
        keys.insert("CatchClause", ["param", "body"]);
        keys.insert("WhileStatement", ["test", "body"]);
        keys.insert("DoWhileStatement", ["body", "test"]);
        keys.insert("ForStatement", ["init", "test", "update", "body"]);
        keys.insert("ForInStatement", ["left", "right", "body"]);
        keys.insert("ForOfStatement", ["left", "right", "body"]);
        keys.insert("FunctionDeclaration", ["id", "params", "body"]);
        keys.insert("VariableDeclaration", ["declarations"]);
        keys.insert("VariableDeclarator", ["id", "init"]);
        keys.insert("ThisExpression", []);
        keys.insert("ArrayExpression", ["elements"]);
        keys.insert("ObjectExpression", ["properties"]);
        keys.insert("Property", ["key", "value"]);
        keys.insert("FunctionExpression", ["id", "params", "body"]);
        keys.insert("ArrowFunctionExpression", ["params", "body"]);
        keys.insert("YieldExpression", ["argument"]);
        keys.insert("AwaitExpression", ["argument"]);
        keys.insert("UnaryExpression", ["argument"]);
        keys.insert("UpdateExpression", ["argument"]);
        keys.insert("BinaryExpression", ["left", "right"]);
        keys.insert("AssignmentExpression", ["left", "right"]);
        keys.insert("LogicalExpression", ["left", "right"]);
        keys.insert("MemberExpression", ["object", "property"]);
        keys.insert("ConditionalExpression", ["test", "consequent", "alternate"]);
        keys.insert("CallExpression", ["callee", "arguments"]);
        keys.insert("NewExpression", ["callee", "arguments"]);
        keys.insert("SequenceExpression", ["expressions"]);
        keys.insert("TemplateLiteral", ["quasis", "expressions"]);
        keys.insert("TaggedTemplateExpression", ["tag", "quasi"]);
        keys.insert("TemplateElement", []);
        keys.insert("SpreadElement", ["argument"]);
        keys.insert("Identifier", []);
        keys.insert("PrivateIdentifier", []);
        keys.insert("Literal", []);
        keys.insert("Super", []);
        keys.insert("MetaProperty", ["meta", "property"]);
        keys.insert("ChainExpression", ["expression"]);
        keys.insert("ArrayPattern", ["elements"]);
        keys.insert("ObjectPattern", ["properties"]);
        keys.insert("RestElement", ["argument"]);
        keys.insert("AssignmentPattern", ["left", "right"]);
        keys.insert("ClassDeclaration", ["id", "superClass", "body"]);
        keys.insert("ClassExpression", ["id", "superClass", "body"]);
        keys.insert("ClassBody", ["body"]);
        keys.insert("MethodDefinition", ["key", "value"]);
        keys.insert("PropertyDefinition", ["key", "value"]);
        keys.insert("StaticBlock", ["body"]);
        keys.insert("ImportDeclaration", ["specifiers", "source"]);
        keys.insert("ImportSpecifier", ["imported", "local"]);
        keys.insert("ImportDefaultSpecifier", ["local"]);
        keys.insert("ImportNamespaceSpecifier", ["local"]);
        keys.insert("ImportExpression", ["source"]);
        keys.insert("ExportNamedDeclaration", ["declaration", "specifiers", "source"]);
        keys.insert("ExportDefaultDeclaration", ["declaration"]);
        keys.insert("ExportAllDeclaration", ["exported", "source"]);
        keys.insert("ExportSpecifier", ["local", "exported"]);
        keys
    }
}

pub fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "FunctionDeclaration" | "FunctionExpression" | "ArrowFunctionExpression"
    )
}
