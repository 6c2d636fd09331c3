//! A fixture parser covering the JavaScript subset the engine tests
//! exercise. The real parser is an external collaborator; this one
//! exists so the tests can drive the whole pipeline from raw text.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{
    Ast, AstBuilder, Comment, CommentKind, NodeId, Position, SourceLocation, SourceRange, Token,
    TokenKind,
};
use crate::config::LanguageOptions;
use crate::scope::{Reference, Scope, ScopeId, ScopeKind, ScopeManager, Variable};
use crate::source_code::{ParseError, ParseResult, Parser};

const KEYWORDS: &[&str] = &[
    "var", "let", "const", "if", "else", "while", "do", "for", "return", "throw", "break",
    "continue", "function", "debugger", "switch", "case", "default", "try", "catch", "finally",
    "new", "typeof", "in", "of", "instanceof",
];

pub struct TestParser;

impl Parser for TestParser {
    fn parse(&self, text: &str, _options: &LanguageOptions) -> Result<ParseResult, ParseError> {
        parse_js(text)
    }
}

pub fn test_parser() -> Rc<dyn Parser> {
    Rc::new(TestParser)
}

pub fn parse_js(text: &str) -> Result<ParseResult, ParseError> {
    let (tokens, comments) = tokenize(text)?;
    let mut parser = JsParser {
        tokens: &tokens,
        position: 0,
        builder: AstBuilder::default(),
        text_len: text.len(),
        line_count: text.split('\n').count().max(1),
        last_line_len: text.rsplit('\n').next().unwrap_or("").len(),
    };
    let program = parser.parse_program()?;
    let builder = parser.builder;
    let ast = builder.finish(program);
    let scope_manager = build_scopes(&ast);
    Ok(ParseResult {
        ast,
        tokens,
        comments,
        visitor_keys: None,
        scope_manager: Some(scope_manager),
        services: Default::default(),
    })
}

// --- tokenizer ---

struct Scanner<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
    column: usize,
}

impl Scanner<'_> {
    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(byte)
    }
}

fn tokenize(text: &str) -> Result<(Vec<Token>, Vec<Comment>), ParseError> {
    let mut scanner = Scanner {
        bytes: text.as_bytes(),
        offset: 0,
        line: 1,
        column: 0,
    };
    let mut tokens = Vec::new();
    let mut comments = Vec::new();

    if text.starts_with("#!") {
        let start = scanner.position();
        let range_start = scanner.offset;
        while scanner.peek().is_some_and(|byte| byte != b'\n') {
            scanner.bump();
        }
        comments.push(Comment {
            kind: CommentKind::Shebang,
            value: text[range_start + 2..scanner.offset].to_owned(),
            range: SourceRange::new(range_start, scanner.offset),
            loc: SourceLocation::new(start, scanner.position()),
        });
    }

    while let Some(byte) = scanner.peek() {
        if byte.is_ascii_whitespace() {
            scanner.bump();
            continue;
        }
        let start = scanner.position();
        let range_start = scanner.offset;

        if byte == b'/' && scanner.peek_at(1) == Some(b'/') {
            while scanner.peek().is_some_and(|byte| byte != b'\n') {
                scanner.bump();
            }
            comments.push(Comment {
                kind: CommentKind::Line,
                value: text[range_start + 2..scanner.offset].to_owned(),
                range: SourceRange::new(range_start, scanner.offset),
                loc: SourceLocation::new(start, scanner.position()),
            });
            continue;
        }
        if byte == b'/' && scanner.peek_at(1) == Some(b'*') {
            scanner.bump();
            scanner.bump();
            loop {
                match (scanner.peek(), scanner.peek_at(1)) {
                    (Some(b'*'), Some(b'/')) => {
                        scanner.bump();
                        scanner.bump();
                        break;
                    }
                    (Some(_), _) => {
                        scanner.bump();
                    }
                    (None, _) => {
                        return Err(ParseError {
                            message: "Unterminated comment".to_owned(),
                            line: start.line,
                            column: start.column,
                        });
                    }
                }
            }
            comments.push(Comment {
                kind: CommentKind::Block,
                value: text[range_start + 2..scanner.offset - 2].to_owned(),
                range: SourceRange::new(range_start, scanner.offset),
                loc: SourceLocation::new(start, scanner.position()),
            });
            continue;
        }

        if byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' {
            while scanner
                .peek()
                .is_some_and(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$')
            {
                scanner.bump();
            }
            let value = &text[range_start..scanner.offset];
            let kind = match value {
                "true" | "false" => TokenKind::Boolean,
                "null" => TokenKind::Null,
                word if KEYWORDS.contains(&word) => TokenKind::Keyword,
                _ => TokenKind::Identifier,
            };
            tokens.push(Token {
                kind,
                value: value.to_owned(),
                range: SourceRange::new(range_start, scanner.offset),
                loc: SourceLocation::new(start, scanner.position()),
            });
            continue;
        }

        if byte.is_ascii_digit() {
            while scanner
                .peek()
                .is_some_and(|byte| byte.is_ascii_digit() || byte == b'.')
            {
                scanner.bump();
            }
            tokens.push(Token {
                kind: TokenKind::Numeric,
                value: text[range_start..scanner.offset].to_owned(),
                range: SourceRange::new(range_start, scanner.offset),
                loc: SourceLocation::new(start, scanner.position()),
            });
            continue;
        }

        if byte == b'"' || byte == b'\'' {
            let quote = byte;
            scanner.bump();
            while scanner.peek().is_some_and(|other| other != quote) {
                if scanner.peek() == Some(b'\\') {
                    scanner.bump();
                }
                scanner.bump();
            }
            if scanner.bump().is_none() {
                return Err(ParseError {
                    message: "Unterminated string".to_owned(),
                    line: start.line,
                    column: start.column,
                });
            }
            tokens.push(Token {
                kind: TokenKind::String,
                value: text[range_start..scanner.offset].to_owned(),
                range: SourceRange::new(range_start, scanner.offset),
                loc: SourceLocation::new(start, scanner.position()),
            });
            continue;
        }

        // Punctuators, longest first.
        let three: Option<&str> = text.get(range_start..range_start + 3);
        let two: Option<&str> = text.get(range_start..range_start + 2);
        let punctuator = match (three, two) {
            (Some(p @ ("===" | "!==")), _) => p,
            (_, Some(p @ ("==" | "!=" | "<=" | ">=" | "&&" | "||" | "+=" | "-=" | "=>"))) => p,
            _ => match byte {
                b'{' | b'}' | b'(' | b')' | b'[' | b']' | b';' | b',' | b'.' | b'<' | b'>'
                | b'+' | b'-' | b'*' | b'/' | b'%' | b'=' | b'!' | b'?' | b':' => {
                    &text[range_start..range_start + 1]
                }
                _ => {
                    return Err(ParseError {
                        message: format!("Unexpected character {:?}", byte as char),
                        line: start.line,
                        column: start.column,
                    });
                }
            },
        };
        for _ in 0..punctuator.len() {
            scanner.bump();
        }
        tokens.push(Token {
            kind: TokenKind::Punctuator,
            value: punctuator.to_owned(),
            range: SourceRange::new(range_start, scanner.offset),
            loc: SourceLocation::new(start, scanner.position()),
        });
    }

    Ok((tokens, comments))
}

// --- parser ---

struct JsParser<'a> {
    tokens: &'a [Token],
    position: usize,
    builder: AstBuilder,
    text_len: usize,
    line_count: usize,
    last_line_len: usize,
}

impl JsParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_value(&self) -> Option<&str> {
        self.peek().map(|token| &*token.value)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn at(&self, value: &str) -> bool {
        self.peek_value() == Some(value)
    }

    fn eat(&mut self, value: &str) -> bool {
        if self.at(value) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn end_of_input_error(&self) -> ParseError {
        ParseError {
            message: "Unexpected end of input".to_owned(),
            line: self.line_count,
            column: self.last_line_len,
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(token) => ParseError {
                message: format!("Unexpected token {:?}", token.value),
                line: token.loc.start.line,
                column: token.loc.start.column,
            },
            None => self.end_of_input_error(),
        }
    }

    fn expect(&mut self, value: &str) -> Result<Token, ParseError> {
        if self.at(value) {
            Ok(self.bump().unwrap().clone())
        } else {
            Err(self.unexpected())
        }
    }

    fn token_start(&self) -> (SourceRange, SourceLocation) {
        match self.peek() {
            Some(token) => (token.range, token.loc),
            None => (
                SourceRange::new(self.text_len, self.text_len),
                SourceLocation::default(),
            ),
        }
    }

    fn previous_token(&self) -> &Token {
        &self.tokens[self.position - 1]
    }

    fn finish_node(&mut self, node: NodeId, start: (SourceRange, SourceLocation)) -> NodeId {
        let end = self.previous_token();
        self.builder.set_range(
            node,
            SourceRange::new(start.0.start, end.range.end),
            SourceLocation::new(start.1.start, end.loc.end),
        );
        node
    }

    fn node(&mut self, kind: &str) -> NodeId {
        self.builder
            .add_node(kind, SourceRange::default(), SourceLocation::default())
    }

    fn parse_program(&mut self) -> Result<NodeId, ParseError> {
        let program = self.node("Program");
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.parse_statement()?);
        }
        self.builder.set_child_list(program, "body", body);
        let range = SourceRange::new(0, self.text_len);
        let end_loc = Position::new(self.line_count, self.last_line_len);
        self.builder.set_range(
            program,
            range,
            SourceLocation::new(Position::new(1, 0), end_loc),
        );
        Ok(program)
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        match self.peek_value() {
            None => Err(self.end_of_input_error()),
            Some("{") => self.parse_block(),
            Some("var" | "let" | "const") => self.parse_variable_declaration(),
            Some("if") => self.parse_if(),
            Some("while") => self.parse_while(),
            Some("do") => self.parse_do_while(),
            Some("function") => self.parse_function(),
            Some("return") => {
                self.bump();
                let node = self.node("ReturnStatement");
                if !self.at(";") && !self.at("}") && self.peek().is_some() {
                    let argument = self.parse_expression()?;
                    self.builder.set_child(node, "argument", argument);
                }
                self.eat(";");
                Ok(self.finish_node(node, start))
            }
            Some("throw") => {
                self.bump();
                let node = self.node("ThrowStatement");
                let argument = self.parse_expression()?;
                self.builder.set_child(node, "argument", argument);
                self.eat(";");
                Ok(self.finish_node(node, start))
            }
            Some(keyword @ ("break" | "continue")) => {
                let kind = if keyword == "break" {
                    "BreakStatement"
                } else {
                    "ContinueStatement"
                };
                self.bump();
                let node = self.node(kind);
                if self
                    .peek()
                    .is_some_and(|token| token.kind == TokenKind::Identifier)
                {
                    let label = self.parse_identifier()?;
                    self.builder.set_child(node, "label", label);
                }
                self.eat(";");
                Ok(self.finish_node(node, start))
            }
            Some("debugger") => {
                self.bump();
                let node = self.node("DebuggerStatement");
                self.eat(";");
                Ok(self.finish_node(node, start))
            }
            Some(";") => {
                self.bump();
                let node = self.node("EmptyStatement");
                Ok(self.finish_node(node, start))
            }
            Some(_) => {
                let node = self.node("ExpressionStatement");
                let expression = self.parse_expression()?;
                self.builder.set_child(node, "expression", expression);
                self.eat(";");
                Ok(self.finish_node(node, start))
            }
        }
    }

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        self.expect("{")?;
        let node = self.node("BlockStatement");
        let mut body = Vec::new();
        while !self.at("}") {
            if self.peek().is_none() {
                return Err(self.end_of_input_error());
            }
            body.push(self.parse_statement()?);
        }
        self.expect("}")?;
        self.builder.set_child_list(node, "body", body);
        Ok(self.finish_node(node, start))
    }

    fn parse_variable_declaration(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let kind = self.bump().unwrap().value.clone();
        let node = self.node("VariableDeclaration");
        self.builder.set_attribute(node, "kind", kind.as_str());
        let mut declarations = Vec::new();
        loop {
            let declarator_start = self.token_start();
            let declarator = self.node("VariableDeclarator");
            let id = self.parse_identifier()?;
            self.builder.set_child(declarator, "id", id);
            if self.eat("=") {
                let init = self.parse_assignment()?;
                self.builder.set_child(declarator, "init", init);
            }
            declarations.push(self.finish_node(declarator, declarator_start));
            if !self.eat(",") {
                break;
            }
        }
        self.builder.set_child_list(node, "declarations", declarations);
        self.eat(";");
        Ok(self.finish_node(node, start))
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        self.expect("if")?;
        let node = self.node("IfStatement");
        self.expect("(")?;
        let test = self.parse_expression()?;
        self.expect(")")?;
        self.builder.set_child(node, "test", test);
        let consequent = self.parse_statement()?;
        self.builder.set_child(node, "consequent", consequent);
        if self.eat("else") {
            let alternate = self.parse_statement()?;
            self.builder.set_child(node, "alternate", alternate);
        }
        Ok(self.finish_node(node, start))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        self.expect("while")?;
        let node = self.node("WhileStatement");
        self.expect("(")?;
        let test = self.parse_expression()?;
        self.expect(")")?;
        self.builder.set_child(node, "test", test);
        let body = self.parse_statement()?;
        self.builder.set_child(node, "body", body);
        Ok(self.finish_node(node, start))
    }

    fn parse_do_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        self.expect("do")?;
        let node = self.node("DoWhileStatement");
        let body = self.parse_statement()?;
        self.builder.set_child(node, "body", body);
        self.expect("while")?;
        self.expect("(")?;
        let test = self.parse_expression()?;
        self.expect(")")?;
        self.builder.set_child(node, "test", test);
        self.eat(";");
        Ok(self.finish_node(node, start))
    }

    fn parse_function(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        self.expect("function")?;
        let node = self.node("FunctionDeclaration");
        let id = self.parse_identifier()?;
        self.builder.set_child(node, "id", id);
        self.expect("(")?;
        let mut params = Vec::new();
        while !self.at(")") {
            params.push(self.parse_identifier()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        self.builder.set_child_list(node, "params", params);
        let body = self.parse_block()?;
        self.builder.set_child(node, "body", body);
        Ok(self.finish_node(node, start))
    }

    fn parse_identifier(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let token = self.bump().unwrap().clone();
                let node = self
                    .builder
                    .add_node("Identifier", token.range, token.loc);
                self.builder.set_attribute(node, "name", token.value.as_str());
                Ok(node)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let left = self.parse_logical_or()?;
        if self.at("=") || self.at("+=") || self.at("-=") {
            let operator = self.bump().unwrap().value.clone();
            let node = self.node("AssignmentExpression");
            self.builder.set_attribute(node, "operator", operator.as_str());
            self.builder.set_child(node, "left", left);
            let right = self.parse_assignment()?;
            self.builder.set_child(node, "right", right);
            return Ok(self.finish_node(node, start));
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut left = self.parse_logical_and()?;
        while self.at("||") {
            self.bump();
            let node = self.node("LogicalExpression");
            self.builder.set_attribute(node, "operator", "||");
            self.builder.set_child(node, "left", left);
            let right = self.parse_logical_and()?;
            self.builder.set_child(node, "right", right);
            left = self.finish_node(node, start);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut left = self.parse_equality()?;
        while self.at("&&") {
            self.bump();
            let node = self.node("LogicalExpression");
            self.builder.set_attribute(node, "operator", "&&");
            self.builder.set_child(node, "left", left);
            let right = self.parse_equality()?;
            self.builder.set_child(node, "right", right);
            left = self.finish_node(node, start);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut left = self.parse_relational()?;
        while matches!(self.peek_value(), Some("==" | "!=" | "===" | "!==")) {
            let operator = self.bump().unwrap().value.clone();
            let node = self.node("BinaryExpression");
            self.builder.set_attribute(node, "operator", operator.as_str());
            self.builder.set_child(node, "left", left);
            let right = self.parse_relational()?;
            self.builder.set_child(node, "right", right);
            left = self.finish_node(node, start);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut left = self.parse_additive()?;
        while matches!(self.peek_value(), Some("<" | ">" | "<=" | ">=")) {
            let operator = self.bump().unwrap().value.clone();
            let node = self.node("BinaryExpression");
            self.builder.set_attribute(node, "operator", operator.as_str());
            self.builder.set_child(node, "left", left);
            let right = self.parse_additive()?;
            self.builder.set_child(node, "right", right);
            left = self.finish_node(node, start);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut left = self.parse_multiplicative()?;
        while matches!(self.peek_value(), Some("+" | "-")) {
            let operator = self.bump().unwrap().value.clone();
            let node = self.node("BinaryExpression");
            self.builder.set_attribute(node, "operator", operator.as_str());
            self.builder.set_child(node, "left", left);
            let right = self.parse_multiplicative()?;
            self.builder.set_child(node, "right", right);
            left = self.finish_node(node, start);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut left = self.parse_unary()?;
        while matches!(self.peek_value(), Some("*" | "/" | "%")) {
            let operator = self.bump().unwrap().value.clone();
            let node = self.node("BinaryExpression");
            self.builder.set_attribute(node, "operator", operator.as_str());
            self.builder.set_child(node, "left", left);
            let right = self.parse_unary()?;
            self.builder.set_child(node, "right", right);
            left = self.finish_node(node, start);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        if matches!(self.peek_value(), Some("!" | "-" | "typeof")) {
            let operator = self.bump().unwrap().value.clone();
            let node = self.node("UnaryExpression");
            self.builder.set_attribute(node, "operator", operator.as_str());
            self.builder.set_attribute(node, "prefix", true);
            let argument = self.parse_unary()?;
            self.builder.set_child(node, "argument", argument);
            return Ok(self.finish_node(node, start));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.token_start();
        let mut expression = self.parse_primary()?;
        loop {
            if self.eat("(") {
                let node = self.node("CallExpression");
                self.builder.set_child(node, "callee", expression);
                let mut arguments = Vec::new();
                while !self.at(")") {
                    arguments.push(self.parse_assignment()?);
                    if !self.eat(",") {
                        break;
                    }
                }
                self.expect(")")?;
                self.builder.set_child_list(node, "arguments", arguments);
                expression = self.finish_node(node, start);
            } else if self.eat(".") {
                let node = self.node("MemberExpression");
                self.builder.set_child(node, "object", expression);
                let property = self.parse_identifier()?;
                self.builder.set_child(node, "property", property);
                self.builder.set_attribute(node, "computed", false);
                expression = self.finish_node(node, start);
            } else {
                return Ok(expression);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.end_of_input_error());
        };
        match token.kind {
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Numeric => {
                let token = self.bump().unwrap().clone();
                let node = self.builder.add_node("Literal", token.range, token.loc);
                let value: f64 = token.value.parse().unwrap_or_default();
                self.builder.set_attribute(node, "value", value);
                self.builder.set_attribute(node, "raw", token.value.as_str());
                Ok(node)
            }
            TokenKind::String => {
                let token = self.bump().unwrap().clone();
                let node = self.builder.add_node("Literal", token.range, token.loc);
                let inner = &token.value[1..token.value.len() - 1];
                self.builder.set_attribute(node, "value", inner);
                self.builder.set_attribute(node, "raw", token.value.as_str());
                Ok(node)
            }
            TokenKind::Boolean => {
                let token = self.bump().unwrap().clone();
                let node = self.builder.add_node("Literal", token.range, token.loc);
                self.builder
                    .set_attribute(node, "value", token.value == "true");
                self.builder.set_attribute(node, "raw", token.value.as_str());
                Ok(node)
            }
            TokenKind::Null => {
                let token = self.bump().unwrap().clone();
                let node = self.builder.add_node("Literal", token.range, token.loc);
                self.builder
                    .set_attribute(node, "value", serde_json::Value::Null);
                self.builder.set_attribute(node, "raw", "null");
                Ok(node)
            }
            TokenKind::Punctuator if token.value == "(" => {
                self.bump();
                let expression = self.parse_expression()?;
                self.expect(")")?;
                Ok(expression)
            }
            _ => Err(self.unexpected()),
        }
    }
}

// --- scope analysis ---

struct ScopeBuilder<'a> {
    ast: &'a Ast,
    scopes: Vec<Scope>,
    node_to_scope: HashMap<NodeId, ScopeId>,
}

fn build_scopes(ast: &Ast) -> ScopeManager {
    let mut builder = ScopeBuilder {
        ast,
        scopes: Vec::new(),
        node_to_scope: HashMap::new(),
    };
    let root = ast.root();
    builder.scopes.push(Scope {
        kind: ScopeKind::Global,
        node: root,
        parent: None,
        child_scopes: Vec::new(),
        variables: Vec::new(),
        references: Vec::new(),
        through: Vec::new(),
    });
    builder.node_to_scope.insert(root, ScopeId(0));
    builder.collect(root, ScopeId(0));
    builder.resolve();
    ScopeManager::new(builder.scopes, builder.node_to_scope)
}

impl ScopeBuilder<'_> {
    fn declare(&mut self, scope: ScopeId, name: &str, def_node: NodeId, identifier: NodeId) {
        let variables = &mut self.scopes[scope.0].variables;
        match variables.iter_mut().find(|variable| variable.name == name) {
            Some(variable) => {
                variable.def_nodes.push(def_node);
                variable.identifiers.push(identifier);
            }
            None => {
                let mut variable = Variable::new(name);
                variable.def_nodes.push(def_node);
                variable.identifiers.push(identifier);
                variables.push(variable);
            }
        }
    }

    fn collect(&mut self, node: NodeId, scope: ScopeId) {
        let data = self.ast.node(node);
        match data.kind() {
            "FunctionDeclaration" => {
                if let Some(id) = data.child("id") {
                    if let Some(name) = self.ast.node(id).string_attribute("name") {
                        let name = name.to_owned();
                        self.declare(scope, &name, node, id);
                    }
                }
                let function_scope = ScopeId(self.scopes.len());
                self.scopes.push(Scope {
                    kind: ScopeKind::Function,
                    node,
                    parent: Some(scope),
                    child_scopes: Vec::new(),
                    variables: Vec::new(),
                    references: Vec::new(),
                    through: Vec::new(),
                });
                self.scopes[scope.0].child_scopes.push(function_scope);
                self.node_to_scope.insert(node, function_scope);
                for &param in data.child_list("params") {
                    if let Some(name) = self.ast.node(param).string_attribute("name") {
                        let name = name.to_owned();
                        self.declare(function_scope, &name, node, param);
                    }
                }
                if let Some(body) = data.child("body") {
                    self.collect(body, function_scope);
                }
                return;
            }
            "VariableDeclarator" => {
                if let Some(id) = data.child("id") {
                    if let Some(name) = self.ast.node(id).string_attribute("name") {
                        let name = name.to_owned();
                        self.declare(scope, &name, node, id);
                    }
                }
                if let Some(init) = data.child("init") {
                    self.collect_references(init, scope);
                }
                return;
            }
            "Identifier" => {
                self.collect_references(node, scope);
                return;
            }
            _ => {}
        }
        let child_ids: Vec<NodeId> = data
            .child_entries()
            .flat_map(|(_, child)| match child {
                crate::ast::NodeChild::Single(id) => vec![*id],
                crate::ast::NodeChild::Many(ids) => ids.clone(),
            })
            .collect();
        for child in child_ids {
            self.collect(child, scope);
        }
    }

    fn collect_references(&mut self, node: NodeId, scope: ScopeId) {
        let data = self.ast.node(node);
        if data.kind() == "Identifier" {
            self.scopes[scope.0].references.push(Reference {
                identifier: node,
                resolved: None,
            });
            return;
        }
        // Member property names are not variable references.
        let skip_property = data.kind() == "MemberExpression";
        let child_ids: Vec<(String, Vec<NodeId>)> = data
            .child_entries()
            .map(|(key, child)| {
                let ids = match child {
                    crate::ast::NodeChild::Single(id) => vec![*id],
                    crate::ast::NodeChild::Many(ids) => ids.clone(),
                };
                (key.to_owned(), ids)
            })
            .collect();
        for (key, ids) in child_ids {
            if skip_property && key == "property" {
                continue;
            }
            for child in ids {
                self.collect_references(child, scope);
            }
        }
    }

    fn resolve(&mut self) {
        for scope_index in 0..self.scopes.len() {
            for reference_index in 0..self.scopes[scope_index].references.len() {
                let identifier = self.scopes[scope_index].references[reference_index].identifier;
                let Some(name) = self.ast.node(identifier).string_attribute("name") else {
                    continue;
                };
                let name = name.to_owned();
                let mut current = Some(ScopeId(scope_index));
                let mut resolved = None;
                while let Some(scope_id) = current {
                    if let Some(variable_index) = self.scopes[scope_id.0]
                        .variables
                        .iter()
                        .position(|variable| variable.name == name)
                    {
                        resolved = Some((scope_id, variable_index));
                        break;
                    }
                    current = self.scopes[scope_id.0].parent;
                }
                self.scopes[scope_index].references[reference_index].resolved = resolved;
                if resolved.is_none() {
                    self.scopes[scope_index].through.push(reference_index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_statement() {
        let (tokens, comments) = tokenize("var x = 1; // note\n").unwrap();
        let values: Vec<_> = tokens.iter().map(|token| &*token.value).collect();
        assert_eq!(values, ["var", "x", "=", "1", ";"]);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].value, " note");
    }

    #[test]
    fn test_parse_var_declaration_shape() {
        let result = parse_js("var x = 1;\n").unwrap();
        let ast = &result.ast;
        let program = ast.root();
        assert_eq!(ast.kind(program), "Program");
        let body = ast.node(program).child_list("body");
        assert_eq!(body.len(), 1);
        let declaration = body[0];
        assert_eq!(ast.kind(declaration), "VariableDeclaration");
        assert_eq!(ast.node(declaration).string_attribute("kind"), Some("var"));
        assert_eq!(ast.node(declaration).range(), SourceRange::new(0, 10));
        assert_eq!(ast.node(declaration).loc().end.column, 10);
    }

    #[test]
    fn test_parse_error_on_truncated_input() {
        let error = parse_js("var x =").unwrap_err();
        assert_eq!(error.line, 1);
        assert!(error.message.contains("Unexpected end of input"));
    }

    #[test]
    fn test_scopes_for_function() {
        let result = parse_js("var a = 1;\nfunction f(b) { var c = b; }\n").unwrap();
        let manager = result.scope_manager.unwrap();
        let global = manager.scope(manager.global_scope());
        assert!(global.variable("a").is_some());
        assert!(global.variable("f").is_some());
        let function_scope_id = global.child_scopes[0];
        let function_scope = manager.scope(function_scope_id);
        assert!(function_scope.variable("b").is_some());
        assert!(function_scope.variable("c").is_some());
        assert!(global.variable("b").is_none());
    }

    #[test]
    fn test_unresolved_references_flow_through() {
        let result = parse_js("f(x);\n").unwrap();
        let manager = result.scope_manager.unwrap();
        let global = manager.scope(manager.global_scope());
        assert_eq!(global.references.len(), 2);
        assert_eq!(global.through.len(), 2);
    }
}
