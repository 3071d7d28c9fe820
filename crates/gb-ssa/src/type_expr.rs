//! Recursive-descent parser for canonical Go type spellings.
//!
//! Accepts what `go/types` prints: `*T`, `[N]T`, `[]T`, `map[K]V`, channel
//! types, `func(a int, b ...string) (int, error)`, `struct{X, Y int; io.Reader}`,
//! `interface{Read(p []byte) (n int, err error)}`, result tuples and
//! package-qualified names, including instantiated generics such as
//! `main.List[int]`. Parameter names are accepted and dropped.

use crate::error::{LoadError, LoadResult};
use crate::types::{BasicKind, ChanDir, Field, MethodSig, Type, TypeId, TypeTable};

const KEYWORDS: &[&str] = &["map", "chan", "func", "struct", "interface"];

pub fn parse_type(table: &mut TypeTable, text: &str) -> LoadResult<TypeId> {
    let mut parser = TypeParser {
        table,
        text,
        pos: 0,
    };
    let id = parser.ty()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(id)
}

enum ParamEntry {
    Named(TypeId, bool),
    Bare(TypeId, bool),
    Ident(String),
}

struct TypeParser<'t, 's> {
    table: &'t mut TypeTable,
    text: &'s str,
    pos: usize,
}

impl TypeParser<'_, '_> {
    fn error(&self, message: impl Into<String>) -> LoadError {
        LoadError::TypeSyntax {
            text: self.text.to_string(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> LoadResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{token}`")))
        }
    }

    fn is_name_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn is_name_char(ch: char) -> bool {
        ch.is_alphanumeric() || matches!(ch, '_' | '.' | '/' | '-')
    }

    /// Reads an identifier, possibly package-qualified (`path/to/pkg.Name`).
    fn name_token(&mut self) -> Option<String> {
        self.skip_ws();
        let rest = self.rest();
        let first = rest.chars().next()?;
        if !Self::is_name_start(first) {
            return None;
        }
        let end = rest
            .char_indices()
            .find(|(_, ch)| !Self::is_name_char(*ch))
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let token = rest[..end].to_string();
        self.pos += end;
        Some(token)
    }

    fn starts_type(&mut self) -> bool {
        self.skip_ws();
        let rest = self.rest();
        rest.starts_with("...")
            || rest.starts_with("<-")
            || matches!(rest.chars().next(), Some(ch) if Self::is_name_start(ch) || matches!(ch, '*' | '[' | '('))
    }

    fn ty(&mut self) -> LoadResult<TypeId> {
        self.skip_ws();
        if self.eat("*") {
            let elem = self.ty()?;
            return Ok(self.table.intern(Type::Pointer(elem)));
        }
        if self.eat("[]") {
            let elem = self.ty()?;
            return Ok(self.table.intern(Type::Slice(elem)));
        }
        if self.eat("[") {
            let len = self.array_len()?;
            self.expect("]")?;
            let elem = self.ty()?;
            return Ok(self.table.intern(Type::Array { len, elem }));
        }
        if self.eat("<-") {
            self.keyword("chan")?;
            let elem = self.ty()?;
            return Ok(self.table.intern(Type::Chan {
                dir: ChanDir::Recv,
                elem,
            }));
        }
        if self.peek() == Some('(') {
            let elems = self.tuple()?;
            return Ok(self.table.intern(Type::Tuple(elems)));
        }
        match self.name_token() {
            Some(token) => self.from_token(token),
            None => Err(self.error("expected a type")),
        }
    }

    fn keyword(&mut self, word: &str) -> LoadResult<()> {
        match self.name_token() {
            Some(token) if token == word => Ok(()),
            _ => Err(self.error(format!("expected `{word}`"))),
        }
    }

    fn array_len(&mut self) -> LoadResult<u64> {
        self.skip_ws();
        let digits: String = self.rest().chars().take_while(|ch| ch.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(self.error("expected an array length"));
        }
        self.pos += digits.len();
        digits
            .parse()
            .map_err(|_| self.error("array length out of range"))
    }

    /// Continues a type that began with the identifier `token`.
    fn from_token(&mut self, token: String) -> LoadResult<TypeId> {
        match token.as_str() {
            "map" => {
                self.expect("[")?;
                let key = self.ty()?;
                self.expect("]")?;
                let elem = self.ty()?;
                Ok(self.table.intern(Type::Map { key, elem }))
            }
            "chan" => {
                let dir = if self.eat("<-") {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.ty()?;
                Ok(self.table.intern(Type::Chan { dir, elem }))
            }
            "func" => self.signature(),
            "struct" => self.struct_body(),
            "interface" => self.interface_body(),
            "any" => Ok(self.table.any()),
            "untyped" => match self.name_token() {
                Some(rest) => self.resolve_name(&format!("untyped {rest}")),
                None => Err(self.error("expected an untyped kind")),
            },
            _ => {
                let name = if self.rest().starts_with('[') {
                    format!("{token}{}", self.type_args()?)
                } else {
                    token
                };
                self.resolve_name(&name)
            }
        }
    }

    /// Copies a balanced `[...]` instantiation suffix verbatim.
    fn type_args(&mut self) -> LoadResult<String> {
        let mut depth = 0usize;
        let mut end = None;
        for (index, ch) in self.rest().char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        end = Some(index);
                        break;
                    }
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| self.error("unbalanced type arguments"))?;
        let args = self.rest()[..=end].to_string();
        self.pos += end + 1;
        Ok(args)
    }

    fn resolve_name(&self, name: &str) -> LoadResult<TypeId> {
        if let Some(kind) = BasicKind::from_name(name) {
            return Ok(self.table.basic(kind));
        }
        match self.table.lookup(name) {
            Some(id)
                if matches!(
                    self.table.get(id),
                    Type::Named { .. } | Type::Alias { .. } | Type::TypeParam(_)
                ) =>
            {
                Ok(id)
            }
            _ => Err(LoadError::UnknownType {
                name: name.to_string(),
            }),
        }
    }

    fn tuple(&mut self) -> LoadResult<Vec<TypeId>> {
        let (elems, _) = self.params()?;
        Ok(elems)
    }

    fn signature(&mut self) -> LoadResult<TypeId> {
        let (params, variadic) = self.params()?;
        let results = self.results()?;
        Ok(self.table.intern(Type::Signature {
            params,
            results,
            variadic,
        }))
    }

    fn results(&mut self) -> LoadResult<Vec<TypeId>> {
        self.skip_ws();
        if self.peek() == Some('(') {
            return self.tuple();
        }
        if self.starts_type() && !self.rest().starts_with("...") {
            return Ok(vec![self.ty()?]);
        }
        Ok(vec![])
    }

    /// Parses `( ... )` as a parameter list, returning the parameter types
    /// and whether the last one is variadic.
    fn params(&mut self) -> LoadResult<(Vec<TypeId>, bool)> {
        self.expect("(")?;
        let mut entries = Vec::new();
        loop {
            if self.eat(")") {
                break;
            }
            entries.push(self.param_entry()?);
            if self.eat(",") {
                continue;
            }
            self.expect(")")?;
            break;
        }

        let named = entries
            .iter()
            .any(|entry| matches!(entry, ParamEntry::Named(..)));
        let mut types = Vec::with_capacity(entries.len());
        let mut variadic = false;
        if named {
            let mut pending: Option<(TypeId, bool)> = None;
            for entry in entries.iter().rev() {
                let (ty, is_variadic) = match entry {
                    ParamEntry::Named(ty, is_variadic) => (*ty, *is_variadic),
                    ParamEntry::Ident(_) => match pending {
                        Some(found) => found,
                        None => return Err(self.error("parameter name without a type")),
                    },
                    ParamEntry::Bare(..) => {
                        return Err(self.error("mixed named and unnamed parameters"))
                    }
                };
                pending = Some((ty, is_variadic));
                types.push((ty, is_variadic));
            }
            types.reverse();
        } else {
            for entry in &entries {
                let pair = match entry {
                    ParamEntry::Bare(ty, is_variadic) | ParamEntry::Named(ty, is_variadic) => {
                        (*ty, *is_variadic)
                    }
                    ParamEntry::Ident(name) => (self.resolve_name(name)?, false),
                };
                types.push(pair);
            }
        }

        let mut out = Vec::with_capacity(types.len());
        let last = types.len().saturating_sub(1);
        for (position, (ty, is_variadic)) in types.into_iter().enumerate() {
            if is_variadic {
                if position != last {
                    return Err(self.error("only the last parameter may be variadic"));
                }
                variadic = true;
                out.push(self.table.intern(Type::Slice(ty)));
            } else {
                out.push(ty);
            }
        }
        Ok((out, variadic))
    }

    fn param_entry(&mut self) -> LoadResult<ParamEntry> {
        if self.eat("...") {
            return Ok(ParamEntry::Bare(self.ty()?, true));
        }
        self.skip_ws();
        if !matches!(self.peek(), Some(ch) if Self::is_name_start(ch)) {
            return Ok(ParamEntry::Bare(self.ty()?, false));
        }
        let start = self.pos;
        let token = self.name_token().unwrap_or_default();
        if KEYWORDS.contains(&token.as_str()) || token.contains('.') || token == "untyped" {
            self.pos = start;
            return Ok(ParamEntry::Bare(self.ty()?, false));
        }
        self.skip_ws();
        if self.rest().starts_with('[') {
            // `List[int]` is an instantiated type, `xs []int` is a named slice.
            if !self.rest().starts_with("[]") && !self.rest()[1..].starts_with(|c: char| c.is_ascii_digit()) {
                self.pos = start;
                return Ok(ParamEntry::Bare(self.ty()?, false));
            }
        }
        if self.rest().starts_with(',') || self.rest().starts_with(')') {
            return Ok(ParamEntry::Ident(token));
        }
        if self.starts_type() {
            let is_variadic = self.eat("...");
            return Ok(ParamEntry::Named(self.ty()?, is_variadic));
        }
        Err(self.error("malformed parameter"))
    }

    fn struct_body(&mut self) -> LoadResult<TypeId> {
        self.expect("{")?;
        let mut fields = Vec::new();
        loop {
            if self.eat("}") {
                break;
            }
            if self.eat("*") {
                let elem = self.ty()?;
                let name = short_name(self.table.key(elem)).to_string();
                let ty = self.table.intern(Type::Pointer(elem));
                fields.push(Field {
                    name,
                    ty,
                    embedded: true,
                });
            } else {
                let token = self
                    .name_token()
                    .ok_or_else(|| self.error("expected a field"))?;
                self.skip_ws();
                if token.contains('.') || matches!(self.peek(), Some(';' | '}' | '"' | '`')) {
                    let ty = self.from_token(token.clone())?;
                    fields.push(Field {
                        name: short_name(&token).to_string(),
                        ty,
                        embedded: true,
                    });
                } else {
                    let mut names = vec![token];
                    while self.eat(",") {
                        names.push(
                            self.name_token()
                                .ok_or_else(|| self.error("expected a field name"))?,
                        );
                    }
                    let ty = self.ty()?;
                    fields.extend(names.into_iter().map(|name| Field {
                        name,
                        ty,
                        embedded: false,
                    }));
                }
            }
            self.skip_tag()?;
            self.eat(";");
        }
        Ok(self.table.intern(Type::Struct(fields)))
    }

    fn skip_tag(&mut self) -> LoadResult<()> {
        self.skip_ws();
        let Some(quote) = self.peek().filter(|ch| matches!(ch, '"' | '`')) else {
            return Ok(());
        };
        let mut escaped = false;
        let mut end = None;
        for (index, ch) in self.rest().char_indices().skip(1) {
            if quote == '"' && ch == '\\' && !escaped {
                escaped = true;
                continue;
            }
            if ch == quote && !escaped {
                end = Some(index);
                break;
            }
            escaped = false;
        }
        let end = end.ok_or_else(|| self.error("unterminated field tag"))?;
        self.pos += end + 1;
        Ok(())
    }

    fn interface_body(&mut self) -> LoadResult<TypeId> {
        self.expect("{")?;
        let mut methods = Vec::new();
        let mut embedded = Vec::new();
        loop {
            if self.eat("}") {
                break;
            }
            let token = self
                .name_token()
                .ok_or_else(|| self.error("expected a method or embedded interface"))?;
            self.skip_ws();
            if self.peek() == Some('(') && !token.contains('.') {
                let signature = self.signature()?;
                methods.push(MethodSig {
                    name: token,
                    signature,
                });
            } else {
                embedded.push(self.from_token(token)?);
            }
            self.eat(";");
        }
        Ok(self.table.intern(Type::Interface { methods, embedded }))
    }
}

fn short_name(qualified: &str) -> &str {
    let base = qualified.split('[').next().unwrap_or(qualified);
    base.rsplit('.').next().unwrap_or(base)
}
