//! Recursive-descent text parser. States `{NAME, ASSIGN, VALUE}`
//! transition on character class; a parse failure is a sticky absorbing
//! state carrying `(line, column, message)`.

use crate::error::{Error, ParserInfo};
use crate::value::{Kind, Kvs};

const QUOTE_FORCING: &str = "\t ,;=(){}[]/";

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::Parse(ParserInfo {
            line: self.line,
            column: self.column,
            message: message.into(),
        })
    }

    fn expect(&mut self, c: char) -> Result<(), Error> {
        match self.advance() {
            Some(got) if got == c => Ok(()),
            Some(got) => Err(self.err(format!("expected '{c}', found '{got}'"))),
            None => Err(self.err(format!("expected '{c}', found end of input"))),
        }
    }
}

/// Parses `input` into a root [`Kvs`] node (always a [`Kind::Node`]).
pub fn parse(input: &str) -> Result<Kvs, Error> {
    let mut cur = Cursor::new(input);
    let children = parse_children(&mut cur, None)?;
    cur.skip_ws();
    if cur.peek().is_some() {
        return Err(cur.err("trailing content after root node"));
    }
    Ok(Kvs::unnamed(Kind::Node(children)))
}

fn parse_children(cur: &mut Cursor, terminator: Option<char>) -> Result<Vec<Kvs>, Error> {
    let mut children = Vec::new();
    loop {
        cur.skip_ws();
        match cur.peek() {
            None => break,
            Some(c) if Some(c) == terminator => break,
            _ => {}
        }
        let name = parse_name(cur)?;
        cur.skip_ws();
        cur.expect('=')?;
        cur.skip_ws();
        let value = parse_value(cur)?;
        children.push(Kvs::named(name, value));
    }
    Ok(children)
}

fn is_bareword_char(c: char) -> bool {
    !c.is_whitespace() && !QUOTE_FORCING.contains(c) && c != '"' && c != '`'
}

fn parse_name(cur: &mut Cursor) -> Result<String, Error> {
    match cur.peek() {
        Some('"') => parse_quoted(cur),
        Some(c) if c.is_ascii_digit() => Err(cur.err("name cannot begin with a digit")),
        Some(_) => parse_bareword(cur),
        None => Err(cur.err("expected name, found end of input")),
    }
}

fn parse_bareword(cur: &mut Cursor) -> Result<String, Error> {
    let mut s = String::new();
    while matches!(cur.peek(), Some(c) if is_bareword_char(c)) {
        s.push(cur.advance().unwrap());
    }
    if s.is_empty() {
        return Err(cur.err("expected a value"));
    }
    Ok(s)
}

fn parse_quoted(cur: &mut Cursor) -> Result<String, Error> {
    cur.expect('"')?;
    let mut s = String::new();
    loop {
        match cur.advance() {
            None => return Err(cur.err("unterminated quoted string")),
            Some('"') => break,
            Some('\\') => match cur.advance() {
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some(other) => s.push(other),
                None => return Err(cur.err("unterminated escape in quoted string")),
            },
            Some(c) => s.push(c),
        }
    }
    Ok(s)
}

fn parse_raw(cur: &mut Cursor) -> Result<String, Error> {
    for _ in 0..3 {
        cur.expect('`')?;
    }
    let mut s = String::new();
    loop {
        if cur.peek() == Some('`') && cur.peek_at(1) == Some('`') && cur.peek_at(2) == Some('`') {
            cur.advance();
            cur.advance();
            cur.advance();
            break;
        }
        match cur.advance() {
            None => return Err(cur.err("unterminated raw string")),
            Some(c) => s.push(c),
        }
    }
    Ok(s)
}

fn parse_value(cur: &mut Cursor) -> Result<Kind, Error> {
    match cur.peek() {
        Some('(') => parse_vector(cur),
        Some('[') => parse_array(cur),
        Some('{') => parse_obj(cur),
        Some('"') => parse_quoted(cur).map(Kind::String),
        Some('`') => parse_raw(cur).map(Kind::String),
        Some(_) => parse_bareword(cur).map(|s| classify(&s)),
        None => Err(cur.err("expected value, found end of input")),
    }
}

fn classify(s: &str) -> Kind {
    match s {
        "null" => Kind::Null,
        "true" => Kind::Bool(true),
        "false" => Kind::Bool(false),
        _ => {
            if let Ok(i) = s.parse::<i64>() {
                Kind::Int(i)
            } else if let Ok(f) = s.parse::<f64>() {
                Kind::Dec(f)
            } else {
                Kind::String(s.to_string())
            }
        }
    }
}

fn parse_vector(cur: &mut Cursor) -> Result<Kind, Error> {
    cur.expect('(')?;
    let mut components: Vec<f32> = Vec::new();
    loop {
        cur.skip_ws();
        if cur.peek() == Some(',') {
            cur.advance();
            continue;
        }
        if cur.peek() == Some(')') {
            break;
        }
        let mut s = String::new();
        while matches!(cur.peek(), Some(c) if c != ',' && c != ')' && !c.is_whitespace()) {
            s.push(cur.advance().unwrap());
        }
        let value: f32 = s
            .parse()
            .map_err(|_| cur.err(format!("'{s}' is not a number in vector literal")))?;
        components.push(value);
        if components.len() > 4 {
            return Err(cur.err("vector literal has more than 4 components"));
        }
    }
    cur.expect(')')?;
    match components.len() {
        1 => Ok(Kind::Vec1([components[0]])),
        2 => Ok(Kind::Vec2([components[0], components[1]])),
        3 => Ok(Kind::Vec3([components[0], components[1], components[2]])),
        4 => Ok(Kind::Vec4([
            components[0],
            components[1],
            components[2],
            components[3],
        ])),
        n => Err(cur.err(format!("vector literal must have 1-4 components, found {n}"))),
    }
}

fn parse_array(cur: &mut Cursor) -> Result<Kind, Error> {
    cur.expect('[')?;
    let mut items = Vec::new();
    loop {
        cur.skip_ws();
        if cur.peek() == Some(']') {
            break;
        }
        let value = parse_value(cur)?;
        items.push(Kvs::unnamed(value));
    }
    cur.expect(']')?;
    Ok(Kind::Array(items))
}

fn parse_obj(cur: &mut Cursor) -> Result<Kind, Error> {
    cur.expect('{')?;
    let children = parse_children(cur, Some('}'))?;
    cur.expect('}')?;
    Ok(Kind::Node(children))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        let root = parse("a = 1\nb = 2.5\nc = true\nd = null\ne = hello").unwrap();
        assert_eq!(root.get("a").unwrap().as_i64(), Some(1));
        assert_eq!(root.get("b").unwrap().as_f64(), Some(2.5));
        assert_eq!(root.get("c").unwrap().as_bool(), Some(true));
        assert_eq!(root.get("d").unwrap().kind(), &Kind::Null);
        assert_eq!(root.get("e").unwrap().as_str(), Some("hello"));
    }

    #[test]
    fn parses_nested_structure() {
        let root = parse(
            r#"
            shared_resources = [
                { name = depth kind = depth_stencil }
            ]
            camera = (0.0, 1.5, -3.0)
            "#,
        )
        .unwrap();
        let list = root.get("shared_resources").unwrap();
        let first = list.children().unwrap().first().unwrap();
        assert_eq!(first.get("name").unwrap().as_str(), Some("depth"));
        assert_eq!(root.get("camera").unwrap().kind(), &Kind::Vec3([0.0, 1.5, -3.0]));
    }

    #[test]
    fn quoted_name_and_raw_string() {
        let root = parse("\"my name\" = ```line one\nline two```").unwrap();
        assert_eq!(
            root.get("my name").unwrap().as_str(),
            Some("line one\nline two")
        );
    }

    #[test]
    fn unterminated_quote_reports_position() {
        let err = parse("a = \"oops").unwrap_err();
        match err {
            Error::Parse(info) => assert_eq!(info.line, 1),
            _ => panic!("expected a parse error"),
        }
    }
}
