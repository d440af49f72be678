//! Part 21 parser: builds a raw entity graph from tokens.
//!
//! Entities are kept uninterpreted: an ID plus one or more records, where a
//! record is a type name and its argument list. Simple instances
//! (`#1 = LINE(...)`) carry one record; complex instances
//! (`#2 = (LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI.,.METRE.))`) carry one
//! record per partial type.

use std::collections::HashMap;

use crate::error::{Result, StepError};
use crate::lexer::{Lexer, SpannedToken, Token};

/// A single argument value in a STEP record.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// Entity reference (`#123`).
    EntityRef(u64),
    /// String literal.
    String(String),
    /// Binary literal.
    Binary(String),
    /// Real number.
    Real(f64),
    /// Integer number.
    Integer(i64),
    /// Enumeration (`.T.`).
    Enum(String),
    /// Nested list.
    List(Vec<StepValue>),
    /// Derived value (`*`).
    Derived,
    /// Null value (`$`).
    Null,
    /// Inline typed value: `LENGTH_MEASURE(25.4)`.
    Typed {
        /// The type name.
        type_name: String,
        /// Arguments.
        args: Vec<StepValue>,
    },
}

impl StepValue {
    /// Entity reference, if this is one.
    pub fn as_entity_ref(&self) -> Option<u64> {
        match self {
            StepValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Real value; integers and single-argument typed measures are accepted.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            StepValue::Real(v) => Some(*v),
            StepValue::Integer(v) => Some(*v as f64),
            StepValue::Typed { args, .. } if args.len() == 1 => args[0].as_real(),
            _ => None,
        }
    }

    /// Integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StepValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// String value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Enumeration value.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            StepValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// List value.
    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this is `$`.
    pub fn is_null(&self) -> bool {
        matches!(self, StepValue::Null)
    }
}

/// One `TYPE_NAME(args)` record of an entity instance or header.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Type name, uppercased.
    pub name: String,
    /// Arguments.
    pub args: Vec<StepValue>,
}

/// A parsed entity instance from the DATA section.
#[derive(Debug, Clone)]
pub struct StepEntity {
    /// Entity ID (from `#123`).
    pub id: u64,
    /// Records; exactly one for simple instances.
    pub records: Vec<StepRecord>,
}

impl StepEntity {
    /// Whether this is a complex (multi-record) instance.
    pub fn is_complex(&self) -> bool {
        self.records.len() > 1
    }

    /// Type name of a simple instance, or `"COMPLEX"` for a complex one.
    pub fn type_name(&self) -> &str {
        match self.records.as_slice() {
            [single] => &single.name,
            _ => "COMPLEX",
        }
    }

    /// Find the record with the given type name.
    pub fn record(&self, name: &str) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Whether any record has the given type name.
    pub fn has_record(&self, name: &str) -> bool {
        self.record(name).is_some()
    }
}

/// The complete parsed content of a STEP file.
#[derive(Debug, Clone, Default)]
pub struct StepFile {
    /// Header section records (FILE_DESCRIPTION, FILE_NAME, FILE_SCHEMA).
    pub header: Vec<StepRecord>,
    /// Data section entities, indexed by ID.
    pub entities: HashMap<u64, StepEntity>,
}

impl StepFile {
    /// Get an entity by ID.
    pub fn get(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// Get an entity by ID, returning an error if not found.
    pub fn require(&self, id: u64) -> Result<&StepEntity> {
        self.entities.get(&id).ok_or(StepError::MissingEntity(id))
    }

    /// All entities having a record of the given type, sorted by ID.
    pub fn entities_of_type(&self, type_name: &str) -> Vec<&StepEntity> {
        let mut found: Vec<&StepEntity> = self
            .entities
            .values()
            .filter(|e| e.has_record(type_name))
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }

    /// Schema names from FILE_SCHEMA, e.g. `["AUTOMOTIVE_DESIGN"]`.
    pub fn schemas(&self) -> Vec<&str> {
        self.header
            .iter()
            .filter(|r| r.name == "FILE_SCHEMA")
            .filter_map(|r| r.args.first().and_then(StepValue::as_list))
            .flat_map(|list| list.iter().filter_map(StepValue::as_string))
            .collect()
    }
}

/// Parser for Part 21 STEP files.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
}

/// Deepest accepted nesting of parenthesised parameter lists.
const MAX_NESTING: usize = 256;

impl Parser {
    /// Parse a STEP file from bytes.
    pub fn parse(input: &[u8]) -> Result<StepFile> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        parser.parse_file()
    }

    fn parse_file(&mut self) -> Result<StepFile> {
        let mut file = StepFile::default();

        self.expect_keyword("ISO-10303-21")?;
        self.expect_token(&Token::Semicolon)?;

        loop {
            if self.check_keyword("HEADER") {
                self.advance();
                self.expect_token(&Token::Semicolon)?;
                file.header = self.parse_header_section()?;
                self.end_section()?;
            } else if self.check_keyword("DATA") {
                self.advance();
                // AP242 allows a parameter list after DATA.
                if self.check_token(&Token::LParen) {
                    self.parse_args()?;
                }
                self.expect_token(&Token::Semicolon)?;
                for entity in self.parse_data_section()? {
                    let id = entity.id;
                    if file.entities.insert(id, entity).is_some() {
                        return Err(StepError::parser(Some(id), "duplicate entity ID"));
                    }
                }
                self.end_section()?;
            } else if self.check_keyword("END-ISO-10303-21") {
                self.advance();
                self.expect_token(&Token::Semicolon)?;
                return Ok(file);
            } else {
                return Err(self.unexpected(None, "section keyword"));
            }
        }
    }

    fn end_section(&mut self) -> Result<()> {
        self.expect_keyword("ENDSEC")?;
        self.expect_token(&Token::Semicolon)
    }

    fn parse_header_section(&mut self) -> Result<Vec<StepRecord>> {
        let mut records = Vec::new();
        while let Some(Token::Keyword(name)) = self.peek_token() {
            if name == "ENDSEC" {
                break;
            }
            let name = name.clone();
            self.advance();
            let args = self.parse_args()?;
            self.expect_token(&Token::Semicolon)?;
            records.push(StepRecord { name, args });
        }
        Ok(records)
    }

    fn parse_data_section(&mut self) -> Result<Vec<StepEntity>> {
        let mut entities = Vec::new();
        while let Some(&Token::EntityRef(id)) = self.peek_token() {
            self.advance();
            self.expect_token(&Token::Equals)?;

            let records = match self.peek_token() {
                Some(Token::Keyword(_)) => vec![self.parse_record(id)?],
                Some(Token::LParen) => {
                    self.advance();
                    let mut records = Vec::new();
                    while !self.check_token(&Token::RParen) {
                        records.push(self.parse_record(id)?);
                    }
                    self.advance();
                    if records.is_empty() {
                        return Err(StepError::parser(Some(id), "empty complex entity"));
                    }
                    records
                }
                _ => return Err(self.unexpected(Some(id), "type name")),
            };

            self.expect_token(&Token::Semicolon)?;
            entities.push(StepEntity { id, records });
        }
        Ok(entities)
    }

    fn parse_record(&mut self, id: u64) -> Result<StepRecord> {
        match self.peek_token() {
            Some(Token::Keyword(name)) => {
                let name = name.clone();
                self.advance();
                let args = self.parse_args()?;
                Ok(StepRecord { name, args })
            }
            _ => Err(self.unexpected(Some(id), "type name")),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<StepValue>> {
        if self.depth >= MAX_NESTING {
            return Err(StepError::parser(None, format!("list nesting too deep (limit {MAX_NESTING})")));
        }
        self.depth += 1;
        let args = self.parse_arg_list();
        self.depth -= 1;
        args
    }

    fn parse_arg_list(&mut self) -> Result<Vec<StepValue>> {
        self.expect_token(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.check_token(&Token::RParen) {
            args.push(self.parse_value()?);
            while self.check_token(&Token::Comma) {
                self.advance();
                args.push(self.parse_value()?);
            }
        }
        self.expect_token(&Token::RParen)?;
        Ok(args)
    }

    fn parse_value(&mut self) -> Result<StepValue> {
        let value = match self.peek_token() {
            Some(Token::EntityRef(id)) => StepValue::EntityRef(*id),
            Some(Token::String(s)) => StepValue::String(s.clone()),
            Some(Token::Binary(s)) => StepValue::Binary(s.clone()),
            Some(Token::Real(v)) => StepValue::Real(*v),
            Some(Token::Integer(v)) => StepValue::Integer(*v),
            Some(Token::Enum(s)) => StepValue::Enum(s.clone()),
            Some(Token::Asterisk) => StepValue::Derived,
            Some(Token::Dollar) => StepValue::Null,
            Some(Token::LParen) => return self.parse_args().map(StepValue::List),
            Some(Token::Keyword(name)) => {
                let type_name = name.clone();
                self.advance();
                let args = self.parse_args()?;
                return Ok(StepValue::Typed { type_name, args });
            }
            _ => return Err(self.unexpected(None, "value")),
        };
        self.advance();
        Ok(value)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn check_token(&self, expected: &Token) -> bool {
        self.peek_token() == Some(expected)
    }

    fn check_keyword(&self, name: &str) -> bool {
        matches!(self.peek_token(), Some(Token::Keyword(k)) if k == name)
    }

    fn unexpected(&self, entity_id: Option<u64>, expected: &str) -> StepError {
        match self.tokens.get(self.pos) {
            Some(tok) => StepError::parser(
                entity_id,
                format!(
                    "expected {expected}, got {:?} at line {}, column {}",
                    tok.token, tok.pos.line, tok.pos.col
                ),
            ),
            None => StepError::parser(
                entity_id,
                format!("expected {expected}, got end of file"),
            ),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<()> {
        if self.check_token(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(None, &format!("{expected:?}")))
        }
    }

    fn expect_keyword(&mut self, name: &str) -> Result<()> {
        if self.check_keyword(name) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(None, &format!("keyword '{name}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let input = r#"
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((''), '2;1');
FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));
ENDSEC;
DATA;
#1 = CARTESIAN_POINT('origin', (0.0, 0.0, 0.0));
#2 = DIRECTION('x', (1.0, 0.0, 0.0));
ENDSEC;
END-ISO-10303-21;
"#;
        let file = Parser::parse(input.as_bytes()).unwrap();
        assert_eq!(file.header.len(), 2);
        assert_eq!(file.schemas(), vec!["AUTOMOTIVE_DESIGN"]);
        assert_eq!(file.entities.len(), 2);

        let p1 = file.get(1).unwrap();
        assert_eq!(p1.type_name(), "CARTESIAN_POINT");
        assert!(!p1.is_complex());
        let args = &p1.records[0].args;
        assert_eq!(args[0].as_string(), Some("origin"));
        assert_eq!(args[1].as_list().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_complex_entity() {
        let input = r#"ISO-10303-21;
HEADER;
ENDSEC;
DATA;
#7 = ( LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI.,.METRE.) );
#8 = ( CONVERSION_BASED_UNIT('INCH',#9) LENGTH_UNIT() NAMED_UNIT(#10) );
ENDSEC;
END-ISO-10303-21;
"#;
        let file = Parser::parse(input.as_bytes()).unwrap();
        let unit = file.get(7).unwrap();
        assert!(unit.is_complex());
        assert_eq!(unit.type_name(), "COMPLEX");
        let si = unit.record("SI_UNIT").unwrap();
        assert_eq!(si.args[0].as_enum(), Some("MILLI"));
        assert_eq!(si.args[1].as_enum(), Some("METRE"));
        assert!(unit.record("NAMED_UNIT").unwrap().args[0] == StepValue::Derived);

        assert_eq!(file.entities_of_type("LENGTH_UNIT").len(), 2);
    }

    #[test]
    fn test_parse_typed_measure() {
        let input = r#"ISO-10303-21;
HEADER;
ENDSEC;
DATA;
#9 = LENGTH_MEASURE_WITH_UNIT(LENGTH_MEASURE(25.4),#7);
ENDSEC;
END-ISO-10303-21;
"#;
        let file = Parser::parse(input.as_bytes()).unwrap();
        let e = file.get(9).unwrap();
        assert_eq!(e.records[0].args[0].as_real(), Some(25.4));
    }

    #[test]
    fn test_parse_null_and_derived() {
        let input = r#"ISO-10303-21;
HEADER;
ENDSEC;
DATA;
#1 = SOME_ENTITY($, *, 'value', 3);
ENDSEC;
END-ISO-10303-21;
"#;
        let file = Parser::parse(input.as_bytes()).unwrap();
        let args = &file.get(1).unwrap().records[0].args;
        assert!(args[0].is_null());
        assert_eq!(args[1], StepValue::Derived);
        assert_eq!(args[2].as_string(), Some("value"));
        assert_eq!(args[3].as_integer(), Some(3));
    }

    #[test]
    fn test_entities_of_type_sorted() {
        let input = r#"ISO-10303-21;
HEADER;
ENDSEC;
DATA;
#30 = CARTESIAN_POINT('', (0.0, 0.0, 0.0));
#2 = DIRECTION('', (1.0, 0.0, 0.0));
#4 = CARTESIAN_POINT('', (1.0, 0.0, 0.0));
ENDSEC;
END-ISO-10303-21;
"#;
        let file = Parser::parse(input.as_bytes()).unwrap();
        let ids: Vec<u64> = file
            .entities_of_type("CARTESIAN_POINT")
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![4, 30]);
    }

    #[test]
    fn test_missing_terminator_is_error() {
        let input = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1 = POINT(1.0)\nENDSEC;\n";
        assert!(matches!(
            Parser::parse(input.as_bytes()),
            Err(StepError::Parser { .. })
        ));
    }

    #[test]
    fn test_truncated_file_is_error() {
        let input = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1 = POINT(1.0);\n";
        assert!(Parser::parse(input.as_bytes()).is_err());
    }

    #[test]
    fn test_not_a_step_file() {
        assert!(Parser::parse(b"solid cube\nfacet normal 0 0 1\n").is_err());
    }

    fn nested(depth: usize) -> String {
        format!(
            "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1 = FOO({}1{});\nENDSEC;\nEND-ISO-10303-21;\n",
            "(".repeat(depth),
            ")".repeat(depth)
        )
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let err = Parser::parse(nested(200_000).as_bytes()).unwrap_err();
        assert!(err.to_string().contains("nesting too deep"), "{err}");
    }

    #[test]
    fn test_nesting_up_to_limit_is_accepted() {
        // The record's own parentheses count as one level.
        let file = Parser::parse(nested(MAX_NESTING - 1).as_bytes()).unwrap();
        assert_eq!(file.entities.len(), 1);
        assert!(Parser::parse(nested(MAX_NESTING).as_bytes()).is_err());
    }
}
