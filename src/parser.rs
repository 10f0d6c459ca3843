use std::io::BufRead;

use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{char, digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, opt, recognize, value, verify},
    sequence::{pair, tuple},
    IResult,
};

use crate::{
    ast::{Command::*, Segment::*, *},
    error::ParseError,
};

/// Largest magnitude an A-instruction immediate can carry.
const MAX_IMMEDIATE: i32 = 0x7fff;

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn signed_integer(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(char('-')), digit1)), |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    alt((
        value(Constant, tag("constant")),
        value(Local, tag("local")),
        value(Static, tag("static")),
        value(Argument, tag("argument")),
        value(This, tag("this")),
        value(That, tag("that")),
        value(Pointer, tag("pointer")),
        value(Temp, tag("temp")),
    ))(input)
}

fn index_in_range(segment: Segment, index: i32) -> bool {
    match segment {
        Constant => (-MAX_IMMEDIATE..=MAX_IMMEDIATE).contains(&index),
        Pointer => (0..=1).contains(&index),
        Temp => (0..=7).contains(&index),
        _ => (0..=MAX_IMMEDIATE).contains(&index),
    }
}

fn push(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("push"), space1, segment, space1, signed_integer)),
            |(_, _, segment, _, arg)| Push(segment, arg),
        ),
        |p: &Command| matches!(p, Push(seg, arg) if index_in_range(*seg, *arg)),
    )(input)
}

fn pop(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("pop"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Pop(segment, arg),
        ),
        |p: &Command| match p {
            Pop(Constant, _) => false,
            Pop(seg, arg) => index_in_range(*seg, i32::from(*arg)),
            _ => true,
        },
    )(input)
}

fn prim(input: &str) -> IResult<&str, Command> {
    map(
        alt((
            value(Operator::Add, tag("add")),
            value(Operator::Sub, tag("sub")),
            value(Operator::Neg, tag("neg")),
            value(Operator::Eq, tag("eq")),
            value(Operator::Gt, tag("gt")),
            value(Operator::Lt, tag("lt")),
            value(Operator::And, tag("and")),
            value(Operator::Or, tag("or")),
            value(Operator::Not, tag("not")),
        )),
        Arithmetic,
    )(input)
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        },
    )(input)
}

fn function(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("function"), tag("call"))),
            space1,
            symbol,
            space1,
            integer,
        )),
        |(op, _, name, _, n)| match op {
            "function" => Function(name, n),
            _ => Call(name, n),
        },
    )(input)
}

fn ret(input: &str) -> IResult<&str, Command> {
    value(Return, tag("return"))(input)
}

/// Strips the trailing `//` comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

/// Parses one source line that is known to hold a command.
pub fn parse_line(line: &str, number: usize) -> Result<Command, ParseError> {
    let text = strip_comment(line);

    match alt((push, pop, prim, branching, function, ret))(text) {
        Ok(("", command)) => Ok(command),
        Ok((remainder, _)) => Err(ParseError::TrailingInput {
            line: number,
            text: text.to_string(),
            rest: remainder.trim().to_string(),
        }),
        Err(_) => Err(ParseError::Invalid {
            line: number,
            text: text.to_string(),
        }),
    }
}

/// Streams commands out of a VM source, one line at a time.
///
/// Blank lines and comment-only lines are skipped. At most one raw line is
/// buffered between [`Parser::has_more_commands`] and [`Parser::advance`].
pub struct Parser<R> {
    reader: R,
    line: usize,
    pending: Option<(usize, String)>,
    current: Option<Command>,
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R) -> Self {
        Parser {
            reader,
            line: 0,
            pending: None,
            current: None,
        }
    }

    /// Reports whether another command remains. Repeated calls without an
    /// intervening `advance` do not consume input.
    pub fn has_more_commands(&mut self) -> Result<bool, ParseError> {
        if self.pending.is_some() {
            return Ok(true);
        }

        let mut buf = String::new();
        loop {
            buf.clear();
            let read = self
                .reader
                .read_line(&mut buf)
                .map_err(|source| ParseError::Read {
                    line: self.line,
                    source,
                })?;
            if read == 0 {
                return Ok(false);
            }
            self.line += 1;

            if !strip_comment(&buf).is_empty() {
                self.pending = Some((self.line, buf));
                return Ok(true);
            }
        }
    }

    /// Consumes the pending line and makes it the current command.
    pub fn advance(&mut self) -> Result<&Command, ParseError> {
        if !self.has_more_commands()? {
            return Err(ParseError::Exhausted { line: self.line });
        }
        let (number, text) = match self.pending.take() {
            Some(pending) => pending,
            None => return Err(ParseError::Exhausted { line: self.line }),
        };

        let command = parse_line(&text, number)?;
        Ok(self.current.insert(command))
    }

    /// The command produced by the last successful `advance`.
    pub fn command(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    /// Number of the last line read from the source.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Command, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_more_commands() {
            Ok(true) => Some(self.advance().cloned()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
