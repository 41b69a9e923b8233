//! This module provides the parser for machine descriptions, utilizing the `pest` crate.
//! It defines the grammar of the line-oriented description format and functions to turn a
//! description into a validated [`Machine`].

use crate::{
    analyzer::analyze,
    types::{
        Machine, Move, Transition, TilerError, DEFAULT_INITIAL_STATE, DEFAULT_MACHINE_NAME,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the machine description grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// Parses a machine description, naming the machine [`DEFAULT_MACHINE_NAME`] unless the
/// description has a `NAME` directive.
///
/// # Arguments
///
/// * `input` - The machine description.
/// * `boundary_symbol` - The symbol wrapped around every tape; appended to the symbols.
///
/// # Returns
///
/// * `Ok(Machine)` if the input is successfully parsed and validated.
/// * `Err(TilerError::ParseError)` if there are any syntax errors.
/// * `Err(TilerError::ValidationError)` if the machine fails validation.
pub fn parse(input: &str, boundary_symbol: &str) -> Result<Machine, TilerError> {
    parse_named(input, DEFAULT_MACHINE_NAME, boundary_symbol)
}

/// Parses a machine description, using `default_name` when it has no `NAME` directive.
///
/// The parsed machine is validated with [`analyze`] before being returned.
pub fn parse_named(
    input: &str,
    default_name: &str,
    boundary_symbol: &str,
) -> Result<Machine, TilerError> {
    let root = MachineParser::parse(Rule::machine, input)
        .map_err(|e| TilerError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TilerError::ValidationError("Empty machine description".to_string()))?;

    let machine = parse_machine(root, default_name, boundary_symbol)?;

    analyze(&machine)?;

    Ok(machine)
}

/// Walks the directives of a `Pair<Rule::machine>` and assembles the machine.
///
/// Later `NAME`, `START` and `OFFSET` directives override earlier ones.
fn parse_machine(
    pair: Pair<Rule>,
    default_name: &str,
    boundary_symbol: &str,
) -> Result<Machine, TilerError> {
    let mut name = default_name.to_string();
    let mut symbols: Vec<String> = Vec::new();
    let mut transitions = Vec::new();
    let mut initial_state = DEFAULT_INITIAL_STATE.to_string();
    let mut initial_location = 0;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::name => name = parse_inner_string(p),
            Rule::symbol => {
                let symbol = parse_symbol(&parse_inner_string(p));
                if symbols.contains(&symbol) {
                    tracing::debug!("ignoring duplicate symbol {symbol:?}");
                } else {
                    symbols.push(symbol);
                }
            }
            Rule::start => initial_state = parse_inner_string(p),
            Rule::offset => initial_location = parse_offset(p)?,
            Rule::transition => transitions.push(parse_transition(p)?),
            Rule::unknown => {
                tracing::warn!("statement could not be parsed: {:?}", p.as_str().trim_end())
            }
            _ => {} // EOI
        }
    }

    symbols.push(boundary_symbol.to_string());

    Ok(Machine {
        name,
        symbols,
        transitions,
        initial_state,
        initial_location,
        boundary_symbol: boundary_symbol.to_string(),
    })
}

/// Parses a `Pair<Rule::transition>`: old state, read, write, move, new state and the
/// optional halting output.
fn parse_transition(pair: Pair<Rule>) -> Result<Transition, TilerError> {
    let mut pairs = pair.into_inner();
    let old_state = parse_string(&mut pairs)?;
    let read = parse_string(&mut pairs)?;
    let write = parse_string(&mut pairs)?;
    let movement = parse_move(next_pair(&mut pairs)?)?;
    let new_state = parse_string(&mut pairs)?;
    let output = pairs.next().map(|p| p.as_str().to_string());

    Ok(Transition {
        old_state,
        read,
        write,
        movement,
        new_state,
        output,
    })
}

/// Parses a move letter from a `Pair<Rule::direction>`, ignoring case.
fn parse_move(pair: Pair<Rule>) -> Result<Move, TilerError> {
    let span = pair.as_span();
    match pair.as_str().to_ascii_uppercase().as_str() {
        "L" => Ok(Move::Left),
        "R" => Ok(Move::Right),
        "H" => Ok(Move::Halt),
        other => Err(parse_error(&format!("Unsupported move: {other}"), span)),
    }
}

/// Parses the head offset of a `Pair<Rule::offset>`.
fn parse_offset(pair: Pair<Rule>) -> Result<usize, TilerError> {
    let index = pair
        .into_inner()
        .next()
        .ok_or_else(|| TilerError::ValidationError("OFFSET without a value".to_string()))?;
    let span = index.as_span();
    index
        .as_str()
        .parse::<usize>()
        .map_err(|e| parse_error(&format!("Invalid offset: {e}"), span))
}

/// A tape symbol is the first character of its token.
fn parse_symbol(input: &str) -> String {
    input.chars().take(1).collect()
}

/// Extracts the inner token of a directive `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts the string content of the next `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> Result<String, TilerError> {
    next_pair(pairs).map(|p| p.as_str().to_string())
}

fn next_pair<'a>(pairs: &mut Pairs<'a, Rule>) -> Result<Pair<'a, Rule>, TilerError> {
    pairs
        .next()
        .ok_or_else(|| TilerError::ValidationError("Truncated TRANSITION directive".to_string()))
}

/// Creates a `TilerError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TilerError {
    TilerError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}
